//! Display-ready transaction records, shaped after the explorer's GraphQL
//! schema. The serialized form carries the `__typename` discriminator and
//! camelCase field names so the presentation layer can switch on it
//! directly.

use crate::catalog::Token;
use serde::Serialize;

/// Fields shared by every normalized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxCommon {
    /// Composite id `"{blockNo}-{blockIndex}"`.
    pub id: String,
    #[serde(rename = "internalID")]
    pub internal_id: String,
    pub valid_until: u64,
    pub block: BlockRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRef {
    pub timestamp: i64,
}

/// Account reference; variants embed an id, an address, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl AccountRef {
    pub fn by_id(id: impl ToString) -> Self {
        AccountRef {
            address: None,
            id: Some(id.to_string()),
        }
    }

    pub fn by_address(address: Option<String>) -> Self {
        AccountRef { address, id: None }
    }

    pub fn new(id: impl ToString, address: Option<String>) -> Self {
        AccountRef {
            address,
            id: Some(id.to_string()),
        }
    }
}

/// Token embedded by value. A catalog miss leaves everything but the id
/// unset; the display layer shows a placeholder for those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl TokenRef {
    /// Id-only reference for tokens absent from the catalog.
    pub fn partial(id: impl ToString) -> Self {
        TokenRef {
            id: id.to_string(),
            decimals: None,
            symbol: None,
            name: None,
            address: None,
        }
    }

    pub fn resolved(token: &Token) -> Self {
        TokenRef {
            id: token.id.clone(),
            decimals: Some(token.decimals),
            symbol: Some(token.symbol.clone()),
            name: Some(token.name.clone()),
            address: Some(token.address.clone()),
        }
    }

    pub fn symbol_or_placeholder(&self) -> String {
        self.symbol.clone().unwrap_or_else(|| "--".to_string())
    }
}

/// Bare id reference (NFTs, receiver slots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolRef {
    pub symbol: String,
}

/// Trading pair reference used by Swap and OrderbookTrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    pub id: String,
    pub token0: SymbolRef,
    pub token1: SymbolRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataNft {
    #[serde(flatten)]
    pub common: TxCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintNft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    pub fee: String,
    pub fee_token: TokenRef,
    pub minter: AccountRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft: Option<EntityRef>,
    pub receiver: AccountRef,
    pub receiver_slot: EntityRef,
    #[serde(flatten)]
    pub common: TxCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmmUpdateTx {
    pub account: AccountRef,
    #[serde(flatten)]
    pub common: TxCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeNft {
    pub account_buyer: AccountRef,
    pub account_id_a: u64,
    pub account_id_b: u64,
    pub account_seller: AccountRef,
    pub fee_buyer: String,
    #[serde(rename = "realizedNFTPrice")]
    pub realized_nft_price: String,
    pub token: TokenRef,
    #[serde(flatten)]
    pub common: TxCommon,
}

/// Fill fields shared by Swap and OrderbookTrade. The pair is always
/// `(orderA.tokenS, orderA.tokenB)`; prices are 10^18-scaled cross prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFill {
    pub token_a: TokenRef,
    pub token_b: TokenRef,
    pub pair: Pair,
    pub token_a_price: String,
    pub token_b_price: String,
    pub fill_s_a: String,
    pub fill_s_b: String,
    pub fill_b_a: String,
    pub fill_b_b: String,
    pub fee_a: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapTx {
    pub account: AccountRef,
    pub pool: AccountRef,
    #[serde(flatten)]
    pub fill: TradeFill,
    #[serde(flatten)]
    pub common: TxCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderbookTradeTx {
    pub account_a: AccountRef,
    pub account_b: AccountRef,
    #[serde(flatten)]
    pub fill: TradeFill,
    #[serde(flatten)]
    pub common: TxCommon,
}

/// Shared by Transfer and TransferNFT; only the discriminator differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTx {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<AccountRef>,
    pub to_account: AccountRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(flatten)]
    pub common: TxCommon,
}

/// Shared by Withdrawal and WithdrawalNFT. The token payload lands in
/// `withdrawalToken` for plain withdrawals and `withdrawalNFTFeeToken` for
/// NFT ones, matching the explorer schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalTx {
    pub from_account: AccountRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawal_fee_token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawal_token: Option<TokenRef>,
    #[serde(rename = "withdrawalNFTFeeToken", skip_serializing_if = "Option::is_none")]
    pub withdrawal_nft_fee_token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(flatten)]
    pub common: TxCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositTx {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<AccountRef>,
    pub to_account: AccountRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(flatten)]
    pub common: TxCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateTx {
    pub user: AccountRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<TokenRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(flatten)]
    pub common: TxCommon,
}

/// One normalized transaction, discriminated by the GraphQL `__typename`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "__typename")]
pub enum NormalizedTransaction {
    #[serde(rename = "DataNFT")]
    DataNft(DataNft),
    #[serde(rename = "MintNFT")]
    MintNft(MintNft),
    AmmUpdate(AmmUpdateTx),
    #[serde(rename = "TradeNFT")]
    TradeNft(TradeNft),
    Swap(SwapTx),
    OrderbookTrade(OrderbookTradeTx),
    Transfer(TransferTx),
    #[serde(rename = "TransferNFT")]
    TransferNft(TransferTx),
    Withdrawal(WithdrawalTx),
    #[serde(rename = "WithdrawalNFT")]
    WithdrawalNft(WithdrawalTx),
    Deposit(DepositTx),
    AccountUpdate(AccountUpdateTx),
}

impl NormalizedTransaction {
    /// The serialized `__typename` discriminator.
    pub fn type_name(&self) -> &'static str {
        match self {
            NormalizedTransaction::DataNft(_) => "DataNFT",
            NormalizedTransaction::MintNft(_) => "MintNFT",
            NormalizedTransaction::AmmUpdate(_) => "AmmUpdate",
            NormalizedTransaction::TradeNft(_) => "TradeNFT",
            NormalizedTransaction::Swap(_) => "Swap",
            NormalizedTransaction::OrderbookTrade(_) => "OrderbookTrade",
            NormalizedTransaction::Transfer(_) => "Transfer",
            NormalizedTransaction::TransferNft(_) => "TransferNFT",
            NormalizedTransaction::Withdrawal(_) => "Withdrawal",
            NormalizedTransaction::WithdrawalNft(_) => "WithdrawalNFT",
            NormalizedTransaction::Deposit(_) => "Deposit",
            NormalizedTransaction::AccountUpdate(_) => "AccountUpdate",
        }
    }

    pub fn common(&self) -> &TxCommon {
        match self {
            NormalizedTransaction::DataNft(tx) => &tx.common,
            NormalizedTransaction::MintNft(tx) => &tx.common,
            NormalizedTransaction::AmmUpdate(tx) => &tx.common,
            NormalizedTransaction::TradeNft(tx) => &tx.common,
            NormalizedTransaction::Swap(tx) => &tx.common,
            NormalizedTransaction::OrderbookTrade(tx) => &tx.common,
            NormalizedTransaction::Transfer(tx) => &tx.common,
            NormalizedTransaction::TransferNft(tx) => &tx.common,
            NormalizedTransaction::Withdrawal(tx) => &tx.common,
            NormalizedTransaction::WithdrawalNft(tx) => &tx.common,
            NormalizedTransaction::Deposit(tx) => &tx.common,
            NormalizedTransaction::AccountUpdate(tx) => &tx.common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common() -> TxCommon {
        TxCommon {
            id: "100-3".to_string(),
            internal_id: "--".to_string(),
            valid_until: 1_900_000_000,
            block: BlockRef {
                timestamp: 1_700_000_000,
            },
        }
    }

    #[test]
    fn serializes_graphql_discriminator_and_field_names() {
        let tx = NormalizedTransaction::TransferNft(TransferTx {
            from_account: Some(AccountRef::by_id(7u64)),
            to_account: AccountRef::by_id(8u64),
            fee_token: Some(TokenRef::partial(0u32)),
            token: Some(TokenRef::partial(1u32)),
            to_token: None,
            amount: Some("5000".to_string()),
            fee: Some("10".to_string()),
            common: common(),
        });

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["__typename"], "TransferNFT");
        assert_eq!(json["internalID"], "--");
        assert_eq!(json["fromAccount"]["id"], "7");
        assert_eq!(json["feeToken"]["id"], "0");
        assert_eq!(json["block"]["timestamp"], 1_700_000_000);
        // absent optionals are omitted, not null
        assert!(json.get("toToken").is_none());
    }

    #[test]
    fn partial_token_serializes_id_only() {
        let json = serde_json::to_value(TokenRef::partial(42u32)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "42" }));
    }
}
