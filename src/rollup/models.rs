//! Raw per-block transaction records as served by `block/getBlock`.
//!
//! Every record is tagged by `txType`. The tag dispatches into one variant
//! struct per type so that each variant's required and optional fields are
//! explicit; tags outside the known set parse into [`RawTxKind::Other`]
//! instead of failing the whole batch.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Fields present on every raw transaction regardless of type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommon {
    pub block_no: u64,
    pub block_index: u32,
    #[serde(default)]
    pub valid_until: u64,
    /// Unix-second timestamp of the containing block.
    #[serde(default)]
    pub timestamp: i64,
}

/// One raw transaction: shared header plus the type-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub common: RawCommon,
    pub kind: RawTxKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawTxKind {
    NftData,
    NftMint(NftMint),
    AmmUpdate(AmmUpdate),
    SpotTrade(SpotTrade),
    Transfer(Transfer),
    Withdraw(Withdraw),
    Deposit(Deposit),
    AccountUpdate(AccountUpdate),
    /// Tag outside the known set. Kept so the record stays addressable and
    /// the unknown-variant policy can decide what happens to it.
    Other { tx_type: String },
}

impl RawTxKind {
    pub fn tx_type(&self) -> &str {
        match self {
            RawTxKind::NftData => "NftData",
            RawTxKind::NftMint(_) => "NftMint",
            RawTxKind::AmmUpdate(_) => "AmmUpdate",
            RawTxKind::SpotTrade(_) => "SpotTrade",
            RawTxKind::Transfer(_) => "Transfer",
            RawTxKind::Withdraw(_) => "Withdraw",
            RawTxKind::Deposit(_) => "Deposit",
            RawTxKind::AccountUpdate(_) => "AccountUpdate",
            RawTxKind::Other { tx_type } => tx_type,
        }
    }
}

/// A token payload: id plus whatever amount/NFT fields the variant carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    #[serde(default)]
    pub token_id: u32,
    #[serde(default)]
    pub amount: Option<String>,
    /// Present only when the payload is an NFT.
    #[serde(default)]
    pub nft_data: Option<String>,
    #[serde(default)]
    pub nft_id: Option<String>,
}

/// Fee payload: the fee token id and the charged amount.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub token_id: u32,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMint {
    pub minter_account_id: u64,
    pub to_account_id: u64,
    #[serde(default)]
    pub to_account_address: Option<String>,
    pub nft_token: TokenPayload,
    pub to_token: TokenPayload,
    pub fee: Fee,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmUpdate {
    pub account_id: u64,
    pub owner: String,
}

/// A matched order pair. Classification into Swap / OrderbookTrade /
/// TradeNFT happens at normalization time from the two legs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpotTrade {
    #[serde(rename = "orderA")]
    pub order_a: Order,
    #[serde(rename = "orderB")]
    pub order_b: Order,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "accountID")]
    pub account_id: u64,
    #[serde(rename = "tokenS")]
    pub token_s: u32,
    #[serde(rename = "tokenB")]
    pub token_b: u32,
    #[serde(rename = "amountS")]
    pub amount_s: String,
    #[serde(rename = "amountB")]
    pub amount_b: String,
    #[serde(default)]
    pub fee_bips: u32,
    #[serde(default)]
    pub valid_until: u64,
    #[serde(default)]
    pub nft_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    #[serde(default)]
    pub account_id: Option<u64>,
    pub to_account_id: u64,
    #[serde(default)]
    pub token: Option<TokenPayload>,
    #[serde(default)]
    pub to_token: Option<TokenPayload>,
    #[serde(default)]
    pub fee: Option<Fee>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdraw {
    pub account_id: u64,
    #[serde(default)]
    pub to_address: Option<String>,
    pub token: TokenPayload,
    #[serde(default)]
    pub fee: Option<Fee>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    #[serde(default)]
    pub account_id: Option<u64>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub token: Option<TokenPayload>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub account_id: u64,
    #[serde(default)]
    pub fee: Option<Fee>,
}

impl<'de> Deserialize<'de> for RawTransaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let tx_type = value
            .get("txType")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field("txType"))?
            .to_owned();

        let common = RawCommon::deserialize(&value).map_err(de::Error::custom)?;

        let kind = match tx_type.as_str() {
            "NftData" => RawTxKind::NftData,
            "NftMint" => RawTxKind::NftMint(payload(&value)?),
            "AmmUpdate" => RawTxKind::AmmUpdate(payload(&value)?),
            "SpotTrade" => RawTxKind::SpotTrade(payload(&value)?),
            "Transfer" => RawTxKind::Transfer(payload(&value)?),
            "Withdraw" => RawTxKind::Withdraw(payload(&value)?),
            "Deposit" => RawTxKind::Deposit(payload(&value)?),
            "AccountUpdate" => RawTxKind::AccountUpdate(payload(&value)?),
            _ => RawTxKind::Other { tx_type },
        };

        Ok(RawTransaction { common, kind })
    }
}

fn payload<T, E>(value: &Value) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: de::Error,
{
    T::deserialize(value).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_tx_type() {
        let raw: RawTransaction = serde_json::from_value(serde_json::json!({
            "txType": "Transfer",
            "blockNo": 100, "blockIndex": 3, "validUntil": 1_900_000_000u64, "timestamp": 1_700_000_000i64,
            "accountId": 77, "toAccountId": 88,
            "token": { "tokenId": 1, "amount": "5000" },
            "fee": { "tokenId": 0, "amount": "10" }
        }))
        .unwrap();

        assert_eq!(raw.common.block_no, 100);
        assert_eq!(raw.common.block_index, 3);
        match raw.kind {
            RawTxKind::Transfer(transfer) => {
                assert_eq!(transfer.account_id, Some(77));
                assert_eq!(transfer.token.unwrap().amount.as_deref(), Some("5000"));
            }
            other => panic!("expected Transfer, got {:?}", other),
        }
    }

    #[test]
    fn unrecognized_tag_parses_to_other() {
        let raw: RawTransaction = serde_json::from_value(serde_json::json!({
            "txType": "SomethingNew",
            "blockNo": 5, "blockIndex": 0
        }))
        .unwrap();

        assert_eq!(
            raw.kind,
            RawTxKind::Other {
                tx_type: "SomethingNew".to_string()
            }
        );
        assert_eq!(raw.kind.tx_type(), "SomethingNew");
    }

    #[test]
    fn missing_tag_is_an_error() {
        let result: Result<RawTransaction, _> =
            serde_json::from_value(serde_json::json!({ "blockNo": 5, "blockIndex": 0 }));
        assert!(result.is_err());
    }

    #[test]
    fn spot_trade_orders_use_chain_field_names() {
        let raw: RawTransaction = serde_json::from_value(serde_json::json!({
            "txType": "SpotTrade",
            "blockNo": 9, "blockIndex": 1,
            "orderA": {
                "accountID": 11, "tokenS": 1, "tokenB": 2,
                "amountS": "1000", "amountB": "2000", "feeBips": 30,
                "validUntil": 1_800_000_000u64
            },
            "orderB": {
                "accountID": 12, "tokenS": 2, "tokenB": 1,
                "amountS": "2000", "amountB": "1000", "feeBips": 0
            }
        }))
        .unwrap();

        match raw.kind {
            RawTxKind::SpotTrade(trade) => {
                assert_eq!(trade.order_a.account_id, 11);
                assert_eq!(trade.order_a.token_s, 1);
                assert_eq!(trade.order_a.fee_bips, 30);
                assert_eq!(trade.order_b.amount_s, "2000");
            }
            other => panic!("expected SpotTrade, got {:?}", other),
        }
    }
}
