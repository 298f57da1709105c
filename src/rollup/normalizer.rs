//! Batch normalization of raw block transactions into the explorer's
//! uniform record shape.
//!
//! The mapping is a pure, synchronous pass over the batch: token lookups go
//! against the catalog the caller fetched up front, and output positions
//! line up with input positions so the caller can correlate the two.

use crate::catalog::TokenCatalog;
use crate::error::AppError;
use crate::metrics;
use crate::num;
use crate::rollup::models::{self as raw, RawTransaction, RawTxKind};
use crate::rollup::normalized::{
    AccountRef, AccountUpdateTx, AmmUpdateTx, BlockRef, DataNft, DepositTx, EntityRef, MintNft,
    NormalizedTransaction, OrderbookTradeTx, Pair, SwapTx, SymbolRef, TokenRef, TradeFill,
    TradeNft, TransferTx, TxCommon, WithdrawalTx,
};
use alloy_primitives::U256;
use tracing::warn;

/// What to do with a record whose `txType` is outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTxPolicy {
    /// Leave the record's output position empty, like the legacy explorer.
    #[default]
    Skip,
    /// Fail the whole batch with [`AppError::UnknownTxType`].
    Reject,
}

/// Spot trades whose counter-party account id falls below this bound are
/// AMM pool swaps; pool accounts occupy the low id range by construction.
const AMM_ACCOUNT_ID_BOUND: u64 = 10_000;

/// Normalize a batch of raw transactions against a token catalog.
///
/// The output is positionally aligned with the input; a position holds None
/// when its record was skipped under [`UnknownTxPolicy::Skip`]. Per-record
/// token lookup misses degrade to partial tokens and never fail the batch.
pub fn normalize_transactions(
    txs: &[RawTransaction],
    catalog: &TokenCatalog,
    policy: UnknownTxPolicy,
) -> Result<Vec<Option<NormalizedTransaction>>, AppError> {
    txs.iter()
        .enumerate()
        .map(|(index, tx)| normalize_transaction(tx, catalog, index, policy))
        .collect()
}

/// Normalize a single record. `index` is the record's batch position, used
/// only for error reporting under the reject policy.
pub fn normalize_transaction(
    tx: &RawTransaction,
    catalog: &TokenCatalog,
    index: usize,
    policy: UnknownTxPolicy,
) -> Result<Option<NormalizedTransaction>, AppError> {
    let common = tx_common(tx);

    let record = match &tx.kind {
        RawTxKind::NftData => NormalizedTransaction::DataNft(DataNft { common }),
        RawTxKind::NftMint(mint) => normalize_nft_mint(mint, catalog, common),
        RawTxKind::AmmUpdate(update) => NormalizedTransaction::AmmUpdate(AmmUpdateTx {
            account: AccountRef::new(update.account_id, Some(update.owner.clone())),
            common,
        }),
        RawTxKind::SpotTrade(trade) => normalize_spot_trade(trade, catalog, common),
        RawTxKind::Transfer(transfer) => normalize_transfer(transfer, catalog, common),
        RawTxKind::Withdraw(withdraw) => normalize_withdraw(withdraw, catalog, common),
        RawTxKind::Deposit(deposit) => normalize_deposit(deposit, catalog, common),
        RawTxKind::AccountUpdate(update) => {
            NormalizedTransaction::AccountUpdate(AccountUpdateTx {
                user: AccountRef::by_id(update.account_id),
                fee_token: update.fee.as_ref().map(|fee| resolve_token(catalog, fee.token_id)),
                fee: update.fee.as_ref().map(|fee| fee.amount.clone()),
                common,
            })
        }
        RawTxKind::Other { tx_type } => {
            metrics::TRANSACTIONS_SKIPPED.inc();
            match policy {
                UnknownTxPolicy::Skip => {
                    warn!(
                        tx_type = %tx_type,
                        id = %common.id,
                        "Skipping transaction with unrecognized txType"
                    );
                    return Ok(None);
                }
                UnknownTxPolicy::Reject => {
                    return Err(AppError::UnknownTxType {
                        tx_type: tx_type.clone(),
                        index,
                    })
                }
            }
        }
    };

    metrics::TRANSACTIONS_NORMALIZED.inc();
    Ok(Some(record))
}

fn tx_common(tx: &RawTransaction) -> TxCommon {
    TxCommon {
        id: format!("{}-{}", tx.common.block_no, tx.common.block_index),
        internal_id: "--".to_string(),
        valid_until: tx.common.valid_until,
        block: BlockRef {
            timestamp: tx.common.timestamp,
        },
    }
}

/// Catalog lookup by stringified numeric id. A miss yields an id-only token
/// rather than an error; the display layer tolerates those.
fn resolve_token(catalog: &TokenCatalog, token_id: u32) -> TokenRef {
    let id = token_id.to_string();
    match catalog.get(&id) {
        Some(token) => TokenRef::resolved(token),
        None => {
            metrics::TOKEN_LOOKUP_MISSES.inc();
            warn!(token_id = %id, "Token id missing from catalog, emitting partial token");
            TokenRef::partial(id)
        }
    }
}

fn normalize_nft_mint(
    mint: &raw::NftMint,
    catalog: &TokenCatalog,
    common: TxCommon,
) -> NormalizedTransaction {
    NormalizedTransaction::MintNft(MintNft {
        amount: mint.nft_token.amount.clone(),
        fee: mint.fee.amount.clone(),
        fee_token: resolve_token(catalog, mint.fee.token_id),
        minter: AccountRef::by_id(mint.minter_account_id),
        nft: mint.nft_token.nft_id.clone().map(|id| EntityRef { id }),
        receiver: AccountRef::new(mint.to_account_id, mint.to_account_address.clone()),
        receiver_slot: EntityRef {
            id: format!("{}-{}", mint.to_account_id, mint.to_token.token_id),
        },
        common,
    })
}

fn normalize_spot_trade(
    trade: &raw::SpotTrade,
    catalog: &TokenCatalog,
    mut common: TxCommon,
) -> NormalizedTransaction {
    let order_a = &trade.order_a;
    let order_b = &trade.order_b;

    // The maker order's deadline is the one shown for the trade.
    common.valid_until = order_a.valid_until;

    let amount_s = num::parse_amount(&order_a.amount_s);
    let amount_b = num::parse_amount(&order_a.amount_b);

    if order_a.nft_data.is_some() {
        let fee_buyer = amount_s
            .and_then(|v| num::bps_fee(v, order_a.fee_bips + order_b.fee_bips))
            .map(|v| v.to_string())
            .unwrap_or_else(|| fallback_amount(&common.id, "feeBuyer"));

        return NormalizedTransaction::TradeNft(TradeNft {
            account_buyer: AccountRef::by_id(order_a.account_id),
            account_id_a: order_a.account_id,
            account_id_b: order_b.account_id,
            account_seller: AccountRef::by_id(order_b.account_id),
            fee_buyer,
            realized_nft_price: order_a.amount_s.clone(),
            token: resolve_token(catalog, order_a.token_s),
            common,
        });
    }

    let token_a = resolve_token(catalog, order_a.token_s);
    let token_b = resolve_token(catalog, order_a.token_b);

    let pair = Pair {
        id: format!("{}-{}", order_a.token_s, order_a.token_b),
        token0: SymbolRef {
            symbol: token_a.symbol_or_placeholder(),
        },
        token1: SymbolRef {
            symbol: token_b.symbol_or_placeholder(),
        },
    };

    let token_a_price = price_or_fallback(amount_b, amount_s, &common.id, "tokenAPrice");
    let token_b_price = price_or_fallback(amount_s, amount_b, &common.id, "tokenBPrice");
    let fee_a = amount_b
        .and_then(|v| num::bps_fee(v, order_a.fee_bips))
        .map(|v| v.to_string())
        .unwrap_or_else(|| fallback_amount(&common.id, "feeA"));

    let fill = TradeFill {
        token_a,
        token_b,
        pair,
        token_a_price,
        token_b_price,
        fill_s_a: order_a.amount_s.clone(),
        fill_s_b: order_a.amount_b.clone(),
        fill_b_a: order_a.amount_b.clone(),
        fill_b_b: order_a.amount_s.clone(),
        fee_a,
    };

    if order_b.account_id < AMM_ACCOUNT_ID_BOUND {
        NormalizedTransaction::Swap(SwapTx {
            account: AccountRef::by_id(order_a.account_id),
            pool: AccountRef::by_id(order_b.account_id),
            fill,
            common,
        })
    } else {
        NormalizedTransaction::OrderbookTrade(OrderbookTradeTx {
            account_a: AccountRef::by_id(order_a.account_id),
            account_b: AccountRef::by_id(order_b.account_id),
            fill,
            common,
        })
    }
}

/// floor(amount * 10^18 / base) as a decimal string, degrading to "0" when
/// an amount is malformed or the base is zero.
fn price_or_fallback(
    amount: Option<U256>,
    base: Option<U256>,
    tx_id: &str,
    field: &str,
) -> String {
    amount
        .zip(base)
        .and_then(|(amount, base)| num::cross_price(amount, base))
        .map(|price| price.to_string())
        .unwrap_or_else(|| fallback_amount(tx_id, field))
}

fn fallback_amount(tx_id: &str, field: &str) -> String {
    warn!(id = %tx_id, field = %field, "Unusable amounts in trade, defaulting field to 0");
    "0".to_string()
}

fn normalize_transfer(
    transfer: &raw::Transfer,
    catalog: &TokenCatalog,
    common: TxCommon,
) -> NormalizedTransaction {
    let is_nft = transfer
        .token
        .as_ref()
        .is_some_and(|token| token.nft_data.is_some());

    let fields = TransferTx {
        from_account: transfer.account_id.map(AccountRef::by_id),
        to_account: AccountRef::by_id(transfer.to_account_id),
        fee_token: transfer
            .fee
            .as_ref()
            .map(|fee| resolve_token(catalog, fee.token_id)),
        token: transfer
            .token
            .as_ref()
            .map(|token| resolve_token(catalog, token.token_id)),
        to_token: transfer
            .to_token
            .as_ref()
            .map(|token| resolve_token(catalog, token.token_id)),
        amount: transfer.token.as_ref().and_then(|token| token.amount.clone()),
        fee: transfer.fee.as_ref().map(|fee| fee.amount.clone()),
        common,
    };

    if is_nft {
        NormalizedTransaction::TransferNft(fields)
    } else {
        NormalizedTransaction::Transfer(fields)
    }
}

fn normalize_withdraw(
    withdraw: &raw::Withdraw,
    catalog: &TokenCatalog,
    common: TxCommon,
) -> NormalizedTransaction {
    let is_nft = withdraw.token.nft_data.is_some();
    let token = resolve_token(catalog, withdraw.token.token_id);

    let fields = WithdrawalTx {
        from_account: AccountRef::by_id(withdraw.account_id),
        to_address: withdraw.to_address.clone(),
        withdrawal_fee_token: withdraw
            .fee
            .as_ref()
            .map(|fee| resolve_token(catalog, fee.token_id)),
        withdrawal_token: (!is_nft).then(|| token.clone()),
        withdrawal_nft_fee_token: is_nft.then_some(token),
        amount: withdraw.token.amount.clone(),
        fee: withdraw.fee.as_ref().map(|fee| fee.amount.clone()),
        common,
    };

    if is_nft {
        NormalizedTransaction::WithdrawalNft(fields)
    } else {
        NormalizedTransaction::Withdrawal(fields)
    }
}

fn normalize_deposit(
    deposit: &raw::Deposit,
    catalog: &TokenCatalog,
    common: TxCommon,
) -> NormalizedTransaction {
    NormalizedTransaction::Deposit(DepositTx {
        from_account: deposit
            .account_id
            .map(|_| AccountRef::by_address(deposit.from_address.clone())),
        to_account: AccountRef {
            address: deposit.to_address.clone(),
            id: deposit.account_id.map(|id| id.to_string()),
        },
        token: deposit
            .token
            .as_ref()
            .map(|token| resolve_token(catalog, token.token_id)),
        amount: deposit.token.as_ref().and_then(|token| token.amount.clone()),
        common,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Token;
    use serde_json::json;

    fn catalog() -> TokenCatalog {
        TokenCatalog::from_tokens([
            Token {
                id: "0".to_string(),
                decimals: 18,
                symbol: "ETH".to_string(),
                name: "Ethereum".to_string(),
                address: "0x0000000000000000000000000000000000000000".to_string(),
            },
            Token {
                id: "1".to_string(),
                decimals: 18,
                symbol: "LRC".to_string(),
                name: "Loopring".to_string(),
                address: "0xbbbbca6a901c926f240b89eacb641d8aec7aeafd".to_string(),
            },
            Token {
                id: "2".to_string(),
                decimals: 6,
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            },
        ])
    }

    fn parse(tx: serde_json::Value) -> RawTransaction {
        serde_json::from_value(tx).unwrap()
    }

    fn spot_trade(account_b: u64, nft_data: Option<&str>) -> RawTransaction {
        let mut order_a = json!({
            "accountID": 20021, "tokenS": 1, "tokenB": 2,
            "amountS": "1000", "amountB": "2000",
            "feeBips": 30, "validUntil": 1_800_000_000u64
        });
        if let Some(nft) = nft_data {
            order_a["nftData"] = json!(nft);
        }
        parse(json!({
            "txType": "SpotTrade",
            "blockNo": 100, "blockIndex": 4,
            "validUntil": 1_900_000_000u64, "timestamp": 1_700_000_000i64,
            "orderA": order_a,
            "orderB": {
                "accountID": account_b, "tokenS": 2, "tokenB": 1,
                "amountS": "2000", "amountB": "1000", "feeBips": 20
            }
        }))
    }

    fn normalize_one(tx: &RawTransaction) -> NormalizedTransaction {
        normalize_transaction(tx, &catalog(), 0, UnknownTxPolicy::Skip)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn composite_id_joins_block_and_index() {
        let tx = parse(json!({
            "txType": "NftData",
            "blockNo": 100, "blockIndex": 7,
            "validUntil": 1_900_000_000u64, "timestamp": 1_700_000_000i64
        }));
        let normalized = normalize_one(&tx);
        assert_eq!(normalized.type_name(), "DataNFT");
        assert_eq!(normalized.common().id, "100-7");
        assert_eq!(normalized.common().internal_id, "--");
        assert_eq!(normalized.common().block.timestamp, 1_700_000_000);
    }

    #[test]
    fn spot_trade_below_pool_bound_is_swap() {
        let normalized = normalize_one(&spot_trade(9_999, None));
        match normalized {
            NormalizedTransaction::Swap(swap) => {
                assert_eq!(swap.account.id.as_deref(), Some("20021"));
                assert_eq!(swap.pool.id.as_deref(), Some("9999"));
            }
            other => panic!("expected Swap, got {}", other.type_name()),
        }
    }

    #[test]
    fn spot_trade_at_pool_bound_is_orderbook_trade() {
        let normalized = normalize_one(&spot_trade(10_000, None));
        match normalized {
            NormalizedTransaction::OrderbookTrade(trade) => {
                assert_eq!(trade.account_a.id.as_deref(), Some("20021"));
                assert_eq!(trade.account_b.id.as_deref(), Some("10000"));
            }
            other => panic!("expected OrderbookTrade, got {}", other.type_name()),
        }
    }

    #[test]
    fn nft_order_leg_forces_trade_nft() {
        // NFT data on orderA wins over the account id classification.
        let normalized = normalize_one(&spot_trade(9_999, Some("0xnft")));
        match normalized {
            NormalizedTransaction::TradeNft(trade) => {
                assert_eq!(trade.realized_nft_price, "1000");
                assert_eq!(trade.account_id_a, 20021);
                assert_eq!(trade.account_id_b, 9999);
                // floor(1000 * (30 + 20) / 10000) = 5
                assert_eq!(trade.fee_buyer, "5");
                assert_eq!(trade.token.symbol.as_deref(), Some("LRC"));
            }
            other => panic!("expected TradeNFT, got {}", other.type_name()),
        }
    }

    #[test]
    fn trade_prices_use_floor_division() {
        let normalized = normalize_one(&spot_trade(10_000, None));
        let fill = match normalized {
            NormalizedTransaction::OrderbookTrade(trade) => trade.fill,
            other => panic!("expected OrderbookTrade, got {}", other.type_name()),
        };

        // tokenAPrice = floor(2000 * 10^18 / 1000), tokenBPrice = floor(1000 * 10^18 / 2000)
        assert_eq!(fill.token_a_price, "2000000000000000000");
        assert_eq!(fill.token_b_price, "500000000000000000");
        assert_eq!(fill.fill_s_a, "1000");
        assert_eq!(fill.fill_s_b, "2000");
        assert_eq!(fill.fill_b_a, "2000");
        assert_eq!(fill.fill_b_b, "1000");
        // feeA = floor(2000 * 30 / 10000) = 6
        assert_eq!(fill.fee_a, "6");
        assert_eq!(fill.pair.id, "1-2");
        assert_eq!(fill.pair.token0.symbol, "LRC");
        assert_eq!(fill.pair.token1.symbol, "USDC");
    }

    #[test]
    fn trade_deadline_comes_from_maker_order() {
        let normalized = normalize_one(&spot_trade(10_000, None));
        assert_eq!(normalized.common().valid_until, 1_800_000_000);
    }

    #[test]
    fn token_lookup_miss_degrades_to_partial_token() {
        let tx = parse(json!({
            "txType": "Transfer",
            "blockNo": 100, "blockIndex": 1,
            "validUntil": 0u64, "timestamp": 1_700_000_000i64,
            "accountId": 7, "toAccountId": 8,
            "token": { "tokenId": 999, "amount": "5000" },
            "fee": { "tokenId": 0, "amount": "10" }
        }));
        let normalized = normalize_one(&tx);
        match normalized {
            NormalizedTransaction::Transfer(transfer) => {
                let token = transfer.token.unwrap();
                assert_eq!(token.id, "999");
                assert_eq!(token.symbol, None);
                assert_eq!(token.decimals, None);
                // the resolvable fee token still resolves fully
                assert_eq!(transfer.fee_token.unwrap().symbol.as_deref(), Some("ETH"));
            }
            other => panic!("expected Transfer, got {}", other.type_name()),
        }
    }

    #[test]
    fn nft_payload_flips_transfer_discriminator() {
        let tx = parse(json!({
            "txType": "Transfer",
            "blockNo": 100, "blockIndex": 2,
            "validUntil": 0u64, "timestamp": 1_700_000_000i64,
            "accountId": 7, "toAccountId": 8,
            "token": { "tokenId": 1, "amount": "1", "nftData": "0xnft" }
        }));
        let normalized = normalize_one(&tx);
        assert_eq!(normalized.type_name(), "TransferNFT");
    }

    #[test]
    fn withdraw_routes_token_by_nft_presence() {
        let plain = parse(json!({
            "txType": "Withdraw",
            "blockNo": 100, "blockIndex": 5,
            "validUntil": 0u64, "timestamp": 1_700_000_000i64,
            "accountId": 7, "toAddress": "0xdest",
            "token": { "tokenId": 1, "amount": "400" },
            "fee": { "tokenId": 0, "amount": "2" }
        }));
        match normalize_one(&plain) {
            NormalizedTransaction::Withdrawal(w) => {
                assert_eq!(w.to_address.as_deref(), Some("0xdest"));
                assert!(w.withdrawal_token.is_some());
                assert!(w.withdrawal_nft_fee_token.is_none());
            }
            other => panic!("expected Withdrawal, got {}", other.type_name()),
        }

        let nft = parse(json!({
            "txType": "Withdraw",
            "blockNo": 100, "blockIndex": 6,
            "validUntil": 0u64, "timestamp": 1_700_000_000i64,
            "accountId": 7, "toAddress": "0xdest",
            "token": { "tokenId": 1, "amount": "1", "nftData": "0xnft" }
        }));
        match normalize_one(&nft) {
            NormalizedTransaction::WithdrawalNft(w) => {
                assert!(w.withdrawal_token.is_none());
                assert!(w.withdrawal_nft_fee_token.is_some());
            }
            other => panic!("expected WithdrawalNFT, got {}", other.type_name()),
        }
    }

    #[test]
    fn mint_builds_receiver_slot_from_account_and_token() {
        let tx = parse(json!({
            "txType": "NftMint",
            "blockNo": 100, "blockIndex": 8,
            "validUntil": 0u64, "timestamp": 1_700_000_000i64,
            "minterAccountId": 11, "toAccountId": 22, "toAccountAddress": "0xreceiver",
            "nftToken": { "tokenId": 0, "amount": "1", "nftId": "0xabc" },
            "toToken": { "tokenId": 5 },
            "fee": { "tokenId": 0, "amount": "3" }
        }));
        match normalize_one(&tx) {
            NormalizedTransaction::MintNft(mint) => {
                assert_eq!(mint.receiver_slot.id, "22-5");
                assert_eq!(mint.minter.id.as_deref(), Some("11"));
                assert_eq!(mint.receiver.address.as_deref(), Some("0xreceiver"));
                assert_eq!(mint.nft.unwrap().id, "0xabc");
                assert_eq!(mint.fee, "3");
            }
            other => panic!("expected MintNFT, got {}", other.type_name()),
        }
    }

    #[test]
    fn unknown_tx_type_skips_position_without_disturbing_siblings() {
        let txs = vec![
            parse(json!({
                "txType": "Deposit",
                "blockNo": 100, "blockIndex": 0,
                "validUntil": 0u64, "timestamp": 1_700_000_000i64,
                "accountId": 7, "toAddress": "0xto", "fromAddress": "0xfrom",
                "token": { "tokenId": 0, "amount": "900" }
            })),
            parse(json!({
                "txType": "Unknown",
                "blockNo": 100, "blockIndex": 1
            })),
            parse(json!({
                "txType": "AccountUpdate",
                "blockNo": 100, "blockIndex": 2,
                "validUntil": 0u64, "timestamp": 1_700_000_000i64,
                "accountId": 7,
                "fee": { "tokenId": 0, "amount": "1" }
            })),
        ];

        let normalized =
            normalize_transactions(&txs, &catalog(), UnknownTxPolicy::Skip).unwrap();
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].as_ref().map(|tx| tx.type_name()), Some("Deposit"));
        assert!(normalized[1].is_none());
        assert_eq!(
            normalized[2].as_ref().map(|tx| tx.type_name()),
            Some("AccountUpdate")
        );
    }

    #[test]
    fn unknown_tx_type_rejects_under_strict_policy() {
        let txs = vec![parse(json!({
            "txType": "Unknown",
            "blockNo": 100, "blockIndex": 1
        }))];

        let err = normalize_transactions(&txs, &catalog(), UnknownTxPolicy::Reject).unwrap_err();
        match err {
            AppError::UnknownTxType { tx_type, index } => {
                assert_eq!(tx_type, "Unknown");
                assert_eq!(index, 0);
            }
            other => panic!("expected UnknownTxType, got {}", other),
        }
    }

    #[test]
    fn normalizing_twice_yields_equal_output() {
        let txs = vec![
            spot_trade(9_999, None),
            spot_trade(10_000, None),
            spot_trade(10_000, Some("0xnft")),
        ];
        let catalog = catalog();
        let first = normalize_transactions(&txs, &catalog, UnknownTxPolicy::Skip).unwrap();
        let second = normalize_transactions(&txs, &catalog, UnknownTxPolicy::Skip).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn deposit_embeds_origin_and_destination() {
        let tx = parse(json!({
            "txType": "Deposit",
            "blockNo": 100, "blockIndex": 0,
            "validUntil": 0u64, "timestamp": 1_700_000_000i64,
            "accountId": 7, "toAddress": "0xto", "fromAddress": "0xfrom",
            "token": { "tokenId": 2, "amount": "900" }
        }));
        match normalize_one(&tx) {
            NormalizedTransaction::Deposit(deposit) => {
                let from = deposit.from_account.unwrap();
                assert_eq!(from.address.as_deref(), Some("0xfrom"));
                assert_eq!(from.id, None);
                assert_eq!(deposit.to_account.id.as_deref(), Some("7"));
                assert_eq!(deposit.to_account.address.as_deref(), Some("0xto"));
                assert_eq!(deposit.token.unwrap().symbol.as_deref(), Some("USDC"));
                assert_eq!(deposit.amount.as_deref(), Some("900"));
            }
            other => panic!("expected Deposit, got {}", other.type_name()),
        }
    }
}
