//! Single-transaction detail conversion.
//!
//! The block explorer's transaction page decodes one transaction out of the
//! rollup calldata (the decoding itself is an external collaborator) and
//! needs it in the detail-view shape: account owner addresses resolved, AMM
//! pool membership attached, prices scaled by token decimals. Unlike the
//! batch normalizer, a token id missing from the catalog is a hard error
//! here; the detail page has nothing sensible to render without metadata.

use crate::api::models::AmmPool;
use crate::api::ApiClient;
use crate::catalog::{Token, TokenCatalog};
use crate::error::AppError;
use crate::num;
use crate::rollup::normalized::{AccountRef, EntityRef};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One transaction decoded from rollup calldata, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum DecodedTransaction {
    #[serde(rename = "TRANSFER")]
    Transfer(DecodedTransfer),
    #[serde(rename = "WITHDRAWAL")]
    Withdrawal(DecodedWithdrawal),
    #[serde(rename = "SWAP")]
    Swap(DecodedSwap),
    #[serde(rename = "TRADE")]
    Trade(DecodedTrade),
    #[serde(rename = "DEPOSIT")]
    Deposit(DecodedDeposit),
    #[serde(rename = "ACCOUNT_UPDATE")]
    AccountUpdate(DecodedAccountUpdate),
    #[serde(rename = "AMM_JOIN")]
    AmmJoin(DecodedAmmJoin),
    #[serde(rename = "AMM_EXIT")]
    AmmExit(DecodedAmmExit),
    #[serde(rename = "AMM_UPDATE")]
    AmmUpdate(DecodedAmmUpdate),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransfer {
    #[serde(rename = "accountFromID")]
    pub account_from_id: u64,
    #[serde(rename = "accountToID")]
    pub account_to_id: u64,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "feeTokenID")]
    pub fee_token_id: u32,
    pub amount: String,
    pub fee: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedWithdrawal {
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "feeTokenID")]
    pub fee_token_id: u32,
    pub amount: String,
    pub fee: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSwap {
    pub account_id_a: u64,
    /// Sold/bought token ids of the taker leg.
    #[serde(rename = "tokenAS")]
    pub token_a_s: u32,
    #[serde(rename = "tokenBS")]
    pub token_b_s: u32,
    /// Bought token ids of both legs; the pool is matched on these.
    #[serde(rename = "tokenAB")]
    pub token_a_b: u32,
    #[serde(rename = "tokenBB")]
    pub token_b_b: u32,
    #[serde(rename = "fillSA")]
    pub fill_s_a: String,
    #[serde(rename = "fillSB")]
    pub fill_s_b: String,
    pub fee_a: String,
    pub fee_b: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTrade {
    pub account_id_a: u64,
    pub account_id_b: u64,
    #[serde(rename = "tokenAS")]
    pub token_a_s: u32,
    #[serde(rename = "tokenBS")]
    pub token_b_s: u32,
    #[serde(rename = "fillSA")]
    pub fill_s_a: String,
    #[serde(rename = "fillSB")]
    pub fill_s_b: String,
    pub fee_a: String,
    pub fee_b: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedDeposit {
    #[serde(rename = "toAccountID")]
    pub to_account_id: u64,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    pub amount: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAccountUpdate {
    #[serde(rename = "accountID")]
    pub account_id: u64,
    pub owner: String,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(rename = "feeTokenID")]
    pub fee_token_id: u32,
    pub fee: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAmmJoin {
    #[serde(rename = "accountID")]
    pub account_id: u64,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "toTokenID")]
    pub to_token_id: u32,
    #[serde(rename = "feeTokenID")]
    pub fee_token_id: u32,
    pub amount: String,
    pub fee: String,
    /// Joining account address and pool address, straight from calldata.
    pub from: String,
    pub to: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAmmExit {
    #[serde(rename = "accountFromID")]
    pub account_from_id: u64,
    #[serde(rename = "accountToID")]
    pub account_to_id: u64,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "feeTokenID")]
    pub fee_token_id: u32,
    pub amount: String,
    pub fee: String,
    pub from: String,
    pub to: String,
    pub tx_data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAmmUpdate {
    pub tx_data: String,
}

/// Token metadata embedded in detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub decimals: u8,
    pub symbol: String,
}

impl From<&Token> for TokenInfo {
    fn from(token: &Token) -> Self {
        TokenInfo {
            decimals: token.decimals,
            symbol: token.symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub address: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    pub from_account: AccountRef,
    pub to_account: AccountRef,
    pub amount: String,
    pub fee: String,
    pub token: TokenInfo,
    pub fee_token: TokenInfo,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDetail {
    pub amount: String,
    pub fee: String,
    pub withdrawal_token: TokenInfo,
    pub withdrawal_fee_token: TokenInfo,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapDetail {
    pub account: AccountRef,
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
    pub fill_s_a: String,
    pub fill_s_b: String,
    pub token_a_price: String,
    pub token_b_price: String,
    pub pair: EntityRef,
    pub fee_a: String,
    pub fee_b: String,
    pub pool: AccountRef,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDetail {
    pub account_a: AccountRef,
    pub account_b: AccountRef,
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
    pub fill_s_a: String,
    pub fill_s_b: String,
    pub token_a_price: String,
    pub token_b_price: String,
    pub fee_a: String,
    pub fee_b: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDetail {
    pub to_account: AccountRef,
    pub token: TokenInfo,
    pub amount: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateDetail {
    pub user: UserRef,
    pub fee_token: TokenInfo,
    pub fee: String,
    pub data: String,
}

/// Shared by AMM joins (Add) and exits (Remove).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmFlowDetail {
    pub account: AccountRef,
    pub token: TokenInfo,
    pub pool: AccountRef,
    pub amount: String,
    pub fee_token: TokenInfo,
    pub fee: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmUpdateDetail {
    pub data: String,
}

/// Detail-view record, discriminated like the GraphQL schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "__typename")]
pub enum TransactionDetail {
    Transfer(TransferDetail),
    Withdrawal(WithdrawalDetail),
    Swap(SwapDetail),
    OrderbookTrade(TradeDetail),
    Deposit(DepositDetail),
    AccountUpdate(AccountUpdateDetail),
    Add(AmmFlowDetail),
    Remove(AmmFlowDetail),
    AmmUpdate(AmmUpdateDetail),
}

/// Convert one decoded record, resolving addresses and pools via the API.
pub async fn convert_transaction(
    api: &ApiClient,
    catalog: &TokenCatalog,
    decoded: &DecodedTransaction,
) -> Result<TransactionDetail, AppError> {
    match decoded {
        DecodedTransaction::Transfer(transfer) => {
            let (from, to) = futures::try_join!(
                api.account(transfer.account_from_id),
                api.account(transfer.account_to_id)
            )?;
            transfer_detail(transfer, from.owner, to.owner, catalog)
        }
        DecodedTransaction::Withdrawal(withdrawal) => withdrawal_detail(withdrawal, catalog),
        DecodedTransaction::Swap(swap) => {
            let (account, pools) =
                futures::try_join!(api.account(swap.account_id_a), api.amm_pools())?;
            swap_detail(swap, account.owner, &pools.pools, catalog)
        }
        DecodedTransaction::Trade(trade) => {
            let (account_a, account_b) = futures::try_join!(
                api.account(trade.account_id_a),
                api.account(trade.account_id_b)
            )?;
            trade_detail(trade, account_a.owner, account_b.owner, catalog)
        }
        DecodedTransaction::Deposit(deposit) => {
            let to = api.account(deposit.to_account_id).await?;
            deposit_detail(deposit, to.owner, catalog)
        }
        DecodedTransaction::AccountUpdate(update) => account_update_detail(update, catalog),
        DecodedTransaction::AmmJoin(join) => amm_join_detail(join, catalog),
        DecodedTransaction::AmmExit(exit) => amm_exit_detail(exit, catalog),
        DecodedTransaction::AmmUpdate(update) => Ok(TransactionDetail::AmmUpdate(AmmUpdateDetail {
            data: strip_hex_prefix(&update.tx_data),
        })),
    }
}

pub fn transfer_detail(
    transfer: &DecodedTransfer,
    from_address: String,
    to_address: String,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    let token = require_token(catalog, transfer.token_id)?;
    let fee_token = require_token(catalog, transfer.fee_token_id)?;

    Ok(TransactionDetail::Transfer(TransferDetail {
        from_account: AccountRef::new(transfer.account_from_id, Some(from_address)),
        to_account: AccountRef::new(transfer.account_to_id, Some(to_address)),
        amount: transfer.amount.clone(),
        fee: transfer.fee.clone(),
        token,
        fee_token,
        data: strip_hex_prefix(&transfer.tx_data),
    }))
}

pub fn withdrawal_detail(
    withdrawal: &DecodedWithdrawal,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    Ok(TransactionDetail::Withdrawal(WithdrawalDetail {
        amount: withdrawal.amount.clone(),
        fee: withdrawal.fee.clone(),
        withdrawal_token: require_token(catalog, withdrawal.token_id)?,
        withdrawal_fee_token: require_token(catalog, withdrawal.fee_token_id)?,
        data: strip_hex_prefix(&withdrawal.tx_data),
    }))
}

pub fn swap_detail(
    swap: &DecodedSwap,
    account_address: String,
    pools: &[AmmPool],
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    let token_a = require_token(catalog, swap.token_a_s)?;
    let token_b = require_token(catalog, swap.token_b_s)?;

    let pool = pools
        .iter()
        .find(|pool| pool.holds_pair(swap.token_a_b, swap.token_b_b))
        .ok_or(AppError::PoolNotFound(swap.token_a_b, swap.token_b_b))?;

    debug!(pool = %pool.address, "Matched AMM pool for swap");

    let (token_a_price, token_b_price) =
        direct_prices(&swap.fill_s_a, &swap.fill_s_b, &token_a, &token_b)?;

    Ok(TransactionDetail::Swap(SwapDetail {
        account: AccountRef::new(swap.account_id_a, Some(account_address)),
        token_a,
        token_b,
        fill_s_a: swap.fill_s_a.clone(),
        fill_s_b: swap.fill_s_b.clone(),
        token_a_price,
        token_b_price,
        pair: EntityRef { id: pool.pair_id() },
        fee_a: swap.fee_a.clone(),
        fee_b: swap.fee_b.clone(),
        pool: AccountRef::by_address(Some(pool.address.clone())),
        data: strip_hex_prefix(&swap.tx_data),
    }))
}

pub fn trade_detail(
    trade: &DecodedTrade,
    address_a: String,
    address_b: String,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    let token_a = require_token(catalog, trade.token_a_s)?;
    let token_b = require_token(catalog, trade.token_b_s)?;

    let (token_a_price, token_b_price) =
        direct_prices(&trade.fill_s_a, &trade.fill_s_b, &token_a, &token_b)?;

    Ok(TransactionDetail::OrderbookTrade(TradeDetail {
        account_a: AccountRef::new(trade.account_id_a, Some(address_a)),
        account_b: AccountRef::new(trade.account_id_b, Some(address_b)),
        token_a,
        token_b,
        fill_s_a: trade.fill_s_a.clone(),
        fill_s_b: trade.fill_s_b.clone(),
        token_a_price,
        token_b_price,
        fee_a: trade.fee_a.clone(),
        fee_b: trade.fee_b.clone(),
        data: strip_hex_prefix(&trade.tx_data),
    }))
}

pub fn deposit_detail(
    deposit: &DecodedDeposit,
    to_address: String,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    Ok(TransactionDetail::Deposit(DepositDetail {
        to_account: AccountRef::new(deposit.to_account_id, Some(to_address)),
        token: require_token(catalog, deposit.token_id)?,
        amount: deposit.amount.clone(),
        data: strip_hex_prefix(&deposit.tx_data),
    }))
}

pub fn account_update_detail(
    update: &DecodedAccountUpdate,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    Ok(TransactionDetail::AccountUpdate(AccountUpdateDetail {
        user: UserRef {
            address: update.owner.clone(),
            id: update.account_id.to_string(),
            public_key: update.public_key.clone(),
        },
        fee_token: require_token(catalog, update.fee_token_id)?,
        fee: update.fee.clone(),
        data: strip_hex_prefix(&update.tx_data),
    }))
}

pub fn amm_join_detail(
    join: &DecodedAmmJoin,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    Ok(TransactionDetail::Add(AmmFlowDetail {
        account: AccountRef::new(join.account_id, Some(join.from.clone())),
        token: require_token(catalog, join.token_id)?,
        pool: AccountRef::new(join.to_token_id, Some(join.to.clone())),
        amount: join.amount.clone(),
        fee_token: require_token(catalog, join.fee_token_id)?,
        fee: join.fee.clone(),
        data: strip_hex_prefix(&join.tx_data),
    }))
}

pub fn amm_exit_detail(
    exit: &DecodedAmmExit,
    catalog: &TokenCatalog,
) -> Result<TransactionDetail, AppError> {
    Ok(TransactionDetail::Remove(AmmFlowDetail {
        account: AccountRef::new(exit.account_to_id, Some(exit.to.clone())),
        token: require_token(catalog, exit.token_id)?,
        pool: AccountRef::new(exit.account_from_id, Some(exit.from.clone())),
        amount: exit.amount.clone(),
        fee_token: require_token(catalog, exit.fee_token_id)?,
        fee: exit.fee.clone(),
        data: strip_hex_prefix(&exit.tx_data),
    }))
}

fn require_token(catalog: &TokenCatalog, token_id: u32) -> Result<TokenInfo, AppError> {
    let id = token_id.to_string();
    catalog
        .get(&id)
        .map(TokenInfo::from)
        .ok_or(AppError::TokenNotFound(id))
}

/// Direct prices scaled by the counter token's decimals:
/// tokenBPrice = floor(fillSA * 10^dec(B) / fillSB),
/// tokenAPrice = floor(fillSB * 10^dec(A) / fillSA).
fn direct_prices(
    fill_s_a: &str,
    fill_s_b: &str,
    token_a: &TokenInfo,
    token_b: &TokenInfo,
) -> Result<(String, String), AppError> {
    let sold = num::parse_amount(fill_s_a)
        .ok_or_else(|| AppError::Mapping(format!("invalid fill amount: {}", fill_s_a)))?;
    let bought = num::parse_amount(fill_s_b)
        .ok_or_else(|| AppError::Mapping(format!("invalid fill amount: {}", fill_s_b)))?;

    let token_b_price = num::direct_price(sold, token_b.decimals, bought)
        .ok_or_else(|| AppError::Mapping("zero fill in trade price".to_string()))?;
    let token_a_price = num::direct_price(bought, token_a.decimals, sold)
        .ok_or_else(|| AppError::Mapping("zero fill in trade price".to_string()))?;

    Ok((token_a_price.to_string(), token_b_price.to_string()))
}

fn strip_hex_prefix(data: &str) -> String {
    data.strip_prefix("0x").unwrap_or(data).to_string()
}
