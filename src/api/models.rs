use crate::rollup::models::RawTransaction;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One rollup block as returned by `block/getBlock`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub block_id: u64,
    pub block_size: u32,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Millisecond unix timestamp of block creation.
    pub created_at: i64,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

impl BlockResponse {
    /// Block creation time as a UTC datetime.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }
}

/// Account descriptor from the `account` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(default)]
    pub account_id: Option<u64>,
    pub owner: String,
}

/// One entry of the `exchange/tokens` catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeToken {
    pub token_id: u32,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    pub address: String,
}

/// One entry of the `vault/tokens` catalog. Vault tokens carry their own id
/// space but otherwise the same metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultToken {
    pub vault_token_id: u32,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    pub address: String,
}

/// Response envelope of `amm/pools`.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolsResponse {
    pub pools: Vec<AmmPool>,
}

/// One AMM pool with its pooled token pair.
#[derive(Debug, Clone, Deserialize)]
pub struct AmmPool {
    pub address: String,
    pub tokens: PoolTokens,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolTokens {
    /// Token ids of the two pooled assets.
    pub pooled: Vec<u32>,
}

impl AmmPool {
    /// Whether this pool holds exactly the given token pair, in either order.
    pub fn holds_pair(&self, token_a: u32, token_b: u32) -> bool {
        match self.tokens.pooled.as_slice() {
            [first, second] => {
                (token_a == *first && token_b == *second)
                    || (token_a == *second && token_b == *first)
            }
            _ => false,
        }
    }

    /// Pair id in the explorer's `"{id0}-{id1}"` form.
    pub fn pair_id(&self) -> String {
        self.tokens
            .pooled
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_matches_pair_in_either_order() {
        let pool = AmmPool {
            address: "0xpool".to_string(),
            tokens: PoolTokens { pooled: vec![1, 2] },
        };
        assert!(pool.holds_pair(1, 2));
        assert!(pool.holds_pair(2, 1));
        assert!(!pool.holds_pair(1, 3));
        assert_eq!(pool.pair_id(), "1-2");
    }

    #[test]
    fn block_timestamp_converts_from_millis() {
        let block = BlockResponse {
            block_id: 42,
            block_size: 0,
            exchange: None,
            tx_hash: None,
            status: None,
            created_at: 1_700_000_000_000,
            transactions: vec![],
        };
        assert_eq!(
            block.created_at_utc().map(|dt| dt.timestamp()),
            Some(1_700_000_000)
        );
    }
}
