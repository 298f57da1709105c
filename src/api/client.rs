use crate::api::models::{
    AccountResponse, BlockResponse, ExchangeToken, PoolsResponse, VaultToken,
};
use crate::error::AppError;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Typed client for the rollup's REST API.
///
/// Paths are joined onto the configured base URL (which always ends with a
/// slash, enforced by config validation). The client performs no retries;
/// retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// Fetch a block by id, including its raw transaction batch.
    pub async fn block(&self, block_id: u64) -> Result<BlockResponse, AppError> {
        self.get_json(&format!("block/getBlock?id={}", block_id))
            .await
    }

    /// Fetch the latest finalized block.
    pub async fn latest_block(&self) -> Result<BlockResponse, AppError> {
        self.get_json("block/getBlock").await
    }

    /// Fetch an account descriptor by its rollup account id.
    pub async fn account(&self, account_id: u64) -> Result<AccountResponse, AppError> {
        self.get_json(&format!("account?accountId={}", account_id))
            .await
    }

    /// Fetch an account descriptor by its L1 owner address.
    pub async fn account_by_owner(&self, owner: &str) -> Result<AccountResponse, AppError> {
        self.get_json(&format!("account?owner={}", owner)).await
    }

    /// Fetch the normal token catalog.
    pub async fn tokens(&self) -> Result<Vec<ExchangeToken>, AppError> {
        self.get_json("exchange/tokens").await
    }

    /// Fetch the vault token catalog.
    pub async fn vault_tokens(&self) -> Result<Vec<VaultToken>, AppError> {
        self.get_json("vault/tokens").await
    }

    /// Fetch the AMM pool list.
    pub async fn amm_pools(&self) -> Result<PoolsResponse, AppError> {
        self.get_json("amm/pools").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "API request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Api(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api(format!("GET {} returned {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Decode(format!("GET {}: {}", url, e)))
    }
}
