use crate::error::AppError;
use crate::rollup::normalizer::UnknownTxPolicy;
use std::env;
use std::time::Duration;

/// Network preset selecting the default REST API base URL.
///
/// The explorer backend runs against either the Ethereum deployment of the
/// rollup or the Taiko (L3) deployment; everything else about the pipeline
/// is identical between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Ethereum,
    Taiko,
}

impl Network {
    fn default_api_url(self) -> &'static str {
        match self {
            Network::Ethereum => "https://api3.loopring.io/api/v3/",
            Network::Taiko => "https://taiko.loopring.io/api/v3/",
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// All configuration values are validated during construction to fail fast
/// if the environment is misconfigured.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub network: Network,
    pub api_url: String,
    pub block_id: Option<u64>,
    pub poll_interval: Duration,
    pub include_vault_tokens: bool,
    pub unknown_tx_policy: UnknownTxPolicy,
    pub log_level: String,
    pub metrics_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - NETWORK: "ETHEREUM" or "TAIKO" (default: "ETHEREUM")
    /// - API_URL: REST API base URL (default: the network's public endpoint)
    /// - BLOCK_ID: normalize this single block and exit instead of following
    ///   the chain head
    /// - POLL_INTERVAL_SECS: chain head poll interval (default: 15)
    /// - INCLUDE_VAULT_TOKENS: merge the vault token list into the catalog
    ///   (default: "true")
    /// - UNKNOWN_TX_POLICY: "skip" or "reject" for unrecognized transaction
    ///   types (default: "skip")
    /// - LOG_LEVEL: logging level (default: "info")
    /// - METRICS_PORT: port for the Prometheus metrics server (default: 9090)
    pub fn from_env() -> Result<Self, AppError> {
        let network = match env::var("NETWORK") {
            Ok(value) => match value.to_uppercase().as_str() {
                "ETHEREUM" => Network::Ethereum,
                "TAIKO" => Network::Taiko,
                other => {
                    return Err(AppError::Config(format!(
                        "NETWORK must be ETHEREUM or TAIKO, got: {}",
                        other
                    )))
                }
            },
            Err(_) => Network::Ethereum,
        };

        let api_url = env::var("API_URL").unwrap_or_else(|_| network.default_api_url().to_string());
        let api_url = Self::validate_api_url(api_url)?;

        let block_id = match env::var("BLOCK_ID") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| AppError::Config(format!("BLOCK_ID must be a number, got: {}", raw)))?,
            ),
            Err(_) => None,
        };

        let poll_interval = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(15));

        let include_vault_tokens = env::var("INCLUDE_VAULT_TOKENS")
            .ok()
            .and_then(|val| val.parse::<bool>().ok())
            .unwrap_or(true);

        let unknown_tx_policy = match env::var("UNKNOWN_TX_POLICY") {
            Ok(value) => match value.to_lowercase().as_str() {
                "skip" => UnknownTxPolicy::Skip,
                "reject" => UnknownTxPolicy::Reject,
                other => {
                    return Err(AppError::Config(format!(
                        "UNKNOWN_TX_POLICY must be skip or reject, got: {}",
                        other
                    )))
                }
            },
            Err(_) => UnknownTxPolicy::Skip,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let metrics_port = env::var("METRICS_PORT")
            .ok()
            .and_then(|port_str| port_str.parse::<u16>().ok())
            .unwrap_or(9090);

        Ok(Self {
            network,
            api_url,
            block_id,
            poll_interval,
            include_vault_tokens,
            unknown_tx_policy,
            log_level,
            metrics_port,
        })
    }

    /// Validate the API base URL and normalize it to end with a slash.
    ///
    /// Request paths are joined by simple concatenation, so a missing
    /// trailing slash would silently produce wrong URLs. Catching scheme
    /// mistakes here fails fast rather than on the first request.
    fn validate_api_url(url: String) -> Result<String, AppError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "API_URL must be an HTTP/HTTPS URL (http:// or https://), got: {}",
                url
            )));
        }
        if url.ends_with('/') {
            Ok(url)
        } else {
            Ok(format!("{}/", url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_gets_trailing_slash() {
        let url = AppConfig::validate_api_url("https://example.com/api/v3".to_string()).unwrap();
        assert_eq!(url, "https://example.com/api/v3/");
    }

    #[test]
    fn api_url_keeps_existing_slash() {
        let url = AppConfig::validate_api_url("https://example.com/api/v3/".to_string()).unwrap();
        assert_eq!(url, "https://example.com/api/v3/");
    }

    #[test]
    fn api_url_rejects_bad_scheme() {
        assert!(AppConfig::validate_api_url("ftp://example.com/".to_string()).is_err());
    }
}
