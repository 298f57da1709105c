use thiserror::Error;

/// Application-level errors with context-rich messages.
///
/// All fallible operations in this application return Result<T, AppError>.
/// This enum provides specific error variants for different failure modes,
/// enabling proper error handling and informative error messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("API request error: {0}")]
    Api(String),

    #[error("response decoding error: {0}")]
    Decode(String),

    #[error("record mapping error: {0}")]
    Mapping(String),

    #[error("unknown transaction type `{tx_type}` at batch position {index}")]
    UnknownTxType { tx_type: String, index: usize },

    #[error("token id {0} not found in catalog")]
    TokenNotFound(String),

    #[error("no AMM pool holds the token pair {0}-{1}")]
    PoolNotFound(u32, u32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert anyhow::Error to AppError for broader compatibility
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
