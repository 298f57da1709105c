use crate::api::models::{ExchangeToken, VaultToken};
use crate::api::ApiClient;
use crate::error::AppError;
use std::collections::HashMap;
use tracing::info;

/// One token's display metadata, keyed by its stringified numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: String,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    pub address: String,
}

impl From<ExchangeToken> for Token {
    fn from(token: ExchangeToken) -> Self {
        Token {
            id: token.token_id.to_string(),
            decimals: token.decimals,
            symbol: token.symbol,
            name: token.name,
            address: token.address,
        }
    }
}

impl From<VaultToken> for Token {
    fn from(token: VaultToken) -> Self {
        Token {
            id: token.vault_token_id.to_string(),
            decimals: token.decimals,
            symbol: token.symbol,
            name: token.name,
            address: token.address,
        }
    }
}

/// Merged token lookup built from the normal and vault catalogs.
///
/// The normal list is merged first; on a duplicate id the earlier entry
/// wins, mirroring a linear scan over the concatenated lists.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    by_id: HashMap<String, Token>,
}

impl TokenCatalog {
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut by_id = HashMap::new();
        for token in tokens {
            by_id.entry(token.id.clone()).or_insert(token);
        }
        TokenCatalog { by_id }
    }

    /// Fetch both catalogs concurrently and merge them.
    ///
    /// Both fetches must succeed before any mapping starts; either failure
    /// fails the whole batch.
    pub async fn fetch(api: &ApiClient, include_vault: bool) -> Result<Self, AppError> {
        let catalog = if include_vault {
            let (normal, vault) = tokio::try_join!(api.tokens(), api.vault_tokens())?;
            Self::from_tokens(
                normal
                    .into_iter()
                    .map(Token::from)
                    .chain(vault.into_iter().map(Token::from)),
            )
        } else {
            let normal = api.tokens().await?;
            Self::from_tokens(normal.into_iter().map(Token::from))
        };

        info!(tokens = catalog.len(), "Token catalog loaded");
        Ok(catalog)
    }

    /// Look up a token by its stringified numeric id.
    pub fn get(&self, id: &str) -> Option<&Token> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: &str, symbol: &str) -> Token {
        Token {
            id: id.to_string(),
            decimals: 18,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            address: format!("0x{}", symbol.to_lowercase()),
        }
    }

    #[test]
    fn lookup_by_stringified_id() {
        let catalog = TokenCatalog::from_tokens([token("0", "ETH"), token("1", "LRC")]);
        assert_eq!(catalog.get("1").map(|t| t.symbol.as_str()), Some("LRC"));
        assert_eq!(catalog.get("7"), None);
    }

    #[test]
    fn first_entry_wins_on_duplicate_ids() {
        let catalog = TokenCatalog::from_tokens([token("1", "LRC"), token("1", "VAULT-LRC")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("1").map(|t| t.symbol.as_str()), Some("LRC"));
    }

    #[test]
    fn vault_ids_convert_like_normal_ids() {
        let vault = VaultToken {
            vault_token_id: 32769,
            decimals: 6,
            symbol: "VUSDC".to_string(),
            name: "Vault USDC".to_string(),
            address: "0xvault".to_string(),
        };
        let token = Token::from(vault);
        assert_eq!(token.id, "32769");
        assert_eq!(token.decimals, 6);
    }
}
