//! auth
//!
//! Bearer tokens for forge adapters.
//!
//! # Design
//!
//! Credential discovery is the embedding application's job. This module only
//! defines the seam a forge asks for a token through, plus the trivial
//! static implementation used by the CLI and tests.
//!
//! Tokens MUST never appear in logs, errors or debug output. Every type here
//! implements a redacting `Debug`.
//!
//! # Example
//!
//! ```
//! use ghfs::auth::{StaticToken, TokenProvider};
//!
//! let provider = StaticToken::new("ghp_example");
//! assert_eq!(format!("{:?}", provider), "StaticToken { token: \"<redacted>\" }");
//! # tokio_test::block_on(async {
//! assert_eq!(provider.bearer_token().await.unwrap(), "ghp_example");
//! # });
//! ```

use thiserror::Error;

/// Errors from token providers.
///
/// Messages never include token values.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token is available.
    #[error("no token configured")]
    NotAuthenticated,
}

/// Trait for providing bearer tokens to forge adapters.
///
/// Called once per request, so implementations may rotate tokens
/// transparently.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token.
    async fn bearer_token(&self) -> Result<String, AuthError>;
}

/// A fixed token supplied by the caller.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(self.token.clone())
    }
}
