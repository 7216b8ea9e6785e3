use async_trait::async_trait;
use sqlx::types::Uuid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("credentials expired")]
    Expired,

    #[error("identity provider unavailable: {0}")]
    Unavailable(anyhow::Error),
}

/// The caller resolved from a bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Resolves an opaque bearer token to the user it was issued for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
