use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use hotwheels_common::{decrypt, encrypt, get_current_timestamp};
use hotwheels_runtime::{AuthError, AuthenticatedUser, IdentityProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedClaims {
    user_id: Uuid,
    issued_at: u64,
}

/// Bearer tokens sealed with the server secret. The token carries the user id
/// and its issue time; it is valid for `ttl_secs` after issue.
pub struct SealedTokenIdentity {
    secret_salt: String,
    ttl_secs: u64,
}

impl SealedTokenIdentity {
    pub fn new(secret_salt: &str, ttl_secs: u64) -> Self {
        Self { secret_salt: secret_salt.to_string(), ttl_secs }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        self.issue_at(user_id, get_current_timestamp())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: u64) -> Result<String> {
        let claims = serde_json::to_string(&SealedClaims { user_id, issued_at })
            .map_err(|e| anyhow!("failed to encode claims: {}", e))?;
        encrypt(&claims, &self.secret_salt)
    }
}

#[async_trait]
impl IdentityProvider for SealedTokenIdentity {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let opened = decrypt(token, &self.secret_salt)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        let claims: SealedClaims = serde_json::from_str(&opened)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        if get_current_timestamp() > claims.issued_at.saturating_add(self.ttl_secs) {
            return Err(AuthError::Expired);
        }
        Ok(AuthenticatedUser { user_id: claims.user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_resolves_to_user() -> Result<(), anyhow::Error> {
        let identity = SealedTokenIdentity::new("salt", 60);
        let user_id = Uuid::new_v4();
        let token = identity.issue(user_id)?;
        assert_eq!(identity.resolve(&token).await?.user_id, user_id);
        Ok(())
    }

    #[tokio::test]
    async fn expired_and_foreign_tokens_are_rejected() -> Result<(), anyhow::Error> {
        let identity = SealedTokenIdentity::new("salt", 60);
        let stale = identity.issue_at(Uuid::new_v4(), get_current_timestamp() - 3600)?;
        assert!(matches!(identity.resolve(&stale).await, Err(AuthError::Expired)));

        let foreign = SealedTokenIdentity::new("other", 60).issue(Uuid::new_v4())?;
        assert!(matches!(identity.resolve(&foreign).await, Err(AuthError::InvalidCredentials(_))));
        assert!(matches!(identity.resolve("").await, Err(AuthError::MissingCredentials)));
        Ok(())
    }
}
