use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sqlx::types::Uuid;

use hotwheels_common::{define_module_client, parsed_var, required_var, ModuleClient};
use hotwheels_runtime::{AuthError, AuthenticatedUser, IdentityProvider};

/// Connection details for the hosted identity provider's user endpoint.
pub struct SupabaseAuth {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("failed to build http client: {}", e))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn from_env() -> Result<Self> {
        let timeout_secs: u64 = parsed_var("REQUEST_TIMEOUT_SECS", 10)?;
        Self::new(
            &required_var("SUPABASE_URL")?,
            &required_var("SUPABASE_ANON_KEY")?,
            Duration::from_secs(timeout_secs),
        )
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Uuid,
}

define_module_client! {
    (struct SupabaseAuthClient, "supabase_auth")
    client_type: SupabaseAuth,
    env: ["SUPABASE_URL", "SUPABASE_ANON_KEY"],
    setup: async {
        SupabaseAuth::from_env()
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let auth = self.get_client();
        let response = auth.http
            .get(format!("{}/auth/v1/user", auth.base_url))
            .header("apikey", &auth.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.into()))?;

        match response.status() {
            status if status.is_success() => {
                let user: SupabaseUser = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Unavailable(anyhow!("unexpected user payload: {}", e)))?;
                Ok(AuthenticatedUser { user_id: user.id })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::InvalidCredentials("token rejected by identity provider".to_string()))
            }
            status => {
                tracing::warn!("[SupabaseAuthClient] user lookup returned {}", status);
                Err(AuthError::Unavailable(anyhow!("identity provider returned {}", status)))
            }
        }
    }
}
