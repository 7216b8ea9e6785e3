use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use hotwheels_clients::{PostgresClient, SupabaseAuth, SupabaseAuthClient};
use hotwheels_common::ModuleClient;
use hotwheels_runtime::{IdentityProvider, LedgerStore, MemoryStore, ModelCatalog};

use crate::env::ApiServerEnv;
use crate::identity::SealedTokenIdentity;

#[derive(Clone)]
pub struct GlobalState {
    pub ledger: Arc<dyn LedgerStore>,
    pub catalog: Arc<dyn ModelCatalog>,
    pub identity: Arc<dyn IdentityProvider>,
    pub allow_force_checkin: bool,
}

impl GlobalState {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        catalog: Arc<dyn ModelCatalog>,
        identity: Arc<dyn IdentityProvider>,
        allow_force_checkin: bool,
    ) -> Self {
        Self { ledger, catalog, identity, allow_force_checkin }
    }

    /// Ledger and catalog backed by one shared `MemoryStore`.
    pub fn in_memory(
        store: Arc<MemoryStore>,
        identity: Arc<dyn IdentityProvider>,
        allow_force_checkin: bool,
    ) -> Self {
        Self::new(store.clone(), store, identity, allow_force_checkin)
    }

    pub async fn from_env(env: &ApiServerEnv) -> Result<Self> {
        let db = Arc::new(PostgresClient::setup_connection().await?);

        let identity: Arc<dyn IdentityProvider> = match (&env.supabase_url, &env.supabase_anon_key) {
            (Some(url), Some(anon_key)) => {
                tracing::info!("[GlobalState::from_env] resolving identities through {}", url);
                let auth = SupabaseAuth::new(url, anon_key, Duration::from_secs(env.request_timeout_secs))?;
                Arc::new(SupabaseAuthClient::from_client(auth))
            }
            _ => {
                tracing::info!("[GlobalState::from_env] resolving identities from sealed tokens");
                Arc::new(SealedTokenIdentity::new(&env.secret_salt, env.token_ttl_secs))
            }
        };

        if env.allow_force_checkin {
            tracing::warn!("[GlobalState::from_env] forced check-ins are enabled");
        }

        Ok(Self::new(db.clone(), db, identity, env.allow_force_checkin))
    }
}
