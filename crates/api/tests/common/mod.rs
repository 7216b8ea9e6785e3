#![allow(dead_code)]

use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use sqlx::types::Uuid;

use hotwheels_runtime::MemoryStore;
use hotwheels_service_api::{app_router, GlobalState, SealedTokenIdentity};

pub const SECRET: &str = "integration-salt";

pub struct TestApp {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<SealedTokenIdentity>,
    pub http: Client,
}

impl TestApp {
    pub async fn spawn(allow_force_checkin: bool) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::default());
        let identity = Arc::new(SealedTokenIdentity::new(SECRET, 3600));
        let state = GlobalState::in_memory(store.clone(), identity.clone(), allow_force_checkin);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app_router(state)).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            store,
            identity,
            http: Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.identity.issue(user_id)
    }

    pub fn get_as(&self, user_id: Uuid, path: &str) -> anyhow::Result<RequestBuilder> {
        Ok(self.http.get(self.url(path)).bearer_auth(self.token_for(user_id)?))
    }

    pub fn post_as(&self, user_id: Uuid, path: &str) -> anyhow::Result<RequestBuilder> {
        Ok(self.http.post(self.url(path)).bearer_auth(self.token_for(user_id)?))
    }

    pub fn delete_as(&self, user_id: Uuid, path: &str) -> anyhow::Result<RequestBuilder> {
        Ok(self.http.delete(self.url(path)).bearer_auth(self.token_for(user_id)?))
    }
}
