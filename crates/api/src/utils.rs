use axum::extract::Request;
use axum::http::header;
use tracing_subscriber::EnvFilter;

use crate::response::AppError;

pub fn extract_bearer_token(req: &Request) -> Result<String, AppError> {
    let auth_header = req.headers().get(header::AUTHORIZATION);

    match auth_header {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::unauthorized())?
                .split_whitespace()
                .collect::<Vec<_>>();

            if value.len() != 2 || value[0] != "Bearer" {
                tracing::debug!("[extract_bearer_token] malformed authorization header");
                return Err(AppError::unauthorized());
            }

            Ok(value[1].to_string())
        }
        None => Err(AppError::unauthorized()),
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing subscriber already installed");
    }
}
