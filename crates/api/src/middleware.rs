use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::response::AppError;
use crate::utils::extract_bearer_token;
use crate::GlobalState;

/// Resolves the bearer credential and stores the `AuthenticatedUser` in the
/// request extensions. Every failure is answered with 401.
pub async fn authenticate(
    State(state): State<GlobalState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let token = extract_bearer_token(&req)?;

    let user = state.identity
        .resolve(&token)
        .await
        .map_err(|e| {
            tracing::warn!("[authenticate] {} {}: {}", req.method(), req.uri().path(), e);
            AppError::unauthorized()
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
