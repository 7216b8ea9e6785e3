use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::Value;

use hotwheels_common::utc_today;
use hotwheels_runtime::{
    checkin_status, daily_checkin, AuthenticatedUser, CheckinOutcome, CheckinStatus, LedgerError,
};

use crate::middleware::authenticate;
use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn checkin_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/api/checkin",
            get(get_checkin_status)
            .post(post_checkin)
            .route_layer(middleware::from_fn_with_state(state, authenticate))
        )
}

// Absent, empty or malformed bodies all mean a normal check-in.
fn parse_force(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("force").and_then(Value::as_bool))
        .unwrap_or(false)
}

fn ledger_error(err: LedgerError) -> AppError {
    match err {
        LedgerError::AlreadyCheckedIn(existing) => {
            AppError::bad_request("already checked in today").with_context("checkin", &existing)
        }
        e @ LedgerError::BackfillExhausted(_) => AppError::new(StatusCode::BAD_REQUEST, anyhow!(e)),
        LedgerError::Storage(e) => AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!(e)),
    }
}

async fn get_checkin_status(
    State(state): State<GlobalState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<AppSuccess<CheckinStatus>, AppError> {
    let status = checkin_status(state.ledger.as_ref(), user.user_id, utc_today()).await?;
    Ok(AppSuccess::ok(status))
}

async fn post_checkin(
    State(state): State<GlobalState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Bytes,
) -> Result<AppSuccess<CheckinOutcome>, AppError> {
    let force = parse_force(&body);
    if force && !state.allow_force_checkin {
        return Err(AppError::new(StatusCode::FORBIDDEN, anyhow!("forced check-ins are disabled")));
    }

    let outcome = daily_checkin(state.ledger.as_ref(), user.user_id, utc_today(), force)
        .await
        .map_err(ledger_error)?;

    tracing::info!(
        "[/api/checkin] user {} reached level {} (badge awarded: {})",
        user.user_id, outcome.level, outcome.badge_awarded
    );
    Ok(AppSuccess::created(outcome))
}
