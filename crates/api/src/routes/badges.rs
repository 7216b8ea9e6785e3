use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{middleware, Router};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use hotwheels_runtime::{
    list_earned_badges, remove_badge, select_badge, AuthenticatedUser, EarnedBadge, SlotError,
};

use crate::middleware::authenticate;
use crate::response::{AppError, AppSuccess, Done};
use crate::GlobalState;

pub fn badge_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/api/checkin/user-badges",
            get(get_user_badges)
            .post(post_select_badge)
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        )
        .route("/api/checkin/user-badges/{slot}",
            delete(delete_selected_badge)
            .route_layer(middleware::from_fn_with_state(state, authenticate))
        )
}

#[derive(Debug, Deserialize)]
struct SelectBadgeRequest {
    badge_id: Option<Uuid>,
    slot: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct UserBadgesResponse {
    pub badges: Vec<EarnedBadge>,
}

fn slot_error(err: SlotError) -> AppError {
    match err {
        SlotError::Storage(e) => AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!(e)),
        e => AppError::new(StatusCode::BAD_REQUEST, anyhow!(e)),
    }
}

async fn get_user_badges(
    State(state): State<GlobalState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<AppSuccess<UserBadgesResponse>, AppError> {
    let badges = list_earned_badges(state.ledger.as_ref(), user.user_id).await?;
    Ok(AppSuccess::ok(UserBadgesResponse { badges }))
}

async fn post_select_badge(
    State(state): State<GlobalState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Bytes,
) -> Result<AppSuccess<Done>, AppError> {
    let request = serde_json::from_slice::<SelectBadgeRequest>(&body)
        .map_err(|_| AppError::bad_request("invalid slot or badge"))?;
    let badge_id = request.badge_id
        .ok_or_else(|| AppError::bad_request("invalid slot or badge"))?;

    select_badge(state.ledger.as_ref(), user.user_id, badge_id, request.slot)
        .await
        .map_err(slot_error)?;
    Ok(AppSuccess::done())
}

async fn delete_selected_badge(
    State(state): State<GlobalState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(slot): Path<String>,
) -> Result<AppSuccess<Done>, AppError> {
    let slot: i32 = slot.parse()
        .map_err(|_| AppError::bad_request("invalid slot or badge"))?;

    let removed = remove_badge(state.ledger.as_ref(), user.user_id, slot)
        .await
        .map_err(slot_error)?;
    if !removed {
        tracing::debug!("[/api/checkin/user-badges] slot {} was already empty for {}", slot, user.user_id);
    }
    Ok(AppSuccess::done())
}
