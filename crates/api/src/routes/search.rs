use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use hotwheels_runtime::{search_models, SearchPage};

use crate::response::AppSuccess;
use crate::GlobalState;

pub fn search_routes() -> Router<GlobalState> {
    Router::new()
        .route("/api/search",
            get(search)
        )
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
    page: Option<String>,
}

async fn search(
    State(state): State<GlobalState>,
    Query(params): Query<SearchParams>,
) -> AppSuccess<SearchPage> {
    let page = params.page
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1);
    let query = params.q.unwrap_or_default();

    AppSuccess::ok(search_models(state.catalog.as_ref(), &query, page).await)
}
