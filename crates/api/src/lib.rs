mod env;
mod global_state;
mod identity;
mod middleware;
mod response;
mod routes;
mod utils;

use axum::Router;

pub use routes::{badge_routes, checkin_routes, misc_routes, search_routes};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use identity::SealedTokenIdentity;
pub use middleware::authenticate;
pub use response::{AppError, AppSuccess, Done};
pub use utils::{extract_bearer_token, setup_tracing};

/// Every route of the service with its state applied. Transport layers are
/// added by the binary.
pub fn app_router(state: GlobalState) -> Router {
    Router::new()
        .merge(checkin_routes(state.clone()))
        .merge(badge_routes(state.clone()))
        .merge(search_routes())
        .merge(misc_routes())
        .with_state(state)
}
