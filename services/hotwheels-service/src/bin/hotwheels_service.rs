use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use hotwheels_common::EnvVars;
use hotwheels_service_api::{app_router, setup_tracing, ApiServerEnv, GlobalState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let env = ApiServerEnv::load()?;
    let global_state = GlobalState::from_env(&env).await?;

    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let app = app_router(global_state)
        .layer(TimeoutLayer::new(Duration::from_secs(env.request_timeout_secs.max(1) * 3)))
        .layer(cors)
        .layer(trace);

    let port = env.port;
    let listener = tokio::net::TcpListener::bind(format!(":::{port}")).await?;

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
