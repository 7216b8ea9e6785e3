use anyhow::Result;

use hotwheels_clients::PostgresClient;
use hotwheels_service_api::setup_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    tracing::warn!("[reset_db] dropping and recreating every table");
    PostgresClient::setup_with_tables(true).await?;
    tracing::info!("[reset_db] done, run `init` to seed the badge catalog");
    Ok(())
}
