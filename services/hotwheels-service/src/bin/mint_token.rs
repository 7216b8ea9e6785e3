use anyhow::{anyhow, Result};
use sqlx::types::Uuid;

use hotwheels_common::EnvVars;
use hotwheels_service_api::{ApiServerEnv, SealedTokenIdentity};

/// Prints a sealed bearer token for the user id given as the first argument.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let raw = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: mint_token <user-uuid>"))?;
    let user_id = Uuid::parse_str(&raw).map_err(|e| anyhow!("invalid user id '{}': {}", raw, e))?;

    let env = ApiServerEnv::load()?;
    let identity = SealedTokenIdentity::new(&env.secret_salt, env.token_ttl_secs);
    println!("{}", identity.issue(user_id)?);
    Ok(())
}
