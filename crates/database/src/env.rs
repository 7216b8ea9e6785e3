use anyhow::Result;

use hotwheels_common::{parsed_var, required_var, EnvVars};

pub struct DatabaseEnv {
    pub database_url: String,
    pub max_connections: u32,
}

impl EnvVars for DatabaseEnv {
    fn load() -> Result<Self> {
        Ok(Self {
            database_url: required_var("DATABASE_URL")?,
            max_connections: parsed_var("DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }
}
