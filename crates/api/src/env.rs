use anyhow::Result;

use hotwheels_common::{optional_var, parsed_var, required_var, EnvVars};

pub struct ApiServerEnv {
    pub port: u16,
    pub secret_salt: String,
    pub token_ttl_secs: u64,
    pub allow_force_checkin: bool,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Result<Self> {
        let supabase_url = optional_var("SUPABASE_URL");
        let supabase_anon_key = optional_var("SUPABASE_ANON_KEY");
        if supabase_url.is_some() && supabase_anon_key.is_none() {
            anyhow::bail!("SUPABASE_ANON_KEY is required when SUPABASE_URL is set");
        }

        Ok(Self {
            port: parsed_var("PORT", 3033)?,
            secret_salt: required_var("SECRET_SALT")?,
            token_ttl_secs: parsed_var("TOKEN_TTL_SECS", 60 * 60 * 24 * 7)?,
            allow_force_checkin: parsed_var("ALLOW_FORCE_CHECKIN", false)?,
            supabase_url,
            supabase_anon_key,
            request_timeout_secs: parsed_var("REQUEST_TIMEOUT_SECS", 10)?,
        })
    }
}
