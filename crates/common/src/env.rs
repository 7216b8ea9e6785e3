use anyhow::{anyhow, Result};

pub trait EnvVars: Sized {
    fn load() -> Result<Self>;
}

/// Reads a required variable, naming it in the error when it is missing.
pub fn required_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("{} is not set", key))
}

pub fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional variable, falling back to `default` when it is unset.
pub fn parsed_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
