mod client;
mod crypto;
mod env;

use chrono::{Days, NaiveDate, Utc};

pub use client::ModuleClient;
pub use crypto::{blake3_hash, decrypt, encrypt};
pub use env::{optional_var, parsed_var, required_var, EnvVars};

#[doc(hidden)]
pub use tracing;

pub fn get_current_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Today's calendar date in UTC.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `date` moved `days` calendar days into the past, saturating at the
/// earliest representable date.
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}
