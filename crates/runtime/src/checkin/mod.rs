mod award;
mod ledger;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use hotwheels_database::SqlxObject;

use crate::Badge;

pub use award::should_award_badge;
pub use ledger::{
    checkin_status, daily_checkin, CheckinOutcome, CheckinStatus, LedgerError,
    BACKFILL_LIMIT_DAYS, RECENT_WINDOW_DAYS,
};

/// One row per user per calendar day. The number of rows a user owns is
/// their level; each row remembers the level it was created at.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, SqlxObject)]
#[table_name = "daily_checkins"]
#[unique_together(user_id, checkin_date)]
pub struct CheckinRecord {
    pub id: Uuid,

    #[indexed]
    pub user_id: Uuid,
    pub checkin_date: NaiveDate,
    pub level: i32,

    #[foreign_key(referenced_table = "badges", related_rust_type = "Badge")]
    pub badge_id: Option<Uuid>,

    pub created_at: i64,
}

impl CheckinRecord {
    /// A record ready for insertion; `id` and `created_at` are assigned by the store.
    pub fn new(user_id: Uuid, checkin_date: NaiveDate, level: i32, badge: Option<&Badge>) -> Self {
        Self {
            id: Uuid::nil(),
            user_id,
            checkin_date,
            level,
            badge_id: badge.map(|b| b.id),
            created_at: 0,
        }
    }
}
