use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Uuid;
use thiserror::Error;

use crate::{Badge, CheckinRecord, HotwheelsModel, SearchFilter, SelectedBadge, UserBadge};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The write collided with a uniqueness constraint. Callers treat this
    /// as the authoritative "already exists" signal.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if hotwheels_database::is_unique_violation(&err) {
            StoreError::UniqueViolation(err.to_string())
        } else {
            StoreError::Backend(err.into())
        }
    }
}

/// Persistence for the check-in ledger, the badge catalog, grants and slots.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All of a user's check-ins, most recent date first.
    async fn list_checkins(&self, user_id: Uuid) -> Result<Vec<CheckinRecord>, StoreError>;
    async fn count_checkins(&self, user_id: Uuid) -> Result<i64, StoreError>;
    async fn find_checkin_on(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<CheckinRecord>, StoreError>;
    /// Fails with `UniqueViolation` when the user already has a record on that date.
    async fn insert_checkin(&self, record: CheckinRecord) -> Result<CheckinRecord, StoreError>;

    /// The badge catalog ordered by `level_required` ascending.
    async fn list_badges(&self) -> Result<Vec<Badge>, StoreError>;
    async fn find_badge_for_level(&self, level: i32) -> Result<Option<Badge>, StoreError>;
    async fn insert_badge(&self, badge: Badge) -> Result<Badge, StoreError>;

    /// Grants, newest first.
    async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, StoreError>;
    async fn find_user_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<Option<UserBadge>, StoreError>;
    async fn insert_user_badge(&self, grant: UserBadge) -> Result<UserBadge, StoreError>;

    /// Slots ordered by position.
    async fn list_selected_badges(&self, user_id: Uuid) -> Result<Vec<SelectedBadge>, StoreError>;
    async fn insert_selected_badge(&self, selection: SelectedBadge) -> Result<SelectedBadge, StoreError>;
    /// Clears `selection.position` and stores `selection` in one atomic step.
    /// On failure the previous occupant is left in place.
    async fn replace_selected_badge(&self, selection: SelectedBadge) -> Result<SelectedBadge, StoreError>;
    async fn delete_selected_badge(&self, user_id: Uuid, position: i32) -> Result<u64, StoreError>;
}

/// The model catalog.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn insert_model(&self, model: HotwheelsModel) -> Result<HotwheelsModel, StoreError>;

    /// One page of matches ordered by name, plus the total match count.
    async fn search_models(
        &self,
        filter: &SearchFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<HotwheelsModel>, i64), StoreError>;
}
