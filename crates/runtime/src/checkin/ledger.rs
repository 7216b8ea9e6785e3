use chrono::NaiveDate;
use serde::Serialize;
use sqlx::types::Uuid;
use thiserror::Error;

use hotwheels_common::days_before;

use crate::badge::{join_grants, join_selections};
use crate::{
    Badge, CheckinRecord, EarnedBadge, LedgerStore, SelectedBadgeView, StoreError, UserBadge,
};

use super::should_award_badge;

/// Check-ins dated on or after `today - RECENT_WINDOW_DAYS` are "recent".
pub const RECENT_WINDOW_DAYS: u64 = 10;
/// How far back a forced check-in may search for a free day.
pub const BACKFILL_LIMIT_DAYS: u64 = 1000;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("already checked in today")]
    AlreadyCheckedIn(Box<CheckinRecord>),

    #[error("no free day within {0} days to backfill")]
    BackfillExhausted(u64),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinStatus {
    pub checkins: Vec<CheckinRecord>,
    pub all_checkins: Vec<CheckinRecord>,
    pub total_checkins: i64,
    pub current_level: i64,
    pub user_badges: Vec<EarnedBadge>,
    pub selected_badges: Vec<SelectedBadgeView>,
    pub all_badges: Vec<Badge>,
    pub next_badge_level: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinOutcome {
    pub success: bool,
    pub checkin: CheckinRecord,
    pub level: i32,
    pub new_badge: Option<Badge>,
    pub total_checkins: i64,
    pub badge_awarded: bool,
}

/// Snapshot of the caller's ledger, grants, slots and the catalog. Read-only.
pub async fn checkin_status(
    store: &dyn LedgerStore,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<CheckinStatus, StoreError> {
    let all_checkins = store.list_checkins(user_id).await?;
    let window_start = days_before(today, RECENT_WINDOW_DAYS);
    let checkins = all_checkins
        .iter()
        .filter(|c| c.checkin_date >= window_start)
        .cloned()
        .collect::<Vec<_>>();

    let total_checkins = all_checkins.len() as i64;
    let current_level = total_checkins;

    let all_badges = store.list_badges().await?;
    let user_badges = join_grants(store.list_user_badges(user_id).await?, &all_badges);
    let selected_badges = join_selections(store.list_selected_badges(user_id).await?, &all_badges);

    let next_badge_level = all_badges
        .iter()
        .map(|b| b.level_required)
        .find(|level| i64::from(*level) > current_level);

    Ok(CheckinStatus {
        checkins,
        all_checkins,
        total_checkins,
        current_level,
        user_badges,
        selected_badges,
        all_badges,
        next_badge_level,
    })
}

/// Records today's check-in for `user_id`, awarding the level badge when due.
///
/// With `force` the duplicate-day guard is skipped and the record is placed
/// on the first free day at or before `today - count`, searching back at
/// most `BACKFILL_LIMIT_DAYS` days.
pub async fn daily_checkin(
    store: &dyn LedgerStore,
    user_id: Uuid,
    today: NaiveDate,
    force: bool,
) -> Result<CheckinOutcome, LedgerError> {
    let count = store.count_checkins(user_id).await?;

    if !force {
        if let Some(existing) = store.find_checkin_on(user_id, today).await? {
            tracing::info!("[daily_checkin] user {} already checked in on {}", user_id, today);
            return Err(LedgerError::AlreadyCheckedIn(Box::new(existing)));
        }
    }

    let new_level = count + 1;
    let level = i32::try_from(new_level)
        .map_err(|_| StoreError::Backend(anyhow::anyhow!("level {} out of range", new_level)))?;

    let checkin_date = if force {
        backfill_date(store, user_id, today, count.max(0) as u64).await?
    } else {
        today
    };

    let new_badge = if should_award_badge(level) {
        let badge = store.find_badge_for_level(level).await?;
        match &badge {
            Some(b) => tracing::info!("[daily_checkin] level {} awards badge '{}'", level, b.name),
            None => tracing::info!("[daily_checkin] level {} is a badge level but no badge is configured", level),
        }
        badge
    } else {
        None
    };

    let record = CheckinRecord::new(user_id, checkin_date, level, new_badge.as_ref());
    let checkin = match store.insert_checkin(record).await {
        Ok(checkin) => checkin,
        Err(StoreError::UniqueViolation(detail)) => {
            return match store.find_checkin_on(user_id, checkin_date).await? {
                Some(existing) => Err(LedgerError::AlreadyCheckedIn(Box::new(existing))),
                None => Err(LedgerError::Storage(StoreError::UniqueViolation(detail))),
            };
        }
        Err(e) => {
            tracing::error!("[daily_checkin] failed to insert check-in for user {}: {}", user_id, e);
            return Err(e.into());
        }
    };

    if let Some(badge) = &new_badge {
        grant_badge(store, &checkin, badge).await;
    }

    Ok(CheckinOutcome {
        success: true,
        level,
        badge_awarded: new_badge.is_some(),
        new_badge,
        total_checkins: new_level,
        checkin,
    })
}

async fn backfill_date(
    store: &dyn LedgerStore,
    user_id: Uuid,
    today: NaiveDate,
    start_days_back: u64,
) -> Result<NaiveDate, LedgerError> {
    let mut days_back = start_days_back;
    loop {
        let candidate = days_before(today, days_back);
        if store.find_checkin_on(user_id, candidate).await?.is_none() {
            return Ok(candidate);
        }
        if days_back >= BACKFILL_LIMIT_DAYS {
            tracing::warn!("[daily_checkin] user {} has no free day to backfill", user_id);
            return Err(LedgerError::BackfillExhausted(BACKFILL_LIMIT_DAYS));
        }
        days_back += 1;
    }
}

/// The check-in already stands; a failed grant is logged for reconciliation only.
async fn grant_badge(store: &dyn LedgerStore, checkin: &CheckinRecord, badge: &Badge) {
    let grant = UserBadge::new(checkin.user_id, badge.id, checkin.level);
    match store.insert_user_badge(grant).await {
        Ok(_) => tracing::info!(
            "[daily_checkin] badge '{}' granted to user {} at level {}",
            badge.name, checkin.user_id, checkin.level
        ),
        Err(StoreError::UniqueViolation(_)) => tracing::warn!(
            user_id = %checkin.user_id,
            badge_id = %badge.id,
            level = checkin.level,
            checkin_id = %checkin.id,
            "[daily_checkin] user already holds this badge"
        ),
        Err(e) => tracing::error!(
            user_id = %checkin.user_id,
            badge_id = %badge.id,
            level = checkin.level,
            checkin_id = %checkin.id,
            error = %e,
            "[daily_checkin] badge grant failed; check-in kept"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded_store() -> Result<MemoryStore, anyhow::Error> {
        let store = MemoryStore::default();
        for (name, level) in [("First Spark", 1), ("Triple", 3), ("Week One", 7), ("Dozen", 12)] {
            store.insert_badge(Badge::new(name, "", level, "common")).await?;
        }
        Ok(store)
    }

    #[tokio::test]
    async fn consecutive_days_raise_level_and_award_badges() -> Result<(), anyhow::Error> {
        let store = seeded_store().await?;
        let user = Uuid::new_v4();

        let first = daily_checkin(&store, user, day(2024, 5, 1), false).await?;
        assert_eq!(first.level, 1);
        assert!(first.badge_awarded);
        assert_eq!(first.new_badge.as_ref().map(|b| b.level_required), Some(1));
        assert_eq!(first.checkin.badge_id, first.new_badge.as_ref().map(|b| b.id));

        let second = daily_checkin(&store, user, day(2024, 5, 2), false).await?;
        assert_eq!(second.level, 2);
        assert!(!second.badge_awarded);
        assert!(second.new_badge.is_none());

        let third = daily_checkin(&store, user, day(2024, 5, 3), false).await?;
        assert_eq!(third.total_checkins, 3);
        assert!(third.badge_awarded);

        let status = checkin_status(&store, user, day(2024, 5, 3)).await?;
        assert_eq!(status.total_checkins, 3);
        assert_eq!(status.current_level, 3);
        assert_eq!(status.user_badges.len(), 2);
        assert_eq!(status.next_badge_level, Some(7));
        Ok(())
    }

    #[tokio::test]
    async fn same_day_is_rejected_without_mutation() -> Result<(), anyhow::Error> {
        let store = seeded_store().await?;
        let user = Uuid::new_v4();
        let today = day(2024, 5, 1);

        let first = daily_checkin(&store, user, today, false).await?;
        match daily_checkin(&store, user, today, false).await {
            Err(LedgerError::AlreadyCheckedIn(existing)) => assert_eq!(existing.id, first.checkin.id),
            other => panic!("expected duplicate rejection, got {:?}", other),
        }
        assert_eq!(store.count_checkins(user).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn forced_checkins_walk_backwards() -> Result<(), anyhow::Error> {
        let store = seeded_store().await?;
        let user = Uuid::new_v4();
        let today = day(2024, 5, 10);

        let mut dates = Vec::new();
        for expected_level in 1..=3 {
            let outcome = daily_checkin(&store, user, today, true).await?;
            assert_eq!(outcome.level, expected_level);
            dates.push(outcome.checkin.checkin_date);
        }
        assert_eq!(dates, vec![day(2024, 5, 10), day(2024, 5, 9), day(2024, 5, 8)]);
        Ok(())
    }

    #[tokio::test]
    async fn forced_checkin_skips_occupied_days() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let today = day(2024, 5, 10);

        // One record sitting on `today - 1`, the first forced candidate.
        store.insert_checkin(CheckinRecord::new(user, day(2024, 5, 9), 1, None)).await?;
        let outcome = daily_checkin(&store, user, today, true).await?;
        assert_eq!(outcome.checkin.checkin_date, day(2024, 5, 8));
        assert_eq!(outcome.level, 2);
        Ok(())
    }

    #[tokio::test]
    async fn badge_level_without_catalog_entry_is_not_an_error() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let outcome = daily_checkin(&store, Uuid::new_v4(), day(2024, 1, 1), false).await?;
        assert_eq!(outcome.level, 1);
        assert!(!outcome.badge_awarded);
        assert!(outcome.checkin.badge_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn failed_grant_keeps_the_checkin() -> Result<(), anyhow::Error> {
        let store = seeded_store().await?;
        store.fail_grant_inserts(true);
        let user = Uuid::new_v4();

        let outcome = daily_checkin(&store, user, day(2024, 5, 1), false).await?;
        assert!(outcome.badge_awarded);
        assert_eq!(store.count_checkins(user).await?, 1);
        assert!(store.list_user_badges(user).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn racing_insert_reports_the_stored_record() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let today = day(2024, 5, 1);

        // The guard read misses the row that a concurrent request commits first.
        let stored = store.insert_checkin(CheckinRecord::new(user, today, 1, None)).await?;
        store.skip_checkin_lookups(1);
        match daily_checkin(&store, user, today, false).await {
            Err(LedgerError::AlreadyCheckedIn(existing)) => assert_eq!(existing.id, stored.id),
            other => panic!("expected duplicate rejection, got {:?}", other),
        }
        assert_eq!(store.count_checkins(user).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_on_insert_is_reported() -> Result<(), anyhow::Error> {
        let store = seeded_store().await?;
        store.fail_checkin_inserts(true);
        let user = Uuid::new_v4();

        assert!(matches!(
            daily_checkin(&store, user, day(2024, 5, 1), false).await,
            Err(LedgerError::Storage(StoreError::Backend(_)))
        ));
        assert_eq!(store.count_checkins(user).await?, 0);
        assert!(store.list_user_badges(user).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn forced_checkin_gives_up_past_the_backfill_limit() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let today = day(2024, 5, 10);

        // 501 records on today-500 ..= today-1000: the first candidate is
        // today-501 and every day back to the limit is taken.
        for (i, back) in (500..=BACKFILL_LIMIT_DAYS).rev().enumerate() {
            let date = days_before(today, back);
            store.insert_checkin(CheckinRecord::new(user, date, i as i32 + 1, None)).await?;
        }
        let before = store.count_checkins(user).await?;

        assert!(matches!(
            daily_checkin(&store, user, today, true).await,
            Err(LedgerError::BackfillExhausted(BACKFILL_LIMIT_DAYS))
        ));
        assert_eq!(store.count_checkins(user).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn recent_window_is_ten_days_inclusive() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        for (level, date) in [day(2024, 4, 20), day(2024, 4, 21), day(2024, 5, 1)].into_iter().enumerate() {
            store.insert_checkin(CheckinRecord::new(user, date, level as i32 + 1, None)).await?;
        }

        let status = checkin_status(&store, user, day(2024, 5, 1)).await?;
        assert_eq!(status.all_checkins.len(), 3);
        assert_eq!(status.all_checkins[0].checkin_date, day(2024, 5, 1));
        let recent: Vec<_> = status.checkins.iter().map(|c| c.checkin_date).collect();
        assert_eq!(recent, vec![day(2024, 5, 1), day(2024, 4, 21)]);
        assert_eq!(status.next_badge_level, None);
        Ok(())
    }
}
