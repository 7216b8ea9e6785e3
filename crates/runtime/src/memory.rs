use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Uuid;
use tokio::sync::Mutex;

use hotwheels_common::get_current_timestamp;

use crate::{
    Badge, CheckinRecord, HotwheelsModel, LedgerStore, ModelCatalog, SearchFilter, SelectedBadge,
    StoreError, UserBadge,
};

#[derive(Default)]
struct Tables {
    checkins: Vec<CheckinRecord>,
    badges: Vec<Badge>,
    grants: Vec<UserBadge>,
    selections: Vec<SelectedBadge>,
    models: Vec<HotwheelsModel>,
}

/// Process-local store with the same uniqueness rules as the Postgres schema.
/// Backs the test suites and database-free runs of the router.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    checkin_inserts: AtomicBool,
    grant_inserts: AtomicBool,
    selection_writes: AtomicBool,
    skipped_checkin_lookups: AtomicUsize,
}

impl Faults {
    fn check(flag: &AtomicBool, table: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("{} is unavailable", table)));
        }
        Ok(())
    }
}

fn now() -> i64 {
    get_current_timestamp() as i64
}

/// Fault injection for tests.
#[cfg(any(test, feature = "test-util"))]
impl MemoryStore {
    /// Every subsequent check-in insert fails with a backend error.
    pub fn fail_checkin_inserts(&self, fail: bool) {
        self.faults.checkin_inserts.store(fail, Ordering::SeqCst);
    }

    /// Every subsequent badge-grant insert fails with a backend error.
    pub fn fail_grant_inserts(&self, fail: bool) {
        self.faults.grant_inserts.store(fail, Ordering::SeqCst);
    }

    /// Every subsequent slot insert or replacement fails with a backend error.
    pub fn fail_selection_writes(&self, fail: bool) {
        self.faults.selection_writes.store(fail, Ordering::SeqCst);
    }

    /// The next `count` single-day lookups report no record, as a read racing
    /// a concurrent insert would.
    pub fn skip_checkin_lookups(&self, count: usize) {
        self.faults.skipped_checkin_lookups.store(count, Ordering::SeqCst);
    }
}

fn newest_first<T: Clone>(rows: impl DoubleEndedIterator<Item = T>, created_at: impl Fn(&T) -> i64) -> Vec<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    rows
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn list_checkins(&self, user_id: Uuid) -> Result<Vec<CheckinRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<CheckinRecord> = tables.checkins.iter().filter(|c| c.user_id == user_id).cloned().collect();
        rows.sort_by(|a, b| b.checkin_date.cmp(&a.checkin_date));
        Ok(rows)
    }

    async fn count_checkins(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.checkins.iter().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn find_checkin_on(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<CheckinRecord>, StoreError> {
        if self.faults.skipped_checkin_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(None);
        }
        let tables = self.tables.lock().await;
        Ok(tables.checkins.iter().find(|c| c.user_id == user_id && c.checkin_date == date).cloned())
    }

    async fn insert_checkin(&self, mut record: CheckinRecord) -> Result<CheckinRecord, StoreError> {
        Faults::check(&self.faults.checkin_inserts, "daily_checkins")?;
        let mut tables = self.tables.lock().await;
        if tables.checkins.iter().any(|c| c.user_id == record.user_id && c.checkin_date == record.checkin_date) {
            return Err(StoreError::UniqueViolation("daily_checkins (user_id, checkin_date)".to_string()));
        }
        record.id = Uuid::new_v4();
        record.created_at = now();
        tables.checkins.push(record.clone());
        Ok(record)
    }

    async fn list_badges(&self) -> Result<Vec<Badge>, StoreError> {
        let mut badges = self.tables.lock().await.badges.clone();
        badges.sort_by_key(|b| b.level_required);
        Ok(badges)
    }

    async fn find_badge_for_level(&self, level: i32) -> Result<Option<Badge>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.badges.iter().find(|b| b.level_required == level).cloned())
    }

    async fn insert_badge(&self, mut badge: Badge) -> Result<Badge, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.badges.iter().any(|b| b.level_required == badge.level_required) {
            return Err(StoreError::UniqueViolation("badges (level_required)".to_string()));
        }
        badge.id = Uuid::new_v4();
        tables.badges.push(badge.clone());
        Ok(badge)
    }

    async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, StoreError> {
        let tables = self.tables.lock().await;
        let grants = tables.grants.iter().filter(|g| g.user_id == user_id).cloned().collect::<Vec<_>>();
        Ok(newest_first(grants.into_iter(), |g| g.created_at))
    }

    async fn find_user_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<Option<UserBadge>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.grants.iter().find(|g| g.user_id == user_id && g.badge_id == badge_id).cloned())
    }

    async fn insert_user_badge(&self, mut grant: UserBadge) -> Result<UserBadge, StoreError> {
        Faults::check(&self.faults.grant_inserts, "user_badges")?;
        let mut tables = self.tables.lock().await;
        if tables.grants.iter().any(|g| g.user_id == grant.user_id && g.badge_id == grant.badge_id) {
            return Err(StoreError::UniqueViolation("user_badges (user_id, badge_id)".to_string()));
        }
        grant.id = Uuid::new_v4();
        grant.created_at = now();
        tables.grants.push(grant.clone());
        Ok(grant)
    }

    async fn list_selected_badges(&self, user_id: Uuid) -> Result<Vec<SelectedBadge>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<SelectedBadge> = tables.selections.iter().filter(|s| s.user_id == user_id).cloned().collect();
        rows.sort_by_key(|s| s.position);
        Ok(rows)
    }

    async fn insert_selected_badge(&self, mut selection: SelectedBadge) -> Result<SelectedBadge, StoreError> {
        Faults::check(&self.faults.selection_writes, "user_selected_badges")?;
        let mut tables = self.tables.lock().await;
        let clash = tables.selections.iter().any(|s| {
            s.user_id == selection.user_id
                && (s.position == selection.position || s.badge_id == selection.badge_id)
        });
        if clash {
            return Err(StoreError::UniqueViolation("user_selected_badges".to_string()));
        }
        selection.id = Uuid::new_v4();
        tables.selections.push(selection.clone());
        Ok(selection)
    }

    async fn replace_selected_badge(&self, mut selection: SelectedBadge) -> Result<SelectedBadge, StoreError> {
        Faults::check(&self.faults.selection_writes, "user_selected_badges")?;
        let mut tables = self.tables.lock().await;
        let shown_elsewhere = tables.selections.iter().any(|s| {
            s.user_id == selection.user_id
                && s.badge_id == selection.badge_id
                && s.position != selection.position
        });
        if shown_elsewhere {
            return Err(StoreError::UniqueViolation("user_selected_badges".to_string()));
        }
        tables.selections.retain(|s| !(s.user_id == selection.user_id && s.position == selection.position));
        selection.id = Uuid::new_v4();
        tables.selections.push(selection.clone());
        Ok(selection)
    }

    async fn delete_selected_badge(&self, user_id: Uuid, position: i32) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.selections.len();
        tables.selections.retain(|s| !(s.user_id == user_id && s.position == position));
        Ok((before - tables.selections.len()) as u64)
    }
}

#[async_trait]
impl ModelCatalog for MemoryStore {
    async fn insert_model(&self, mut model: HotwheelsModel) -> Result<HotwheelsModel, StoreError> {
        model.id = Uuid::new_v4();
        self.tables.lock().await.models.push(model.clone());
        Ok(model)
    }

    async fn search_models(
        &self,
        filter: &SearchFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<HotwheelsModel>, i64), StoreError> {
        let tables = self.tables.lock().await;
        let mut matches: Vec<HotwheelsModel> = tables.models.iter().filter(|m| filter.matches(m)).cloned().collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn checkin_day_is_unique_per_user() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        store.insert_checkin(CheckinRecord::new(alice, date, 1, None)).await?;
        store.insert_checkin(CheckinRecord::new(bob, date, 1, None)).await?;
        assert!(matches!(
            store.insert_checkin(CheckinRecord::new(alice, date, 2, None)).await,
            Err(StoreError::UniqueViolation(_))
        ));
        assert_eq!(store.count_checkins(alice).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn grants_are_unique_and_newest_first() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let first = store.insert_badge(Badge::new("One", "", 1, "common")).await?;
        let second = store.insert_badge(Badge::new("Three", "", 3, "common")).await?;

        store.insert_user_badge(UserBadge::new(user, first.id, 1)).await?;
        store.insert_user_badge(UserBadge::new(user, second.id, 3)).await?;
        assert!(matches!(
            store.insert_user_badge(UserBadge::new(user, first.id, 1)).await,
            Err(StoreError::UniqueViolation(_))
        ));

        let grants = store.list_user_badges(user).await?;
        assert_eq!(grants.iter().map(|g| g.badge_id).collect::<Vec<_>>(), vec![second.id, first.id]);
        Ok(())
    }
}
