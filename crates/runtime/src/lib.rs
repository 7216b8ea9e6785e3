mod badge;
mod catalog;
mod checkin;
mod identity;
mod memory;
mod store;

pub use badge::{
    list_earned_badges, remove_badge, select_badge, Badge, EarnedBadge, SelectedBadge,
    SelectedBadgeView, SlotError, UserBadge, SLOT_COUNT,
};
pub use catalog::{
    ilike_pattern, search_models, seed_catalog, HotwheelsModel, ModelRarity, SearchColumn, SearchFilter,
    SearchPage, SearchQuery, SearchTerm, PAGE_SIZE,
};
pub use checkin::{
    checkin_status, daily_checkin, should_award_badge, CheckinOutcome, CheckinRecord,
    CheckinStatus, LedgerError, BACKFILL_LIMIT_DAYS, RECENT_WINDOW_DAYS,
};
pub use identity::{AuthError, AuthenticatedUser, IdentityProvider};
pub use memory::MemoryStore;
pub use store::{LedgerStore, ModelCatalog, StoreError};
