use sqlx::types::Uuid;
use thiserror::Error;

use crate::{EarnedBadge, LedgerStore, SelectedBadge, StoreError};

use super::join_grants;

/// Number of profile display positions, numbered from 1.
pub const SLOT_COUNT: i32 = 5;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot must be between 1 and {}", SLOT_COUNT)]
    InvalidSlot(i32),

    #[error("badge has not been earned")]
    NotEarned,

    #[error("badge is already shown in slot {0}")]
    AlreadySelected(i32),

    #[error("all badge slots are occupied")]
    NoFreeSlot,

    #[error("slot changed concurrently, retry")]
    Conflict,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

fn validate_slot(slot: i32) -> Result<i32, SlotError> {
    if (1..=SLOT_COUNT).contains(&slot) {
        Ok(slot)
    } else {
        Err(SlotError::InvalidSlot(slot))
    }
}

/// Pins an earned badge to a display position. Without an explicit `slot`
/// the first free position is used; an occupied slot has its badge replaced.
pub async fn select_badge(
    store: &dyn LedgerStore,
    user_id: Uuid,
    badge_id: Uuid,
    slot: Option<i32>,
) -> Result<SelectedBadge, SlotError> {
    let requested = slot.map(validate_slot).transpose()?;

    if store.find_user_badge(user_id, badge_id).await?.is_none() {
        return Err(SlotError::NotEarned);
    }

    let current = store.list_selected_badges(user_id).await?;
    if let Some(shown) = current.iter().find(|s| s.badge_id == badge_id) {
        if requested == Some(shown.position) {
            return Ok(shown.clone());
        }
        return Err(SlotError::AlreadySelected(shown.position));
    }

    let position = match requested {
        Some(position) => position,
        None => (1..=SLOT_COUNT)
            .find(|p| !current.iter().any(|s| s.position == *p))
            .ok_or(SlotError::NoFreeSlot)?,
    };

    let selection = SelectedBadge::new(user_id, badge_id, position);
    let stored = if current.iter().any(|s| s.position == position) {
        store.replace_selected_badge(selection).await
    } else {
        store.insert_selected_badge(selection).await
    };

    match stored {
        Ok(selection) => {
            tracing::info!("[select_badge] user {} pinned badge {} to slot {}", user_id, badge_id, position);
            Ok(selection)
        }
        Err(StoreError::UniqueViolation(_)) => Err(SlotError::Conflict),
        Err(e) => Err(e.into()),
    }
}

/// Clears a display position. Returns whether a badge was removed.
pub async fn remove_badge(store: &dyn LedgerStore, user_id: Uuid, slot: i32) -> Result<bool, SlotError> {
    let slot = validate_slot(slot)?;
    let removed = store.delete_selected_badge(user_id, slot).await?;
    Ok(removed > 0)
}

/// Every badge the user holds, newest grant first.
pub async fn list_earned_badges(store: &dyn LedgerStore, user_id: Uuid) -> Result<Vec<EarnedBadge>, StoreError> {
    let catalog = store.list_badges().await?;
    let grants = store.list_user_badges(user_id).await?;
    Ok(join_grants(grants, &catalog))
}
