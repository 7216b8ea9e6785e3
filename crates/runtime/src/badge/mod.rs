mod slots;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use hotwheels_database::SqlxObject;

pub use slots::{list_earned_badges, remove_badge, select_badge, SlotError, SLOT_COUNT};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, SqlxObject)]
#[table_name = "badges"]
pub struct Badge {
    pub id: Uuid,

    pub name: String,
    pub description: String,
    pub image_url: Option<String>,

    #[unique]
    pub level_required: i32,
    pub rarity: String,
}

impl Badge {
    pub fn new(name: &str, description: &str, level_required: i32, rarity: &str) -> Self {
        Self {
            id: Uuid::nil(),
            name: name.to_string(),
            description: description.to_string(),
            image_url: None,
            level_required,
            rarity: rarity.to_string(),
        }
    }
}

/// A badge grant. Written once when the level is reached.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, SqlxObject)]
#[table_name = "user_badges"]
#[unique_together(user_id, badge_id)]
pub struct UserBadge {
    pub id: Uuid,

    #[indexed]
    pub user_id: Uuid,

    #[foreign_key(referenced_table = "badges", related_rust_type = "Badge")]
    pub badge_id: Uuid,
    pub level_earned: i32,

    pub created_at: i64,
}

impl UserBadge {
    pub fn new(user_id: Uuid, badge_id: Uuid, level_earned: i32) -> Self {
        Self { id: Uuid::nil(), user_id, badge_id, level_earned, created_at: 0 }
    }
}

/// A badge pinned to one of the profile display positions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, SqlxObject)]
#[table_name = "user_selected_badges"]
#[unique_together(user_id, position)]
#[unique_together(user_id, badge_id)]
pub struct SelectedBadge {
    pub id: Uuid,

    #[indexed]
    pub user_id: Uuid,

    #[foreign_key(referenced_table = "badges", related_rust_type = "Badge")]
    pub badge_id: Uuid,
    pub position: i32,
}

impl SelectedBadge {
    pub fn new(user_id: Uuid, badge_id: Uuid, position: i32) -> Self {
        Self { id: Uuid::nil(), user_id, badge_id, position }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EarnedBadge {
    pub id: Uuid,
    pub badge_id: Uuid,
    pub level_earned: i32,
    pub earned_at: i64,
    pub badge: Option<Badge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedBadgeView {
    pub position: i32,
    pub badge_id: Uuid,
    pub badge: Option<Badge>,
}

pub(crate) fn catalog_by_id(catalog: &[Badge]) -> HashMap<Uuid, &Badge> {
    catalog.iter().map(|b| (b.id, b)).collect()
}

pub(crate) fn join_grants(grants: Vec<UserBadge>, catalog: &[Badge]) -> Vec<EarnedBadge> {
    let by_id = catalog_by_id(catalog);
    grants
        .into_iter()
        .map(|grant| EarnedBadge {
            id: grant.id,
            badge_id: grant.badge_id,
            level_earned: grant.level_earned,
            earned_at: grant.created_at,
            badge: by_id.get(&grant.badge_id).map(|b| (*b).clone()),
        })
        .collect()
}

pub(crate) fn join_selections(selections: Vec<SelectedBadge>, catalog: &[Badge]) -> Vec<SelectedBadgeView> {
    let by_id = catalog_by_id(catalog);
    selections
        .into_iter()
        .map(|selection| SelectedBadgeView {
            position: selection.position,
            badge_id: selection.badge_id,
            badge: by_id.get(&selection.badge_id).map(|b| (*b).clone()),
        })
        .collect()
}
