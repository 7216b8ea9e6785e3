mod search;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use strum_macros::{Display, EnumString};
use hotwheels_database::SqlxObject;

use crate::{ModelCatalog, StoreError};

pub use search::{
    ilike_pattern, search_models, SearchColumn, SearchFilter, SearchPage, SearchQuery, SearchTerm,
    PAGE_SIZE,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Display, EnumString, Default)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ModelRarity {
    #[default]
    Regular,
    #[serde(rename = "TH")]
    #[strum(serialize = "TH")]
    TreasureHunt,
    #[serde(rename = "STH")]
    #[strum(serialize = "STH")]
    SuperTreasureHunt,
    Chase,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, SqlxObject)]
#[table_name = "hotwheels"]
pub struct HotwheelsModel {
    pub id: Uuid,

    #[indexed]
    pub name: String,
    pub series: String,
    pub year: i32,
    pub rarity: ModelRarity,
    pub image_url: Option<String>,
}

impl HotwheelsModel {
    pub fn new(name: &str, series: &str, year: i32, rarity: ModelRarity) -> Self {
        Self {
            id: Uuid::nil(),
            name: name.to_string(),
            series: series.to_string(),
            year,
            rarity,
            image_url: None,
        }
    }
}

/// Inserts `models` when the catalog is still empty. Returns how many were added.
pub async fn seed_catalog(catalog: &dyn ModelCatalog, models: Vec<HotwheelsModel>) -> Result<usize, StoreError> {
    let (_, total) = catalog.search_models(&SearchFilter::default(), 1, 0).await?;
    if total > 0 {
        tracing::info!("[seed_catalog] catalog already holds {} models", total);
        return Ok(0);
    }

    let count = models.len();
    for model in models {
        catalog.insert_model(model).await?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rarity_text_form() {
        assert_eq!(ModelRarity::SuperTreasureHunt.to_string(), "STH");
        assert_eq!(ModelRarity::TreasureHunt.to_string(), "TH");
        assert_eq!(ModelRarity::Chase.to_string(), "CHASE");
        assert_eq!(ModelRarity::Regular.to_string(), "REGULAR");
        assert_eq!(ModelRarity::from_str("CHASE").unwrap(), ModelRarity::Chase);
        assert_eq!(serde_json::to_value(ModelRarity::SuperTreasureHunt).unwrap(), "STH");
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_catalog() -> Result<(), anyhow::Error> {
        let store = crate::MemoryStore::default();
        let models = || vec![
            HotwheelsModel::new("Twin Mill", "HW Legends", 2022, ModelRarity::TreasureHunt),
            HotwheelsModel::new("Bone Shaker", "HW Legends", 2021, ModelRarity::Regular),
        ];

        assert_eq!(seed_catalog(&store, models()).await?, 2);
        assert_eq!(seed_catalog(&store, models()).await?, 0);
        let (_, total) = store.search_models(&SearchFilter::default(), 10, 0).await?;
        assert_eq!(total, 2);
        Ok(())
    }
}
