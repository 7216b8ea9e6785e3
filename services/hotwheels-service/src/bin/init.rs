use anyhow::Result;

use hotwheels_clients::PostgresClient;
use hotwheels_runtime::{seed_catalog, Badge, HotwheelsModel, LedgerStore, ModelRarity, StoreError};
use hotwheels_service_api::setup_tracing;

const DEFAULT_BADGES: &[(i32, &str, &str, &str)] = &[
    (1, "First Spin", "Checked in for the first time", "common"),
    (3, "Warm Tires", "Three days on the track", "common"),
    (7, "Weekly Hunter", "A full week of check-ins", "rare"),
    (12, "Pegwarmer Patrol", "Twelve days of hunting", "rare"),
    (19, "Treasure Seeker", "Nineteen days without giving up", "epic"),
    (26, "Super Hunter", "Twenty-six days of dedication", "epic"),
    (33, "Legend of the Pegs", "Thirty-three days in the hunt", "legendary"),
];

const STARTER_MODELS: &[(&str, &str, i32, ModelRarity)] = &[
    ("'67 Camaro", "HW Dream Garage", 2023, ModelRarity::Regular),
    ("Twin Mill", "HW Legends", 2022, ModelRarity::TreasureHunt),
    ("Bone Shaker", "HW Legends", 2021, ModelRarity::SuperTreasureHunt),
    ("Nissan Skyline GT-R (R34)", "HW J-Imports", 2024, ModelRarity::Regular),
    ("'55 Chevy Bel Air Gasser", "HW Drag Strip", 2020, ModelRarity::SuperTreasureHunt),
    ("Deora II", "HW Surf's Up", 2022, ModelRarity::Chase),
    ("Rodger Dodger", "Muscle Mania", 2019, ModelRarity::TreasureHunt),
    ("Custom '69 Volkswagen Squareback", "HW Classics", 2023, ModelRarity::Regular),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let db = PostgresClient::setup_with_tables(false).await?;

    let existing = db.list_badges().await?;
    for (level, name, description, rarity) in DEFAULT_BADGES {
        if existing.iter().any(|b| b.level_required == *level) {
            tracing::info!("[init] badge for level {} already present", level);
            continue;
        }

        match db.insert_badge(Badge::new(name, description, *level, rarity)).await {
            Ok(badge) => tracing::info!("[init] created badge '{}' for level {}", badge.name, level),
            Err(StoreError::UniqueViolation(_)) => tracing::info!("[init] badge for level {} created concurrently", level),
            Err(e) => return Err(e.into()),
        }
    }

    let models = STARTER_MODELS
        .iter()
        .map(|(name, series, year, rarity)| HotwheelsModel::new(name, series, *year, *rarity))
        .collect();
    let added = seed_catalog(&db, models).await?;
    tracing::info!("[init] added {} starter models to the catalog", added);

    tracing::info!("[init] database ready");
    Ok(())
}
