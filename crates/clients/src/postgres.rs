use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Uuid;
use sqlx::PgPool;

use hotwheels_common::{define_module_client, ModuleClient};
use hotwheels_database::{init_databases, OrderDirection, QueryCriteria, SqlxCrud, SqlxFilterQuery};
use hotwheels_runtime::{
    ilike_pattern, Badge, CheckinRecord, HotwheelsModel, LedgerStore, ModelCatalog, SearchFilter,
    SelectedBadge, StoreError, UserBadge,
};

// Referenced tables first.
init_databases!(
    default: [
        hotwheels_runtime::Badge,
        hotwheels_runtime::HotwheelsModel,
        hotwheels_runtime::CheckinRecord,
        hotwheels_runtime::UserBadge,
        hotwheels_runtime::SelectedBadge,
    ]
);

define_module_client! {
    (struct PostgresClient, "postgres")
    client_type: &'static PgPool,
    env: ["DATABASE_URL"],
    setup: async {
        connect(false, false).await
    }
}

impl PostgresClient {
    /// Connects and makes sure every table and index exists, optionally dropping them first.
    pub async fn setup_with_tables(drop_tables: bool) -> anyhow::Result<Self> {
        Self::validate_env()?;
        let pool = connect(drop_tables, true).await?;
        Ok(Self::from_client(pool))
    }

    fn pool(&self) -> &'static PgPool {
        **self.get_client()
    }
}

fn by_user(user_id: Uuid) -> QueryCriteria {
    QueryCriteria::new().add_valued_filter("user_id", "=", user_id)
}

#[async_trait]
impl LedgerStore for PostgresClient {
    async fn list_checkins(&self, user_id: Uuid) -> Result<Vec<CheckinRecord>, StoreError> {
        let criteria = by_user(user_id).order_by("checkin_date", OrderDirection::Desc);
        Ok(CheckinRecord::find_by_criteria(criteria, self.pool()).await?)
    }

    async fn count_checkins(&self, user_id: Uuid) -> Result<i64, StoreError> {
        Ok(CheckinRecord::count_by_criteria(by_user(user_id), self.pool()).await?)
    }

    async fn find_checkin_on(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<CheckinRecord>, StoreError> {
        let criteria = by_user(user_id).add_valued_filter("checkin_date", "=", date);
        Ok(CheckinRecord::find_one_by_criteria(criteria, self.pool()).await?)
    }

    async fn insert_checkin(&self, record: CheckinRecord) -> Result<CheckinRecord, StoreError> {
        Ok(record.create(self.pool()).await?)
    }

    async fn list_badges(&self) -> Result<Vec<Badge>, StoreError> {
        let criteria = QueryCriteria::new().order_by("level_required", OrderDirection::Asc);
        Ok(Badge::find_by_criteria(criteria, self.pool()).await?)
    }

    async fn find_badge_for_level(&self, level: i32) -> Result<Option<Badge>, StoreError> {
        let criteria = QueryCriteria::new().add_valued_filter("level_required", "=", level);
        Ok(Badge::find_one_by_criteria(criteria, self.pool()).await?)
    }

    async fn insert_badge(&self, badge: Badge) -> Result<Badge, StoreError> {
        Ok(badge.create(self.pool()).await?)
    }

    async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, StoreError> {
        let criteria = by_user(user_id).order_by("created_at", OrderDirection::Desc);
        Ok(UserBadge::find_by_criteria(criteria, self.pool()).await?)
    }

    async fn find_user_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<Option<UserBadge>, StoreError> {
        let criteria = by_user(user_id).add_valued_filter("badge_id", "=", badge_id);
        Ok(UserBadge::find_one_by_criteria(criteria, self.pool()).await?)
    }

    async fn insert_user_badge(&self, grant: UserBadge) -> Result<UserBadge, StoreError> {
        Ok(grant.create(self.pool()).await?)
    }

    async fn list_selected_badges(&self, user_id: Uuid) -> Result<Vec<SelectedBadge>, StoreError> {
        let criteria = by_user(user_id).order_by("position", OrderDirection::Asc);
        Ok(SelectedBadge::find_by_criteria(criteria, self.pool()).await?)
    }

    async fn insert_selected_badge(&self, selection: SelectedBadge) -> Result<SelectedBadge, StoreError> {
        Ok(selection.create(self.pool()).await?)
    }

    async fn replace_selected_badge(&self, selection: SelectedBadge) -> Result<SelectedBadge, StoreError> {
        let mut tx = self.pool().begin().await?;
        let criteria = by_user(selection.user_id).add_valued_filter("position", "=", selection.position);
        SelectedBadge::delete_by_criteria(criteria, &mut *tx).await?;
        // Dropping the transaction on error rolls the delete back.
        let stored = selection.create(&mut *tx).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn delete_selected_badge(&self, user_id: Uuid, position: i32) -> Result<u64, StoreError> {
        let criteria = by_user(user_id).add_valued_filter("position", "=", position);
        Ok(SelectedBadge::delete_by_criteria(criteria, self.pool()).await?)
    }
}

fn search_criteria(filter: &SearchFilter) -> QueryCriteria {
    let mut criteria = QueryCriteria::new();
    if let Some(rarity) = filter.rarity {
        criteria = criteria.add_valued_filter("rarity", "=", rarity.to_string());
    }
    criteria.add_any_filter(
        filter.any_of
            .iter()
            .map(|term| (term.column.as_column(), "ILIKE", ilike_pattern(&term.text)))
            .collect(),
    )
}

#[async_trait]
impl ModelCatalog for PostgresClient {
    async fn insert_model(&self, model: HotwheelsModel) -> Result<HotwheelsModel, StoreError> {
        Ok(model.create(self.pool()).await?)
    }

    async fn search_models(
        &self,
        filter: &SearchFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<HotwheelsModel>, i64), StoreError> {
        let total = HotwheelsModel::count_by_criteria(search_criteria(filter), self.pool()).await?;
        let page_criteria = search_criteria(filter)
            .order_by("name", OrderDirection::Asc)
            .limit(limit)
            .offset(offset);
        let items = HotwheelsModel::find_by_criteria(page_criteria, self.pool()).await?;
        Ok((items, total))
    }
}
