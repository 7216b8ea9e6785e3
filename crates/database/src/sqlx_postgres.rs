use sqlx::{postgres::PgArguments, Arguments, Error as SqlxError, Executor, FromRow, Postgres};

/// Trait to define the schema of a database object for PostgreSQL.
pub trait SqlxSchema: Send + Sync + Unpin + Clone + std::fmt::Debug {
    /// The type of the primary key for this database object.
    type Id: Send + Sync + for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Clone;

    /// The intermediate type that implements FromRow, used for fetching from the database.
    type Row: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin;

    const TABLE_NAME: &'static str;
    const ID_COLUMN_NAME: &'static str;
    const COLUMNS: &'static [&'static str];
    const INDEXES_SQL: &'static [&'static str];

    fn table_name() -> &'static str { Self::TABLE_NAME }
    fn columns() -> &'static [&'static str] { Self::COLUMNS }

    /// Quoted, comma separated column list used by every SELECT and RETURNING clause.
    fn select_columns_sql() -> String {
        Self::COLUMNS
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Retrieves the value of the primary key for an instance of the object.
    fn get_id_value(&self) -> Self::Id;

    /// Converts the intermediate Row type to the Self type.
    fn from_row(row: Self::Row) -> Self;

    // SQL generation methods (implemented by the derive macro)
    fn create_table_sql() -> String;
    fn drop_table_sql() -> String;
    fn insert_sql() -> String;
}

/// Insert support for append-only records.
#[async_trait::async_trait]
pub trait SqlxCrud: SqlxSchema + Sized {
    /// Binds the struct fields to the insert query, in `insert_sql` column order.
    fn bind_insert<'q>(&self, query: sqlx::query::QueryAs<'q, Postgres, Self::Row, PgArguments>)
        -> sqlx::query::QueryAs<'q, Postgres, Self::Row, PgArguments>;

    /// Creates a new record and returns the stored row, including database defaults.
    async fn create<'e, E>(self, executor: E) -> Result<Self, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
        Self: Send,
    {
        let sql = Self::insert_sql();
        self.bind_insert(sqlx::query_as::<_, Self::Row>(&sql))
            .fetch_one(executor)
            .await
            .map(Self::from_row)
    }
}

/// Specifies the direction for ordering query results.
#[derive(Debug, Clone, Copy)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

// --- Filtering Structures and Trait ---

/// A trait to allow for boxing of different types that can be encoded as sqlx arguments.
pub trait AsSqlxArg: Send + Sync {
    fn add_to_args(&self, args: &mut PgArguments) -> Result<(), SqlxError>;
}

impl<T> AsSqlxArg for T
where
    T: for<'a> sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
{
    fn add_to_args(&self, args: &mut PgArguments) -> Result<(), SqlxError> {
        args.add(self.clone()).map_err(SqlxError::Encode)
    }
}

/// Represents a single filter condition for a database query.
pub struct FilterCondition {
    pub column: &'static str,
    pub operator: &'static str,
    /// Holds the value for the condition's placeholder, if any.
    pub value: Option<Box<dyn AsSqlxArg>>,
}

impl FilterCondition {
    fn render(&self, arguments: &mut PgArguments, placeholder_idx: &mut usize) -> Result<String, SqlxError> {
        let mut sql = format!("\"{}\" {}", self.column, self.operator);
        if let Some(value) = &self.value {
            value.add_to_args(arguments)?;
            sql.push_str(&format!(" ${}", placeholder_idx));
            *placeholder_idx += 1;
        }
        Ok(sql)
    }
}

/// Represents the complete criteria for a filtered database query.
///
/// `conditions` are joined with AND. Each entry of `any_of` is a group of
/// conditions joined with OR and the group as a whole is AND-ed with the rest.
#[derive(Default)]
pub struct QueryCriteria {
    pub conditions: Vec<FilterCondition>,
    pub any_of: Vec<Vec<FilterCondition>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Vec<(&'static str, OrderDirection)>,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter condition that may or may not have a value.
    pub fn add_filter<V>(mut self, column: &'static str, operator: &'static str, value: Option<V>) -> Self
    where
        V: for<'a> ::sqlx::Encode<'a, Postgres> + ::sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
    {
        self.conditions.push(FilterCondition {
            column,
            operator,
            value: value.map(|v| Box::new(v) as Box<dyn AsSqlxArg>),
        });
        self
    }

    pub fn add_valued_filter<V>(self, column: &'static str, operator: &'static str, value: V) -> Self
    where
        V: for<'a> ::sqlx::Encode<'a, Postgres> + ::sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
    {
        self.add_filter(column, operator, Some(value))
    }

    /// Adds a group of alternatives; a row matches the group when any one of them holds.
    /// An empty group is ignored.
    pub fn add_any_filter<V>(mut self, alternatives: Vec<(&'static str, &'static str, V)>) -> Self
    where
        V: for<'a> ::sqlx::Encode<'a, Postgres> + ::sqlx::Type<Postgres> + Send + Sync + Clone + 'static,
    {
        let group = alternatives
            .into_iter()
            .map(|(column, operator, value)| FilterCondition {
                column,
                operator,
                value: Some(Box::new(value) as Box<dyn AsSqlxArg>),
            })
            .collect::<Vec<_>>();
        if !group.is_empty() {
            self.any_of.push(group);
        }
        self
    }

    pub fn limit(mut self, limit_val: i64) -> Self {
        self.limit = Some(limit_val);
        self
    }

    pub fn offset(mut self, offset_val: i64) -> Self {
        self.offset = Some(offset_val);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: OrderDirection) -> Self {
        self.order_by.push((column, direction));
        self
    }

    fn where_clause(&self, arguments: &mut PgArguments, placeholder_idx: &mut usize) -> Result<Option<String>, SqlxError> {
        let mut clauses = Vec::new();
        for condition in &self.conditions {
            clauses.push(condition.render(arguments, placeholder_idx)?);
        }
        for group in &self.any_of {
            let mut alternatives = Vec::with_capacity(group.len());
            for condition in group {
                alternatives.push(condition.render(arguments, placeholder_idx)?);
            }
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }

        if clauses.is_empty() {
            Ok(None)
        } else {
            Ok(Some(format!("WHERE {}", clauses.join(" AND "))))
        }
    }

    /// Builds `SELECT <columns> FROM <table> [WHERE] [ORDER BY] [LIMIT] [OFFSET]`.
    pub fn select_sql(&self, table: &str, columns: &str) -> Result<(String, PgArguments), SqlxError> {
        let mut arguments = PgArguments::default();
        let mut placeholder_idx = 1;
        let mut parts = vec![format!("SELECT {} FROM \"{}\"", columns, table)];

        if let Some(where_sql) = self.where_clause(&mut arguments, &mut placeholder_idx)? {
            parts.push(where_sql);
        }

        if !self.order_by.is_empty() {
            let order_clauses = self.order_by
                .iter()
                .map(|(col, dir)| format!("\"{}\" {}", col, dir.as_sql()))
                .collect::<Vec<_>>();
            parts.push(format!("ORDER BY {}", order_clauses.join(", ")));
        }

        if let Some(limit_val) = self.limit {
            arguments.add(limit_val).map_err(SqlxError::Encode)?;
            parts.push(format!("LIMIT ${}", placeholder_idx));
            placeholder_idx += 1;
        }

        if let Some(offset_val) = self.offset {
            arguments.add(offset_val).map_err(SqlxError::Encode)?;
            parts.push(format!("OFFSET ${}", placeholder_idx));
        }

        Ok((parts.join(" "), arguments))
    }

    /// Builds `SELECT COUNT(*)` over the filters; ordering and paging are ignored.
    pub fn count_sql(&self, table: &str) -> Result<(String, PgArguments), SqlxError> {
        let mut arguments = PgArguments::default();
        let mut placeholder_idx = 1;
        let mut sql = format!("SELECT COUNT(*) FROM \"{}\"", table);
        if let Some(where_sql) = self.where_clause(&mut arguments, &mut placeholder_idx)? {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        Ok((sql, arguments))
    }

    pub fn delete_sql(&self, table: &str) -> Result<(String, PgArguments), SqlxError> {
        let mut arguments = PgArguments::default();
        let mut placeholder_idx = 1;
        let mut sql = format!("DELETE FROM \"{}\"", table);
        if let Some(where_sql) = self.where_clause(&mut arguments, &mut placeholder_idx)? {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        Ok((sql, arguments))
    }
}

/// Trait for finding, counting and deleting records based on dynamic filter criteria.
#[async_trait::async_trait]
pub trait SqlxFilterQuery: SqlxSchema + Sized {
    async fn find_by_criteria<'e, E>(
        criteria: QueryCriteria,
        executor: E,
    ) -> Result<Vec<Self>, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
        Self: Send,
    {
        let (sql, arguments) = criteria.select_sql(Self::TABLE_NAME, &Self::select_columns_sql())?;
        let rows = sqlx::query_as_with::<_, Self::Row, _>(&sql, arguments)
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Finds a single optional record. Adds `LIMIT 1` unless the criteria already set a limit.
    async fn find_one_by_criteria<'e, E>(
        mut criteria: QueryCriteria,
        executor: E,
    ) -> Result<Option<Self>, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
        Self: Send,
    {
        if criteria.limit.is_none() {
            criteria = criteria.limit(1);
        };
        let mut results = Self::find_by_criteria(criteria, executor).await?;
        Ok(results.pop())
    }

    async fn count_by_criteria<'e, E>(
        criteria: QueryCriteria,
        executor: E,
    ) -> Result<i64, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
        Self: Send,
    {
        let (sql, arguments) = criteria.count_sql(Self::TABLE_NAME)?;
        sqlx::query_scalar_with::<_, i64, _>(&sql, arguments)
            .fetch_one(executor)
            .await
    }

    async fn delete_by_criteria<'e, E>(
        criteria: QueryCriteria,
        executor: E,
    ) -> Result<u64, SqlxError>
    where
        E: Executor<'e, Database = Postgres> + Send,
        Self: Send,
    {
        let (sql, arguments) = criteria.delete_sql(Self::TABLE_NAME)?;
        sqlx::query_with(&sql, arguments)
            .execute(executor)
            .await
            .map(|done| done.rows_affected())
    }
}

/// True when the database rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &SqlxError) -> bool {
    match err {
        SqlxError::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
