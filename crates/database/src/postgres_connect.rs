/// Initializes the database connection pool for the application.
///
/// Generates `async fn connect(drop_tables: bool, create_tables: bool) -> anyhow::Result<&'static PgPool>`.
/// Types are dropped in reverse order and created in the listed order, so list
/// referenced tables before the tables holding foreign keys to them.
///
/// # Example
/// ```rust,ignore
/// init_databases!(
///     default: [Badge, CheckinRecord]
/// );
///
/// let pool = connect(false, true).await?;
/// ```
#[macro_export]
macro_rules! init_databases {
    (
        default: [$($default_type:ty),* $(,)?]
    ) => {
        static POOL: tokio::sync::OnceCell<sqlx::PgPool> = tokio::sync::OnceCell::const_new();

        async fn connect(drop_tables: bool, create_tables: bool) -> anyhow::Result<&'static sqlx::PgPool> {
            POOL.get_or_try_init(|| async {
                let env = <$crate::DatabaseEnv as ::hotwheels_common::EnvVars>::load()?;

                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(env.max_connections)
                    .connect(&env.database_url)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to connect to database: {}", e))?;

                if drop_tables {
                    let mut drop_statements: Vec<(&'static str, String)> = Vec::new();
                    $(
                        drop_statements.push((
                            stringify!($default_type),
                            <$default_type as $crate::SqlxSchema>::drop_table_sql(),
                        ));
                    )*
                    for (type_name, statement) in drop_statements.into_iter().rev() {
                        if let Err(e) = sqlx::query(&statement).execute(&pool).await {
                            tracing::warn!("[init_databases] failed to drop table for '{}': {:?}", type_name, e);
                        }
                    }
                }

                if create_tables {
                    $(
                        let create_table_sql_str = <$default_type as $crate::SqlxSchema>::create_table_sql();
                        sqlx::query(&create_table_sql_str).execute(&pool).await
                            .map_err(|e| anyhow::anyhow!("failed to create table for '{}': {}", stringify!($default_type), e))?;

                        for index_sql in <$default_type as $crate::SqlxSchema>::INDEXES_SQL {
                            sqlx::query(index_sql).execute(&pool).await
                                .map_err(|e| anyhow::anyhow!("failed to create index for '{}' ({}): {}", stringify!($default_type), index_sql, e))?;
                        }
                    )*
                    tracing::info!("[init_databases] tables ready");
                }

                Ok::<_, anyhow::Error>(pool)
            }).await
        }
    };
}
