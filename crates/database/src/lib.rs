mod env;
mod postgres_connect;
mod sqlx_postgres;

pub use env::DatabaseEnv;
pub use hotwheels_db_macros::SqlxObject;
pub use sqlx_postgres::*;
