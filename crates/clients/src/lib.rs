#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "supabase")]
mod supabase;

#[cfg(feature = "postgres")]
pub use postgres::PostgresClient;
#[cfg(feature = "supabase")]
pub use supabase::{SupabaseAuth, SupabaseAuthClient};
