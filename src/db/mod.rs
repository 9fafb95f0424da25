pub mod schedule;
pub mod user;

use std::str::FromStr;

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Executor;

use crate::DbPool;

pub const SCHEMA: &str = include_str!("schema.sql");

/// Opens the database (creating the file when missing), applies the schema
/// and returns a pool. SQLite permits a single writer, so the pool is capped
/// at one connection; this also keeps `sqlite::memory:` databases alive
/// across statements, which the tests rely on.
pub async fn init_db_pool(db_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool: DbPool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    pool.execute(SCHEMA).await?;
    info!("database initialised at {db_url}");
    Ok(pool)
}
