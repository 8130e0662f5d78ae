mod migrations;
mod models;
mod repository;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

pub use migrations::run_migrations;
pub use models::{
    MatchRecords, MatchSummary, ParticipantRecord, Participation, PlayerRecord, win_rate,
};
pub use repository::Repository;

use crate::error::AppError;

const MAX_CONNECTIONS: u32 = 5;

/// Open a pool on `database_url`, creating the database file if needed.
///
/// An in-memory database only lives as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    debug!(database_url, "🗄️ Opening database");

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?
    };

    Ok(pool)
}
