use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    puuid TEXT PRIMARY KEY NOT NULL,
    game_name TEXT NOT NULL,
    tag_line TEXT NOT NULL,
    display_name TEXT NOT NULL,
    tier TEXT NOT NULL,
    rank TEXT NOT NULL,
    league_points INTEGER NOT NULL,
    wins INTEGER NOT NULL,
    losses INTEGER NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT PRIMARY KEY NOT NULL,
    game_datetime TEXT NOT NULL,
    game_length REAL NOT NULL,
    game_version TEXT NOT NULL,
    queue_id INTEGER NOT NULL,
    tft_set_number INTEGER NOT NULL,
    tft_set_core_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS match_participants (
    match_id TEXT NOT NULL,
    puuid TEXT NOT NULL,
    placement INTEGER NOT NULL,
    level INTEGER NOT NULL,
    gold_left INTEGER NOT NULL,
    last_round INTEGER NOT NULL,
    players_eliminated INTEGER NOT NULL,
    total_damage_to_players INTEGER NOT NULL,
    traits TEXT NOT NULL,
    units TEXT NOT NULL,
    PRIMARY KEY (match_id, puuid),
    FOREIGN KEY (match_id) REFERENCES matches(match_id)
);

CREATE INDEX IF NOT EXISTS idx_players_riot_id ON players(game_name, tag_line);
CREATE INDEX IF NOT EXISTS idx_players_league_points ON players(league_points DESC);
CREATE INDEX IF NOT EXISTS idx_match_participants_puuid ON match_participants(puuid);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
