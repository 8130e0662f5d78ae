use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row, sqlite::SqliteRow};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PlayerRecord {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub display_name: String,
    pub tier: String,
    pub rank: String,
    pub league_points: i32,
    pub wins: i32,
    pub losses: i32,
    pub last_updated: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn total_games(&self) -> i32 {
        self.wins + self.losses
    }

    /// Percentage rounded to one decimal, `0.0` without any game played.
    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.losses)
    }
}

pub fn win_rate(wins: i32, losses: i32) -> f64 {
    let total = wins + losses;
    if total <= 0 {
        return 0.0;
    }
    (wins as f64 / total as f64 * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub match_id: String,
    pub game_datetime: DateTime<Utc>,
    pub game_length: Duration,
    pub game_version: String,
    pub queue_id: i32,
    pub tft_set_number: i32,
    pub tft_set_core_name: String,
}

// game_length is stored as REAL seconds
impl<'r> FromRow<'r, SqliteRow> for MatchSummary {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let secs: f64 = row.try_get("game_length")?;
        let game_length =
            Duration::try_from_secs_f64(secs).map_err(|e| sqlx::Error::ColumnDecode {
                index: "game_length".into(),
                source: Box::new(e),
            })?;

        Ok(Self {
            match_id: row.try_get("match_id")?,
            game_datetime: row.try_get("game_datetime")?,
            game_length,
            game_version: row.try_get("game_version")?,
            queue_id: row.try_get("queue_id")?,
            tft_set_number: row.try_get("tft_set_number")?,
            tft_set_core_name: row.try_get("tft_set_core_name")?,
        })
    }
}

/// One player's board at the end of one match.
///
/// `traits` and `units` hold the JSON encoding of the Riot trait/unit lists.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ParticipantRecord {
    pub match_id: String,
    pub puuid: String,
    pub placement: i32,
    pub level: i32,
    pub gold_left: i32,
    pub last_round: i32,
    pub players_eliminated: i32,
    pub total_damage_to_players: i64,
    pub traits: String,
    pub units: String,
}

/// A match with every participant row recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecords {
    pub summary: MatchSummary,
    pub participants: Vec<ParticipantRecord>,
}

/// A participant row joined with the metadata of its match.
#[derive(Debug, Clone, FromRow)]
pub struct Participation {
    pub match_id: String,
    pub game_datetime: DateTime<Utc>,
    pub queue_id: i32,
    pub placement: i32,
    pub level: i32,
    pub gold_left: i32,
    pub last_round: i32,
    pub traits: String,
    pub units: String,
}
