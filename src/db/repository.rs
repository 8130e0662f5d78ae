use std::collections::HashSet;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::models::{MatchRecords, MatchSummary, ParticipantRecord, Participation, PlayerRecord};
use crate::error::AppError;

const PLAYER_COLUMNS: &str = "puuid, game_name, tag_line, display_name, tier, rank, \
     league_points, wins, losses, last_updated";

const MATCH_COLUMNS: &str = "match_id, game_datetime, game_length, game_version, queue_id, \
     tft_set_number, tft_set_core_name";

const PARTICIPANT_COLUMNS: &str = "match_id, puuid, placement, level, gold_left, last_round, \
     players_eliminated, total_damage_to_players, traits, units";

/// Keeps `IN (...)` lists well under SQLite's bound parameter limit.
const IN_CLAUSE_CHUNK: usize = 500;

/// Storage for players, matches and match participants.
///
/// Every write method runs inside its own transaction: an error drops the
/// transaction, which rolls back whatever the call already wrote.
#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // === Player operations ===

    /// Insert or update players keyed by puuid.
    pub async fn upsert_players(&self, players: &[PlayerRecord]) -> Result<u64, AppError> {
        if players.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for player in players {
            written += upsert_player(&mut *tx, player).await?;
        }
        tx.commit().await?;

        debug!(written, "🗄️ Players upserted");
        Ok(written)
    }

    /// Delete every stored player whose puuid is not part of `current`.
    pub async fn reconcile_players(&self, current: &HashSet<String>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let stored: Vec<String> = sqlx::query_scalar("SELECT puuid FROM players")
            .fetch_all(&mut *tx)
            .await?;

        let mut removed = 0;
        for puuid in stored.iter().filter(|p| !current.contains(*p)) {
            removed += sqlx::query("DELETE FROM players WHERE puuid = ?")
                .bind(puuid)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        debug!(removed, "🗄️ Players reconciled");
        Ok(removed)
    }

    pub async fn get_player(&self, puuid: &str) -> Result<Option<PlayerRecord>, AppError> {
        let player = sqlx::query_as::<_, PlayerRecord>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE puuid = ?"
        ))
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    pub async fn get_player_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Option<PlayerRecord>, AppError> {
        let player = sqlx::query_as::<_, PlayerRecord>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE LOWER(game_name) = LOWER(?) AND LOWER(tag_line) = LOWER(?)"
        ))
        .bind(game_name)
        .bind(tag_line)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    /// Ladder order: league points descending, then rank ascending.
    pub async fn ranking(&self) -> Result<Vec<PlayerRecord>, AppError> {
        let players = sqlx::query_as::<_, PlayerRecord>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players ORDER BY league_points DESC, rank ASC, puuid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    pub async fn player_puuids(&self) -> Result<HashSet<String>, AppError> {
        let puuids: Vec<String> = sqlx::query_scalar("SELECT puuid FROM players")
            .fetch_all(&self.pool)
            .await?;
        Ok(puuids.into_iter().collect())
    }

    // === Match operations ===

    pub async fn upsert_matches(&self, matches: &[MatchSummary]) -> Result<u64, AppError> {
        if matches.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for summary in matches {
            written += upsert_match(&mut *tx, summary).await?;
        }
        tx.commit().await?;
        Ok(written)
    }

    pub async fn upsert_participants(
        &self,
        participants: &[ParticipantRecord],
    ) -> Result<u64, AppError> {
        if participants.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for participant in participants {
            written += upsert_participant(&mut *tx, participant).await?;
        }
        tx.commit().await?;
        Ok(written)
    }

    /// Write matches together with their participants in one transaction.
    ///
    /// Returns `(matches, participants)` written.
    pub async fn store_matches(&self, matches: &[MatchRecords]) -> Result<(u64, u64), AppError> {
        if matches.is_empty() {
            return Ok((0, 0));
        }

        let mut tx = self.pool.begin().await?;
        let mut match_count = 0;
        let mut participant_count = 0;
        for records in matches {
            match_count += upsert_match(&mut *tx, &records.summary).await?;
            for participant in &records.participants {
                participant_count += upsert_participant(&mut *tx, participant).await?;
            }
        }
        tx.commit().await?;

        debug!(match_count, participant_count, "🗄️ Matches stored");
        Ok((match_count, participant_count))
    }

    pub async fn get_match(&self, match_id: &str) -> Result<Option<MatchSummary>, AppError> {
        let summary = sqlx::query_as::<_, MatchSummary>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?"
        ))
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(summary)
    }

    pub async fn match_participants(
        &self,
        match_id: &str,
    ) -> Result<Vec<ParticipantRecord>, AppError> {
        let participants = sqlx::query_as::<_, ParticipantRecord>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM match_participants WHERE match_id = ? ORDER BY placement ASC"
        ))
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(participants)
    }

    /// Most recent stored results of one player.
    pub async fn player_participations(
        &self,
        puuid: &str,
        limit: u32,
    ) -> Result<Vec<Participation>, AppError> {
        let rows = sqlx::query_as::<_, Participation>(
            r#"
            SELECT mp.match_id, m.game_datetime, m.queue_id, mp.placement, mp.level,
                   mp.gold_left, mp.last_round, mp.traits, mp.units
            FROM match_participants mp
            INNER JOIN matches m ON m.match_id = mp.match_id
            WHERE mp.puuid = ?
            ORDER BY m.game_datetime DESC
            LIMIT ?
            "#,
        )
        .bind(puuid)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Subset of `match_ids` already present in storage.
    pub async fn existing_match_ids(
        &self,
        match_ids: &[String],
    ) -> Result<HashSet<String>, AppError> {
        let mut found = HashSet::new();

        for chunk in match_ids.chunks(IN_CLAUSE_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT match_id FROM matches WHERE match_id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");

            let ids: Vec<String> = builder.build_query_scalar().fetch_all(&self.pool).await?;
            found.extend(ids);
        }

        Ok(found)
    }
}

async fn upsert_player(conn: &mut SqliteConnection, p: &PlayerRecord) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO players ({PLAYER_COLUMNS})
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(puuid) DO UPDATE SET
            game_name = excluded.game_name,
            tag_line = excluded.tag_line,
            display_name = excluded.display_name,
            tier = excluded.tier,
            rank = excluded.rank,
            league_points = excluded.league_points,
            wins = excluded.wins,
            losses = excluded.losses,
            last_updated = excluded.last_updated
        "#
    ))
    .bind(&p.puuid)
    .bind(&p.game_name)
    .bind(&p.tag_line)
    .bind(&p.display_name)
    .bind(&p.tier)
    .bind(&p.rank)
    .bind(p.league_points)
    .bind(p.wins)
    .bind(p.losses)
    .bind(p.last_updated)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

async fn upsert_match(conn: &mut SqliteConnection, m: &MatchSummary) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO matches ({MATCH_COLUMNS})
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(match_id) DO UPDATE SET
            game_datetime = excluded.game_datetime,
            game_length = excluded.game_length,
            game_version = excluded.game_version,
            queue_id = excluded.queue_id,
            tft_set_number = excluded.tft_set_number,
            tft_set_core_name = excluded.tft_set_core_name
        "#
    ))
    .bind(&m.match_id)
    .bind(m.game_datetime)
    .bind(m.game_length.as_secs_f64())
    .bind(&m.game_version)
    .bind(m.queue_id)
    .bind(m.tft_set_number)
    .bind(&m.tft_set_core_name)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

async fn upsert_participant(
    conn: &mut SqliteConnection,
    p: &ParticipantRecord,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO match_participants ({PARTICIPANT_COLUMNS})
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(match_id, puuid) DO UPDATE SET
            placement = excluded.placement,
            level = excluded.level,
            gold_left = excluded.gold_left,
            last_round = excluded.last_round,
            players_eliminated = excluded.players_eliminated,
            total_damage_to_players = excluded.total_damage_to_players,
            traits = excluded.traits,
            units = excluded.units
        "#
    ))
    .bind(&p.match_id)
    .bind(&p.puuid)
    .bind(p.placement)
    .bind(p.level)
    .bind(p.gold_left)
    .bind(p.last_round)
    .bind(p.players_eliminated)
    .bind(p.total_damage_to_players)
    .bind(&p.traits)
    .bind(&p.units)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
