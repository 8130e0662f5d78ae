use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::AppState;
use crate::db::{Participation, PlayerRecord};
use crate::error::AppError;
use crate::ingest::{
    RIOT_ID_SEPARATOR, decode_traits, decode_units, partition_results, participant_for,
    run_batched,
};
use crate::riot::{TraitDto, UnitDto};

const MISSING_QUERY: &str = "enter a summoner name";
const MISSING_TAG: &str = "enter both name and tag (e.g. Hide on bush#KR1)";

#[derive(Debug, Serialize)]
pub struct RankingEntry {
    #[serde(flatten)]
    pub player: PlayerRecord,
    pub total_games: i32,
    pub win_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Stored,
    Live,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    /// Ladder row when the player is on the stored leaderboard.
    pub ranked: Option<PlayerRecord>,
    pub source: MatchSource,
    pub matches: Vec<MatchView>,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    pub match_id: String,
    pub game_datetime: DateTime<Utc>,
    pub queue_id: i32,
    pub placement: i32,
    pub level: i32,
    pub gold_left: i32,
    pub last_round: i32,
    pub traits: Vec<TraitDto>,
    pub units: Vec<UnitDto>,
}

impl TryFrom<Participation> for MatchView {
    type Error = AppError;

    fn try_from(row: Participation) -> Result<Self, Self::Error> {
        let decode = |source| AppError::Decode {
            endpoint: format!("stored participant of {}", row.match_id),
            source,
        };

        Ok(Self {
            traits: decode_traits(&row.traits).map_err(decode)?,
            units: decode_units(&row.units).map_err(decode)?,
            match_id: row.match_id,
            game_datetime: row.game_datetime,
            queue_id: row.queue_id,
            placement: row.placement,
            level: row.level,
            gold_left: row.gold_left,
            last_round: row.last_round,
        })
    }
}

/// Split a `Name#Tag` query into its trimmed parts.
pub fn parse_riot_id(query: &str) -> Result<(String, String), AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRiotId(MISSING_QUERY.into()));
    }

    match query.split_once(RIOT_ID_SEPARATOR) {
        Some((name, tag)) if !name.trim().is_empty() && !tag.trim().is_empty() => {
            Ok((name.trim().to_string(), tag.trim().to_string()))
        }
        _ => Err(AppError::InvalidRiotId(MISSING_TAG.into())),
    }
}

pub async fn ranking(
    State(state): State<AppState>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let players = state.db.ranking().await?;

    let entries = players
        .into_iter()
        .map(|player| RankingEntry {
            total_games: player.total_games(),
            win_rate: player.win_rate(),
            player,
        })
        .collect();

    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let (game_name, tag_line) = parse_riot_id(&params.q)?;

    let ranked = state.db.get_player_by_riot_id(&game_name, &tag_line).await?;

    let (puuid, game_name, tag_line) = match &ranked {
        Some(player) => (
            player.puuid.clone(),
            player.game_name.clone(),
            player.tag_line.clone(),
        ),
        None => {
            let account = state
                .riot
                .get_account_by_riot_id(&game_name, &tag_line)
                .await?;
            (
                account.puuid,
                account.game_name.unwrap_or(game_name),
                account.tag_line.unwrap_or(tag_line),
            )
        }
    };

    let stored = state
        .db
        .player_participations(&puuid, state.search_match_count)
        .await?;

    let (source, matches) = if stored.is_empty() {
        (MatchSource::Live, live_matches(&state, &puuid).await?)
    } else {
        let views = stored
            .into_iter()
            .map(MatchView::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        (MatchSource::Stored, views)
    };

    debug!(%puuid, ?source, count = matches.len(), "🔎 Search resolved");

    Ok(Json(SearchResponse {
        puuid,
        game_name,
        tag_line,
        ranked,
        source,
        matches,
    }))
}

/// Latest matches of `puuid` fetched straight from the API.
async fn live_matches(state: &AppState, puuid: &str) -> Result<Vec<MatchView>, AppError> {
    let match_ids = state
        .riot
        .get_match_ids(puuid, state.search_match_count)
        .await?;

    let details = run_batched(
        match_ids.iter().map(|id| state.riot.get_match(id)),
        &state.batch,
        |_| {},
    )
    .await;

    let (dtos, failures) = partition_results(details);
    for e in &failures {
        warn!(error = %e, "🔎 ⚠️ Match fetch failed");
    }

    let mut views = Vec::with_capacity(dtos.len());
    for dto in dtos {
        let match_id = dto.metadata.match_id.as_str();

        let row = match participant_for(&dto, puuid) {
            Ok(Some(row)) => row,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, match_id, "🔎 ⚠️ Match skipped");
                continue;
            }
        };

        let Some(game_datetime) = DateTime::<Utc>::from_timestamp_millis(dto.info.game_datetime)
        else {
            warn!(match_id, "🔎 ⚠️ Match has an invalid timestamp");
            continue;
        };

        views.push(MatchView::try_from(Participation {
            match_id: row.match_id,
            game_datetime,
            queue_id: dto.info.queue_id,
            placement: row.placement,
            level: row.level,
            gold_left: row.gold_left,
            last_round: row.last_round,
            traits: row.traits,
            units: row.units,
        })?);
    }

    Ok(views)
}
