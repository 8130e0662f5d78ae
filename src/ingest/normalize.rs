//! Pure conversions from Riot payloads to storage rows.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::db::{MatchRecords, MatchSummary, ParticipantRecord, PlayerRecord};
use crate::error::AppError;
use crate::riot::{AccountDto, LeagueItemDto, MatchDto, ParticipantDto, TraitDto, UnitDto};

pub const RIOT_ID_SEPARATOR: char = '#';

/// Result of normalizing one match payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMatch {
    pub records: MatchRecords,
    /// Participant entries dropped because their puuid was already seen in the match.
    pub duplicates_skipped: usize,
}

pub fn display_name(game_name: &str, tag_line: &str) -> String {
    format!("{game_name}{RIOT_ID_SEPARATOR}{tag_line}")
}

pub fn player_record(
    entry: &LeagueItemDto,
    tier: &str,
    account: &AccountDto,
    now: DateTime<Utc>,
) -> PlayerRecord {
    let game_name = account.game_name.clone().unwrap_or_default();
    let tag_line = account.tag_line.clone().unwrap_or_default();

    PlayerRecord {
        puuid: entry.puuid.clone(),
        display_name: display_name(&game_name, &tag_line),
        game_name,
        tag_line,
        tier: tier.to_string(),
        rank: entry.rank.clone(),
        league_points: entry.league_points,
        wins: entry.wins,
        losses: entry.losses,
        last_updated: now,
    }
}

/// Drop repeated puuids from a leaderboard, keeping the first entry.
pub fn unique_entries(entries: Vec<LeagueItemDto>) -> Vec<LeagueItemDto> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.puuid.clone());
            if !first {
                warn!(puuid = %entry.puuid, "🧹 Duplicate leaderboard entry dropped");
            }
            first
        })
        .collect()
}

/// Flatten match id lists, dropping repeats while keeping first-seen order.
pub fn dedupe_match_ids<I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

pub fn normalize_match(dto: &MatchDto) -> Result<NormalizedMatch, AppError> {
    let match_id = &dto.metadata.match_id;
    let info = &dto.info;

    let game_datetime = DateTime::<Utc>::from_timestamp_millis(info.game_datetime).ok_or_else(
        || AppError::InvalidPayload {
            context: match_id.clone(),
            reason: format!("game_datetime {} out of range", info.game_datetime),
        },
    )?;

    let game_length =
        Duration::try_from_secs_f64(info.game_length).map_err(|e| AppError::InvalidPayload {
            context: match_id.clone(),
            reason: format!("game_length {}: {e}", info.game_length),
        })?;

    let summary = MatchSummary {
        match_id: match_id.clone(),
        game_datetime,
        game_length,
        game_version: info.game_version.clone(),
        queue_id: info.queue_id,
        tft_set_number: info.tft_set_number,
        tft_set_core_name: info.tft_set_core_name.clone(),
    };

    let mut seen = HashSet::new();
    let mut participants = Vec::with_capacity(info.participants.len());
    let mut duplicates_skipped = 0;

    for participant in &info.participants {
        if !seen.insert(participant.puuid.as_str()) {
            let fault = AppError::DuplicateParticipant {
                match_id: match_id.clone(),
                puuid: participant.puuid.clone(),
            };
            warn!(error = %fault, "🧹 Skipping duplicate participant");
            duplicates_skipped += 1;
            continue;
        }
        participants.push(participant_record(match_id, participant)?);
    }

    Ok(NormalizedMatch {
        records: MatchRecords {
            summary,
            participants,
        },
        duplicates_skipped,
    })
}

/// The record of `puuid` inside `dto`, if the player took part in it.
pub fn participant_for(
    dto: &MatchDto,
    puuid: &str,
) -> Result<Option<ParticipantRecord>, AppError> {
    let mut matching = dto.info.participants.iter().filter(|p| p.puuid == puuid);

    let Some(participant) = matching.next() else {
        return Ok(None);
    };

    if matching.next().is_some() {
        return Err(AppError::DuplicateParticipant {
            match_id: dto.metadata.match_id.clone(),
            puuid: puuid.to_string(),
        });
    }

    participant_record(&dto.metadata.match_id, participant).map(Some)
}

fn participant_record(
    match_id: &str,
    participant: &ParticipantDto,
) -> Result<ParticipantRecord, AppError> {
    Ok(ParticipantRecord {
        match_id: match_id.to_string(),
        puuid: participant.puuid.clone(),
        placement: participant.placement,
        level: participant.level,
        gold_left: participant.gold_left,
        last_round: participant.last_round,
        players_eliminated: participant.players_eliminated,
        total_damage_to_players: participant.total_damage_to_players,
        traits: encode_blob(match_id, &participant.traits)?,
        units: encode_blob(match_id, &participant.units)?,
    })
}

fn encode_blob<T: serde::Serialize>(match_id: &str, value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::InvalidPayload {
        context: match_id.to_string(),
        reason: format!("cannot encode nested records: {e}"),
    })
}

pub fn decode_traits(blob: &str) -> Result<Vec<TraitDto>, serde_json::Error> {
    serde_json::from_str(blob)
}

pub fn decode_units(blob: &str) -> Result<Vec<UnitDto>, serde_json::Error> {
    serde_json::from_str(blob)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeZone;
    use serde_json::{Value, json};

    use super::*;

    fn participant_json(puuid: &str, placement: i32) -> Value {
        json!({
            "puuid": puuid,
            "placement": placement,
            "level": 8,
            "gold_left": 2,
            "last_round": 30 + placement,
            "players_eliminated": 9 - placement,
            "total_damage_to_players": 150 - placement * 10,
            "time_eliminated": 1800.5,
            "traits": [
                { "name": "TFT11_Heavenly", "num_units": 3, "style": 1, "tier_current": 1, "tier_total": 4 },
                { "name": "TFT11_Sage", "num_units": 2, "style": 1, "tier_current": 1, "tier_total": 3 }
            ],
            "units": [
                { "character_id": "TFT11_Kayle", "itemNames": ["TFT_Item_GuinsoosRageblade"], "name": "", "rarity": 4, "tier": 2 },
                { "character_id": "TFT11_Ahri", "itemNames": [], "name": "", "rarity": 1, "tier": 3 }
            ]
        })
    }

    pub(crate) fn match_json(match_id: &str, puuids: &[&str]) -> Value {
        let participants: Vec<Value> = puuids
            .iter()
            .enumerate()
            .map(|(i, puuid)| participant_json(puuid, i as i32 + 1))
            .collect();

        json!({
            "metadata": { "data_version": "5", "match_id": match_id, "participants": puuids },
            "info": {
                "game_datetime": 1_714_557_600_000_i64,
                "game_length": 2100.25,
                "game_version": "Linux Version 14.9.580.1234",
                "queue_id": 1100,
                "tft_set_number": 11,
                "tft_set_core_name": "TFTSet11",
                "participants": participants
            }
        })
    }

    fn match_dto(match_id: &str, puuids: &[&str]) -> MatchDto {
        serde_json::from_value(match_json(match_id, puuids)).unwrap()
    }

    const EIGHT: [&str; 8] = ["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8"];

    #[test]
    fn eight_participants_become_one_summary_and_eight_rows() {
        let dto = match_dto("KR_100", &EIGHT);

        let normalized = normalize_match(&dto).unwrap();
        let summary = &normalized.records.summary;

        assert_eq!(summary.match_id, "KR_100");
        assert_eq!(
            summary.game_datetime,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(summary.game_length, Duration::from_secs_f64(2100.25));
        assert_eq!(summary.tft_set_core_name, "TFTSet11");
        assert_eq!(normalized.records.participants.len(), 8);
        assert_eq!(normalized.duplicates_skipped, 0);
        assert!(
            normalized
                .records
                .participants
                .iter()
                .all(|p| p.match_id == "KR_100")
        );
    }

    #[test]
    fn nested_blobs_decode_back_to_payload_lists() {
        let dto = match_dto("KR_100", &EIGHT);
        let normalized = normalize_match(&dto).unwrap();

        for (row, payload) in normalized
            .records
            .participants
            .iter()
            .zip(&dto.info.participants)
        {
            assert_eq!(decode_traits(&row.traits).unwrap(), payload.traits);
            assert_eq!(decode_units(&row.units).unwrap(), payload.units);
        }
    }

    #[test]
    fn duplicate_participant_is_skipped_not_overwritten() {
        let mut raw = match_json("KR_7", &["a", "b"]);
        let mut dup = participant_json("a", 8);
        dup["level"] = json!(3);
        raw["info"]["participants"].as_array_mut().unwrap().push(dup);
        let dto: MatchDto = serde_json::from_value(raw).unwrap();

        let normalized = normalize_match(&dto).unwrap();

        assert_eq!(normalized.duplicates_skipped, 1);
        assert_eq!(normalized.records.participants.len(), 2);
        assert_eq!(normalized.records.participants[0].placement, 1);
        assert_eq!(normalized.records.participants[0].level, 8);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut raw = match_json("KR_8", &["a"]);
        raw["info"]["game_length"] = json!(-1.0);
        let dto: MatchDto = serde_json::from_value(raw).unwrap();

        assert!(matches!(
            normalize_match(&dto),
            Err(AppError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn participant_for_finds_the_requested_player() {
        let dto = match_dto("KR_9", &EIGHT);

        let row = participant_for(&dto, "p3").unwrap().unwrap();
        assert_eq!(row.placement, 3);
        assert_eq!(row.match_id, "KR_9");

        assert!(participant_for(&dto, "ghost").unwrap().is_none());
    }

    #[test]
    fn participant_for_rejects_duplicate_entries() {
        let mut raw = match_json("KR_10", &["a", "b"]);
        raw["info"]["participants"]
            .as_array_mut()
            .unwrap()
            .push(participant_json("b", 5));
        let dto: MatchDto = serde_json::from_value(raw).unwrap();

        assert!(matches!(
            participant_for(&dto, "b"),
            Err(AppError::DuplicateParticipant { puuid, .. }) if puuid == "b"
        ));
    }

    #[test]
    fn player_record_composes_display_name() {
        let entry = LeagueItemDto {
            puuid: "p1".into(),
            summoner_id: None,
            league_points: 1234,
            rank: "I".into(),
            wins: 40,
            losses: 20,
        };
        let account = AccountDto {
            puuid: "p1".into(),
            game_name: Some("Hide on bush".into()),
            tag_line: Some("KR1".into()),
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let record = player_record(&entry, "CHALLENGER", &account, now);

        assert_eq!(record.display_name, "Hide on bush#KR1");
        assert_eq!(record.league_points, 1234);
        assert_eq!((record.wins, record.losses), (40, 20));
        assert_eq!(record.last_updated, now);
    }

    #[test]
    fn match_ids_are_deduplicated_in_first_seen_order() {
        let ids = dedupe_match_ids(vec![
            vec!["KR_1".to_string(), "KR_2".to_string()],
            vec!["KR_2".to_string(), "KR_3".to_string()],
            vec![],
            vec!["KR_1".to_string()],
        ]);

        assert_eq!(ids, vec!["KR_1", "KR_2", "KR_3"]);
    }

    #[test]
    fn leaderboard_duplicates_keep_first_entry() {
        let entry = |puuid: &str, lp: i32| LeagueItemDto {
            puuid: puuid.into(),
            summoner_id: None,
            league_points: lp,
            rank: "I".into(),
            wins: 1,
            losses: 1,
        };

        let unique = unique_entries(vec![entry("a", 10), entry("b", 5), entry("a", 99)]);

        let kept: Vec<(String, i32)> = unique
            .into_iter()
            .map(|e| (e.puuid, e.league_points))
            .collect();
        assert_eq!(kept, vec![("a".to_string(), 10), ("b".to_string(), 5)]);
    }
}
