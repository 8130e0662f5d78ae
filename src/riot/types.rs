use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ============================================================================
// Account-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

// ============================================================================
// TFT-League-v1
// ============================================================================

/// Apex tiers exposing a full leaderboard listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LadderTier {
    Challenger,
    Grandmaster,
    Master,
}

impl LadderTier {
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Challenger => "challenger",
            Self::Grandmaster => "grandmaster",
            Self::Master => "master",
        }
    }
}

impl FromStr for LadderTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "challenger" => Ok(Self::Challenger),
            "grandmaster" => Ok(Self::Grandmaster),
            "master" => Ok(Self::Master),
            other => Err(AppError::Config(format!("unknown ladder tier: {other}"))),
        }
    }
}

impl fmt::Display for LadderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path().to_uppercase())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueListDto {
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub entries: Vec<LeagueItemDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueItemDto {
    pub puuid: String,
    #[serde(default)]
    pub summoner_id: Option<String>,
    pub league_points: i32,
    #[serde(default)]
    pub rank: String,
    pub wins: i32,
    pub losses: i32,
}

// ============================================================================
// TFT-Match-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MatchDto {
    pub metadata: MetadataDto,
    pub info: InfoDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataDto {
    pub match_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoDto {
    /// Epoch milliseconds.
    pub game_datetime: i64,
    /// Seconds.
    pub game_length: f64,
    pub game_version: String,
    pub queue_id: i32,
    pub tft_set_number: i32,
    #[serde(default)]
    pub tft_set_core_name: String,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantDto {
    pub puuid: String,
    pub placement: i32,
    pub level: i32,
    pub gold_left: i32,
    pub last_round: i32,
    pub players_eliminated: i32,
    pub total_damage_to_players: i64,
    #[serde(default)]
    pub traits: Vec<TraitDto>,
    #[serde(default)]
    pub units: Vec<UnitDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDto {
    pub name: String,
    pub num_units: i32,
    #[serde(default)]
    pub style: i32,
    pub tier_current: i32,
    #[serde(default)]
    pub tier_total: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDto {
    pub character_id: String,
    #[serde(rename = "itemNames", default)]
    pub item_names: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: i32,
    pub tier: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_list_tolerates_missing_entries() {
        let list: LeagueListDto = serde_json::from_str(r#"{"tier":"CHALLENGER"}"#).unwrap();
        assert!(list.entries.is_empty());
    }

    #[test]
    fn unit_item_names_use_camel_case_key() {
        let unit: UnitDto = serde_json::from_str(
            r#"{"character_id":"TFT13_Jinx","itemNames":["TFT_Item_InfinityEdge"],"rarity":4,"tier":2}"#,
        )
        .unwrap();
        assert_eq!(unit.item_names, vec!["TFT_Item_InfinityEdge"]);

        let back = serde_json::to_value(&unit).unwrap();
        assert!(back.get("itemNames").is_some());
    }

    #[test]
    fn ladder_tier_parses_and_builds_path() {
        assert_eq!("Grandmaster".parse::<LadderTier>().unwrap(), LadderTier::Grandmaster);
        assert_eq!(LadderTier::Challenger.as_path(), "challenger");
        assert!("iron".parse::<LadderTier>().is_err());
    }
}
