//! Typed access to the Riot Games TFT endpoints.

mod client;
mod endpoints {
    mod account;
    mod league;
    mod match_v1;
}
mod metrics;
mod region;
mod types;

pub use client::RiotClient;
pub use metrics::RequestMetrics;
pub use region::{Platform, Region};
pub use types::{
    AccountDto, InfoDto, LadderTier, LeagueItemDto, LeagueListDto, MatchDto, MetadataDto,
    ParticipantDto, TraitDto, UnitDto,
};
