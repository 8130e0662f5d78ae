use crate::error::AppError;
use crate::riot::client::RiotClient;
use crate::riot::types::{LadderTier, LeagueListDto};

impl RiotClient {
    /// Full leaderboard of an apex tier.
    /// Uses platform routing (kr, euw1, na1, etc.)
    pub async fn get_league(&self, tier: LadderTier) -> Result<LeagueListDto, AppError> {
        let url = format!("{}/tft/league/v1/{}", self.platform_url(), tier.as_path());

        self.get(&url).await
    }
}
