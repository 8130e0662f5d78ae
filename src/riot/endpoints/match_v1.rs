use crate::error::AppError;
use crate::riot::client::RiotClient;
use crate::riot::types::MatchDto;

impl RiotClient {
    /// Most recent TFT match IDs of a player, newest first.
    pub async fn get_match_ids(&self, puuid: &str, count: u32) -> Result<Vec<String>, AppError> {
        let url = format!(
            "{}/tft/match/v1/matches/by-puuid/{}/ids?count={}",
            self.regional_url(),
            urlencoding::encode(puuid),
            count
        );

        self.get(&url).await
    }

    pub async fn get_match(&self, match_id: &str) -> Result<MatchDto, AppError> {
        let url = format!(
            "{}/tft/match/v1/matches/{}",
            self.regional_url(),
            urlencoding::encode(match_id)
        );

        self.get(&url).await
    }
}
