use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Riot API error: {status} - {message}")]
    RiotApi { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid payload for {context}: {reason}")]
    InvalidPayload { context: String, reason: String },

    #[error("Still rate limited after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    #[error("Player {puuid} appears more than once in match {match_id}")]
    DuplicateParticipant { match_id: String, puuid: String },

    #[error("Player not found: {game_name}#{tag_line}")]
    PlayerNotFound { game_name: String, tag_line: String },

    #[error("Invalid Riot ID: {0}")]
    InvalidRiotId(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the error came from the remote API rather than local storage.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RiotApi { .. }
                | Self::Http(_)
                | Self::Decode { .. }
                | Self::InvalidPayload { .. }
                | Self::RateLimited { .. }
                | Self::PlayerNotFound { .. }
        )
    }
}
