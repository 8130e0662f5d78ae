use std::env;
use std::num::{NonZeroU32, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;

use nonzero_ext::nonzero;

use crate::error::AppError;
use crate::ingest::BatchOptions;
use crate::riot::{LadderTier, Platform};

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_key: String,
    pub database_url: String,
    pub platform: Platform,
    pub ladder_tier: LadderTier,
    pub match_history_count: u32,
    pub search_match_count: u32,
    pub fetch_batch_size: NonZeroUsize,
    pub fetch_batch_delay_ms: u64,
    pub riot_rate_limit_per_second: NonZeroU32,
    pub riot_max_rate_limit_retries: u32,
    pub collect_interval_secs: u64,
    pub http_bind_addr: String,
    /// Overrides the platform routing base URL (e.g. `https://kr.api.riotgames.com`).
    pub riot_platform_url: Option<String>,
    /// Overrides the regional routing base URL (e.g. `https://asia.api.riotgames.com`).
    pub riot_regional_url: Option<String>,
}

const DEFAULT_MATCH_HISTORY_COUNT: u32 = 10;
const DEFAULT_SEARCH_MATCH_COUNT: u32 = 5;
const DEFAULT_FETCH_BATCH_SIZE: NonZeroUsize = nonzero!(50_usize);
const DEFAULT_FETCH_BATCH_DELAY_MS: u64 = 500;
const DEFAULT_RIOT_RATE_LIMIT_PER_SECOND: NonZeroU32 = nonzero!(20_u32);
const DEFAULT_RIOT_MAX_RATE_LIMIT_RETRIES: u32 = 5;
const DEFAULT_COLLECT_INTERVAL_SECS: u64 = 3600;
const DEFAULT_HTTP_BIND_ADDR: &str = "127.0.0.1:3000";

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let riot_api_key = env::var("RIOT_API_KEY")
            .map_err(|_| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:tft-ladder.db".into());

        let platform = match env::var("RIOT_PLATFORM") {
            Ok(v) => v.parse()?,
            Err(_) => Platform::KR,
        };

        let ladder_tier = match env::var("LADDER_TIER") {
            Ok(v) => v.parse()?,
            Err(_) => LadderTier::Challenger,
        };

        Ok(Self {
            riot_api_key,
            database_url,
            platform,
            ladder_tier,
            match_history_count: env_or("MATCH_HISTORY_COUNT", DEFAULT_MATCH_HISTORY_COUNT),
            search_match_count: env_or("SEARCH_MATCH_COUNT", DEFAULT_SEARCH_MATCH_COUNT),
            fetch_batch_size: env_or("FETCH_BATCH_SIZE", DEFAULT_FETCH_BATCH_SIZE),
            fetch_batch_delay_ms: env_or("FETCH_BATCH_DELAY_MS", DEFAULT_FETCH_BATCH_DELAY_MS),
            riot_rate_limit_per_second: env_or(
                "RIOT_RATE_LIMIT_PER_SECOND",
                DEFAULT_RIOT_RATE_LIMIT_PER_SECOND,
            ),
            riot_max_rate_limit_retries: env_or(
                "RIOT_MAX_RATE_LIMIT_RETRIES",
                DEFAULT_RIOT_MAX_RATE_LIMIT_RETRIES,
            ),
            collect_interval_secs: env_or("COLLECT_INTERVAL_SECS", DEFAULT_COLLECT_INTERVAL_SECS),
            http_bind_addr: env::var("HTTP_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_HTTP_BIND_ADDR.into()),
            riot_platform_url: env::var("RIOT_PLATFORM_URL").ok(),
            riot_regional_url: env::var("RIOT_REGIONAL_URL").ok(),
        })
    }

    /// Configuration with defaults for everything but the key, used by tests.
    pub fn with_api_key(riot_api_key: impl Into<String>) -> Self {
        Self {
            riot_api_key: riot_api_key.into(),
            database_url: "sqlite::memory:".into(),
            platform: Platform::KR,
            ladder_tier: LadderTier::Challenger,
            match_history_count: DEFAULT_MATCH_HISTORY_COUNT,
            search_match_count: DEFAULT_SEARCH_MATCH_COUNT,
            fetch_batch_size: DEFAULT_FETCH_BATCH_SIZE,
            fetch_batch_delay_ms: DEFAULT_FETCH_BATCH_DELAY_MS,
            riot_rate_limit_per_second: DEFAULT_RIOT_RATE_LIMIT_PER_SECOND,
            riot_max_rate_limit_retries: DEFAULT_RIOT_MAX_RATE_LIMIT_RETRIES,
            collect_interval_secs: DEFAULT_COLLECT_INTERVAL_SECS,
            http_bind_addr: DEFAULT_HTTP_BIND_ADDR.into(),
            riot_platform_url: None,
            riot_regional_url: None,
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.fetch_batch_size,
            delay: Duration::from_millis(self.fetch_batch_delay_ms),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
