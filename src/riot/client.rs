use std::{fmt, sync::Arc, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::Rng;
use reqwest::{
    StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use super::metrics::RequestMetrics;
use crate::config::Config;
use crate::error::AppError;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const RATE_LIMIT_JITTER_MS: u64 = 250;

/// Riot API client shared by the collector and the web front end.
///
/// Cloning is cheap: the HTTP pool, rate limiter and counters are shared.
#[derive(Clone)]
pub struct RiotClient {
    http: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    /// Riot API Key
    api_key: String,
    platform_url: String,
    regional_url: String,
    account_url: String,
    max_rate_limit_retries: u32,
    metrics: Arc<RequestMetrics>,
}

impl RiotClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .default_headers(identification_headers())
            .build()?;

        let region = config.platform.to_region();
        let regional_override = config
            .riot_regional_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string());

        Ok(Self {
            http,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                config.riot_rate_limit_per_second,
            ))),
            api_key: config.riot_api_key.clone(),
            platform_url: config
                .riot_platform_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| config.platform.base_url()),
            regional_url: regional_override
                .clone()
                .unwrap_or_else(|| region.base_url()),
            account_url: regional_override
                .unwrap_or_else(|| region.account_region().base_url()),
            max_rate_limit_retries: config.riot_max_rate_limit_retries,
            metrics: RequestMetrics::new("riot"),
        })
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        self.metrics.clone()
    }

    pub(super) fn platform_url(&self) -> &str {
        &self.platform_url
    }

    pub(super) fn regional_url(&self) -> &str {
        &self.regional_url
    }

    pub(super) fn account_url(&self) -> &str {
        &self.account_url
    }

    /// GET `url` and decode the JSON body into `T`.
    ///
    /// A 429 answer is retried after the server supplied `Retry-After` delay
    /// (plus jitter) until `max_rate_limit_retries` is exhausted. Any other
    /// non-success status is returned as [`AppError::RiotApi`] carrying the body.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let mut attempts: u32 = 0;

        loop {
            self.limiter.until_ready().await;
            self.metrics.inc();
            attempts += 1;

            trace!(url, attempts, "🛰️ GET");
            let res = self
                .http
                .get(url)
                .header("X-Riot-Token", &self.api_key)
                .send()
                .await?;

            let status = res.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempts > self.max_rate_limit_retries {
                    return Err(AppError::RateLimited { attempts });
                }

                let wait = retry_after(res.headers()) + jitter();
                warn!(
                    url,
                    attempts,
                    wait_ms = wait.as_millis() as u64,
                    "🛰️ ⏳ Rate limited, retrying"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let message = res.text().await.unwrap_or_default();
                return Err(AppError::RiotApi {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = res.bytes().await?;
            return serde_json::from_slice(&body).map_err(|source| AppError::Decode {
                endpoint: url.to_string(),
                source,
            });
        }
    }
}

impl fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiotClient")
            .field("platform_url", &self.platform_url)
            .field("regional_url", &self.regional_url)
            .field("account_url", &self.account_url)
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .finish_non_exhaustive()
    }
}

fn identification_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(concat!("tft-ladder/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(
        header::ACCEPT_CHARSET,
        HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
    );
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_static("https://developer.riotgames.com"),
    );
    headers
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

fn jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(0..=RATE_LIMIT_JITTER_MS))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer, max_retries: u32) -> RiotClient {
        let mut config = Config::with_api_key("RGAPI-TEST");
        config.riot_platform_url = Some(server.base_url());
        config.riot_regional_url = Some(server.base_url());
        config.riot_max_rate_limit_retries = max_retries;
        RiotClient::new(&config).unwrap()
    }

    #[test]
    fn retry_after_reads_whole_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Duration::from_secs(3));
    }

    #[test]
    fn retry_after_defaults_when_missing_or_garbage() {
        assert_eq!(retry_after(&HeaderMap::new()), DEFAULT_RETRY_AFTER);

        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
    }

    #[tokio::test]
    async fn sends_token_and_identification_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/ping")
                    .header("x-riot-token", "RGAPI-TEST")
                    .header("origin", "https://developer.riotgames.com")
                    .header_exists("user-agent");
                then.status(200).json_body(json!({ "ok": true }));
            })
            .await;

        let client = client_for(&server, 0);
        let body: serde_json::Value = client.get(&server.url("/ping")).await.unwrap();

        assert_eq!(body["ok"], true);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_surfaces_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("not here");
            })
            .await;

        let client = client_for(&server, 0);
        let res: Result<serde_json::Value, _> = client.get(&server.url("/missing")).await;

        match res {
            Err(AppError::RiotApi { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "not here");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/league");
                then.status(200).json_body(json!({ "entries": "nope" }));
            })
            .await;

        let client = client_for(&server, 0);
        let res: Result<crate::riot::LeagueListDto, _> = client.get(&server.url("/league")).await;

        assert!(matches!(res, Err(AppError::Decode { .. })));
    }

    #[tokio::test]
    async fn rate_limit_retries_are_capped() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/busy");
                then.status(429).header("Retry-After", "0");
            })
            .await;

        let client = client_for(&server, 2);
        let res: Result<serde_json::Value, _> = client.get(&server.url("/busy")).await;

        assert!(matches!(res, Err(AppError::RateLimited { attempts: 3 })));
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn request_propagates_reqwest_error() {
        let client = RiotClient::new(&Config::with_api_key("RGAPI-INVALID-KEY")).unwrap();

        let res: Result<(), _> = client.get("ht!tp://invalid-url").await;

        assert!(matches!(res, Err(AppError::Http(_))));
    }
}
