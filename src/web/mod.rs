//! Read-only JSON front end over the stored ladder.
//!
//! - `GET /ranking`: stored players in ladder order
//! - `GET /search?q=Name%23Tag`: one player's recent results

mod error;
mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::{MatchSource, MatchView, RankingEntry, SearchResponse, parse_riot_id};

use crate::config::Config;
use crate::db::Repository;
use crate::error::AppError;
use crate::ingest::BatchOptions;
use crate::riot::RiotClient;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Repository,
    pub riot: RiotClient,
    pub search_match_count: u32,
    pub batch: BatchOptions,
}

impl AppState {
    pub fn new(db: Repository, riot: RiotClient, config: &Config) -> Self {
        Self {
            db,
            riot,
            search_match_count: config.search_match_count,
            batch: config.batch_options(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ranking", get(handlers::ranking))
        .route("/search", get(handlers::search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: &str) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "🌐 Web front end listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
