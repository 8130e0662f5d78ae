use std::env;
use std::time::Duration;

use tft_ladder::config::Config;
use tft_ladder::db::{self, Repository};
use tft_ladder::error::AppError;
use tft_ladder::ingest::{Collector, start_collecting};
use tft_ladder::logging;
use tft_ladder::riot::RiotClient;
use tft_ladder::web::{self, AppState};
use tracing::{error, info};

const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Collect the ladder once and exit.
    Collect,
    /// Serve the stored ladder without collecting.
    Serve,
    /// Serve and collect on an interval.
    Run,
}

impl Command {
    fn from_args() -> Result<Self, AppError> {
        match env::args().nth(1).as_deref() {
            None | Some("run") => Ok(Self::Run),
            Some("collect") => Ok(Self::Collect),
            Some("serve") => Ok(Self::Serve),
            Some(other) => Err(AppError::Config(format!(
                "unknown command `{other}`, expected one of: collect, serve, run"
            ))),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = ?e, "❌ Fatal error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let command = Command::from_args()?;
    let config = Config::from_env()?;
    logging::init()?;

    info!(
        ?command,
        platform = %config.platform,
        tier = %config.ladder_tier,
        "🐙 Starting tft-ladder"
    );

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("🗄️ Database ready");

    let repo = Repository::new(pool);
    let riot = RiotClient::new(&config)?;

    tokio::spawn(riot.metrics().log_loop(METRICS_LOG_INTERVAL));

    match command {
        Command::Collect => {
            let report = Collector::new(repo, riot, &config).run().await?;
            info!(?report, "✅ Collection complete");
        }
        Command::Serve => {
            web::serve(AppState::new(repo, riot, &config), &config.http_bind_addr).await?;
        }
        Command::Run => {
            let collector = Collector::new(repo.clone(), riot.clone(), &config);
            tokio::spawn(start_collecting(collector, config.collect_interval_secs));

            web::serve(AppState::new(repo, riot, &config), &config.http_bind_addr).await?;
        }
    }

    Ok(())
}
