use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{Span, debug, error, info, instrument, warn};

use super::batch::{BatchOptions, BatchProgress, run_batched};
use super::normalize::{dedupe_match_ids, normalize_match, player_record, unique_entries};
use crate::config::Config;
use crate::db::Repository;
use crate::error::AppError;
use crate::riot::{LadderTier, RiotClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchLeaderboard,
    FetchPlayerDetails,
    ReconcilePlayers,
    FetchMatchIds,
    DedupeMatchIds,
    FetchMatchDetails,
    NormalizeAndPersistMatches,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FetchLeaderboard => "fetch_leaderboard",
            Self::FetchPlayerDetails => "fetch_player_details",
            Self::ReconcilePlayers => "reconcile_players",
            Self::FetchMatchIds => "fetch_match_ids",
            Self::DedupeMatchIds => "dedupe_match_ids",
            Self::FetchMatchDetails => "fetch_match_details",
            Self::NormalizeAndPersistMatches => "normalize_and_persist_matches",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// Counters for one collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    pub leaderboard_entries: usize,
    pub players_stored: usize,
    pub players_removed: u64,
    pub player_failures: usize,
    pub match_id_failures: usize,
    /// Unique match ids across every player's history.
    pub match_ids: usize,
    pub matches_already_stored: usize,
    pub match_failures: usize,
    pub matches_stored: usize,
    pub participants_stored: usize,
    pub duplicate_participants: usize,
}

/// One pass over the ladder: leaderboard, accounts, match histories, matches.
#[derive(Debug, Clone)]
pub struct Collector {
    db: Repository,
    riot: RiotClient,
    tier: LadderTier,
    match_count: u32,
    batch: BatchOptions,
}

impl Collector {
    pub fn new(db: Repository, riot: RiotClient, config: &Config) -> Self {
        Self {
            db,
            riot,
            tier: config.ladder_tier,
            match_count: config.match_history_count,
            batch: config.batch_options(),
        }
    }

    /// Run every stage once.
    ///
    /// Per-item request failures are counted and the item dropped. A failed
    /// leaderboard fetch or any storage error aborts the run.
    #[instrument(skip_all, fields(tier = %self.tier, players))]
    pub async fn run(&self) -> Result<CollectReport, AppError> {
        let mut report = CollectReport::default();
        let now = Utc::now();

        // Leaderboard
        info!(stage = %Stage::FetchLeaderboard, "🏆 Fetching leaderboard");
        let league = self.riot.get_league(self.tier).await?;
        let tier = if league.tier.is_empty() {
            self.tier.to_string()
        } else {
            league.tier.clone()
        };
        let entries = unique_entries(league.entries);
        report.leaderboard_entries = entries.len();

        if entries.is_empty() {
            info!(stage = %Stage::Done, "🏆 Leaderboard is empty, nothing to collect");
            return Ok(report);
        }
        Span::current().record("players", entries.len());

        // Accounts
        info!(
            stage = %Stage::FetchPlayerDetails,
            count = entries.len(),
            "👤 Fetching {} account(s)",
            entries.len()
        );
        let accounts = run_batched(
            entries
                .iter()
                .map(|entry| self.riot.get_account_by_puuid(&entry.puuid)),
            &self.batch,
            log_progress(Stage::FetchPlayerDetails),
        )
        .await;

        let mut players = Vec::with_capacity(entries.len());
        for (entry, account) in entries.iter().zip(accounts) {
            match account {
                Ok(account) => players.push(player_record(entry, &tier, &account, now)),
                Err(e) => {
                    warn!(error = %e, puuid = %entry.puuid, "👤 ⚠️ Account fetch failed");
                    report.player_failures += 1;
                }
            }
        }

        // Players
        info!(stage = %Stage::ReconcilePlayers, "🗄️ Storing players");
        self.db.upsert_players(&players).await?;
        report.players_stored = players.len();

        let current: HashSet<String> = entries.iter().map(|e| e.puuid.clone()).collect();
        report.players_removed = self.db.reconcile_players(&current).await?;

        // Match histories
        info!(
            stage = %Stage::FetchMatchIds,
            count = players.len(),
            match_count = self.match_count,
            "📜 Fetching match histories"
        );
        let histories = run_batched(
            players
                .iter()
                .map(|player| self.riot.get_match_ids(&player.puuid, self.match_count)),
            &self.batch,
            log_progress(Stage::FetchMatchIds),
        )
        .await;

        let mut lists = Vec::with_capacity(players.len());
        for (player, history) in players.iter().zip(histories) {
            match history {
                Ok(ids) => lists.push(ids),
                Err(e) => {
                    warn!(error = %e, puuid = %player.puuid, "📜 ⚠️ Match history fetch failed");
                    report.match_id_failures += 1;
                }
            }
        }

        let match_ids = dedupe_match_ids(lists);
        report.match_ids = match_ids.len();

        let stored = self.db.existing_match_ids(&match_ids).await?;
        report.matches_already_stored = stored.len();
        let missing: Vec<String> = match_ids
            .into_iter()
            .filter(|id| !stored.contains(id))
            .collect();

        debug!(
            stage = %Stage::DedupeMatchIds,
            unique = report.match_ids,
            already_stored = report.matches_already_stored,
            to_fetch = missing.len(),
            "📜 Match ids deduplicated"
        );

        if missing.is_empty() {
            info!(stage = %Stage::Done, ?report, "✅ Collection finished, no new matches");
            return Ok(report);
        }

        // Matches
        info!(
            stage = %Stage::FetchMatchDetails,
            count = missing.len(),
            "🎮 Fetching {} match(es)",
            missing.len()
        );
        let details = run_batched(
            missing.iter().map(|id| self.riot.get_match(id)),
            &self.batch,
            log_progress(Stage::FetchMatchDetails),
        )
        .await;

        let mut matches = Vec::with_capacity(missing.len());
        for (match_id, detail) in missing.iter().zip(details) {
            let normalized = detail.and_then(|dto| normalize_match(&dto));
            match normalized {
                Ok(normalized) => {
                    report.duplicate_participants += normalized.duplicates_skipped;
                    matches.push(normalized.records);
                }
                Err(e) => {
                    warn!(error = %e, match_id, "🎮 ⚠️ Match dropped");
                    report.match_failures += 1;
                }
            }
        }

        info!(
            stage = %Stage::NormalizeAndPersistMatches,
            count = matches.len(),
            "🗄️ Storing matches"
        );
        let (summaries, participants) = self.db.store_matches(&matches).await?;
        report.matches_stored = summaries as usize;
        report.participants_stored = participants as usize;

        info!(stage = %Stage::Done, ?report, "✅ Collection finished");
        Ok(report)
    }
}

fn log_progress(stage: Stage) -> impl FnMut(BatchProgress) {
    move |p| {
        debug!(
            stage = %stage,
            batch = p.batch,
            batches = p.batches,
            completed = p.completed,
            total = p.total,
            "📦 Batch {}/{} done",
            p.batch,
            p.batches
        );
    }
}

/// Repeat [`Collector::run`] forever, logging failed runs.
pub async fn start_collecting(collector: Collector, interval_secs: u64) {
    let mut interval = interval(Duration::from_secs(interval_secs.max(1)));

    info!(interval_secs, "🔄 Ladder collector started");

    loop {
        interval.tick().await;

        if let Err(e) = collector.run().await {
            error!(error = ?e, "🔄 ❌ Collection run failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Stage;

    #[test]
    fn stage_labels_are_snake_case() {
        assert_eq!(Stage::FetchLeaderboard.to_string(), "fetch_leaderboard");
        assert_eq!(
            Stage::NormalizeAndPersistMatches.to_string(),
            "normalize_and_persist_matches"
        );
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
