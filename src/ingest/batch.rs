//! Bounded fan-out of independent requests.
//!
//! Futures do nothing until polled, so a list of futures is a list of
//! deferred tasks. [`run_batched`] drives them a batch at a time and pauses
//! between batches to stay under the shared Riot rate budget even when the
//! client never sees a 429.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use futures::future::join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub batch_size: NonZeroUsize,
    /// Pause between two consecutive batches.
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the batch that just finished.
    pub batch: usize,
    pub batches: usize,
    pub completed: usize,
    pub total: usize,
}

/// Run `tasks` in consecutive batches of at most `options.batch_size`.
///
/// Every task of a batch is polled concurrently and the whole batch is
/// awaited before the next one starts. A failing task only fills its own
/// slot. The returned vector has the length and order of `tasks`.
pub async fn run_batched<I, Fut, T, E>(
    tasks: I,
    options: &BatchOptions,
    mut on_progress: impl FnMut(BatchProgress),
) -> Vec<Result<T, E>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    let mut pending = tasks.into_iter().collect::<Vec<_>>().into_iter();
    let total = pending.len();
    let size = options.batch_size.get();
    let batches = total.div_ceil(size);

    let mut results = Vec::with_capacity(total);

    for batch in 1..=batches {
        let chunk: Vec<Fut> = pending.by_ref().take(size).collect();
        results.extend(join_all(chunk).await);

        on_progress(BatchProgress {
            batch,
            batches,
            completed: results.len(),
            total,
        });

        if batch < batches {
            tokio::time::sleep(options.delay).await;
        }
    }

    results
}

/// Split fan-out results into successes and failures, keeping input order in both.
pub fn partition_results<T, E>(results: Vec<Result<T, E>>) -> (Vec<T>, Vec<E>) {
    let mut ok = Vec::new();
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(v) => ok.push(v),
            Err(e) => failed.push(e),
        }
    }
    (ok, failed)
}
