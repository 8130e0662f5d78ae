use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{Instrument, info_span};

/// Counter of Riot API requests, logged periodically.
#[derive(Debug)]
pub struct RequestMetrics {
    start: Instant,
    count: AtomicU64,
    name: &'static str,
}

impl RequestMetrics {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            count: AtomicU64::new(0),
            name,
        })
    }

    pub fn inc(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn per_minute(&self) -> f64 {
        let elapsed_min = self.start.elapsed().as_secs_f64() / 60.0;
        if elapsed_min > 0.0 {
            self.total() as f64 / elapsed_min
        } else {
            0.0
        }
    }

    pub async fn log_loop(self: Arc<Self>, every: Duration) {
        let mut interval = tokio::time::interval(every);
        // first tick is immediate
        interval.tick().await;

        loop {
            let span = info_span!("📊", client = self.name);
            async {
                interval.tick().await;
                tracing::info!(
                    total = self.total(),
                    "{} requests executed (avg {:.2} req/min)",
                    self.total(),
                    self.per_minute()
                );
            }
            .instrument(span)
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inc_increases_count() {
        let metrics = RequestMetrics::new("test");
        metrics.inc();
        metrics.inc();

        assert_eq!(metrics.total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn log_loop_keeps_running() {
        let metrics = RequestMetrics::new("test");
        let cloned = metrics.clone();
        let handle = tokio::spawn(async move { cloned.log_loop(Duration::from_secs(60)).await });

        tokio::time::advance(Duration::from_secs(121)).await;
        assert!(!handle.is_finished());
        handle.abort();
        let _ = handle.await;
    }
}
