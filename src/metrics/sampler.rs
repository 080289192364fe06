//! Requests-per-second sampler.
//!
//! Lives outside the registry: it reads the overall request count on a fixed
//! interval and assigns the observed rate back as a gauge.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use super::registry::StatusRegistry;

/// Turns successive request totals into a per-second rate.
#[derive(Debug, Default)]
pub struct RateSampler {
    last_total: u64,
}

impl RateSampler {
    pub fn new(initial_total: u64) -> Self {
        Self {
            last_total: initial_total,
        }
    }

    /// Rate since the previous observation, rounded to whole requests.
    pub fn observe(&mut self, total: u64, elapsed: Duration) -> u64 {
        let delta = total.saturating_sub(self.last_total);
        self.last_total = total;

        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0;
        }
        (delta as f64 / secs).round() as u64
    }
}

/// Sample forever. Spawned once from `main`.
pub async fn run(registry: Arc<StatusRegistry>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    let mut sampler = RateSampler::new(registry.requests());
    let mut last_at = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let rate = sampler.observe(registry.requests(), now - last_at);
        last_at = now;

        registry.set_requests_per_sec(rate);
        tracing::trace!(rate, "sampled requests per second");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_delta_over_elapsed() {
        let mut s = RateSampler::new(100);
        assert_eq!(s.observe(150, Duration::from_secs(1)), 50);
        assert_eq!(s.observe(250, Duration::from_secs(2)), 50);
        assert_eq!(s.observe(250, Duration::from_secs(1)), 0);
    }

    #[test]
    fn rate_rounds_to_nearest() {
        let mut s = RateSampler::default();
        assert_eq!(s.observe(3, Duration::from_millis(2_000)), 2);
        assert_eq!(s.observe(4, Duration::from_millis(500)), 2);
    }

    #[test]
    fn zero_elapsed_reports_zero() {
        let mut s = RateSampler::new(0);
        assert_eq!(s.observe(10, Duration::ZERO), 0);
        // the total is still consumed
        assert_eq!(s.observe(10, Duration::from_secs(1)), 0);
    }

    #[tokio::test]
    async fn run_assigns_rate_to_registry() {
        let registry = Arc::new(StatusRegistry::new());
        let task = tokio::spawn(run(registry.clone(), Duration::from_millis(50)));
        // let the sampler take its baseline first
        tokio::time::sleep(Duration::from_millis(10)).await;

        for _ in 0..20 {
            registry.record_response(200, 1, [("component", "dea")]);
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
        task.abort();

        assert!(registry.snapshot().requests_per_sec > 0);
    }
}
