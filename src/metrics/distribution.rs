use std::fmt;

use hdrhistogram::Histogram;
use serde::Serialize;

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram range: 1 ms → 1 h, 3 significant figures.
/// Anything above the range saturates into the top bucket.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 3_600_000;
const HIST_SIGFIG: u8 = 3;

// ─── Distribution ────────────────────────────────────────────────

/// Latency distribution owned by a single metric bucket.
///
/// `add` is called while the registry lock is held, so it must stay O(1):
/// `saturating_record` never allocates and never fails.
pub struct Distribution {
    name: String,
    hist: Histogram<u64>,
}

impl Distribution {
    /// Build an empty distribution labelled `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("histogram bounds are constant and valid"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one observation in milliseconds. Negative values are ignored.
    pub fn add(&mut self, value: i64) {
        if let Ok(v) = u64::try_from(value) {
            self.hist.saturating_record(v);
        }
    }

    /// Drop every recorded observation.
    pub fn reset(&mut self) {
        self.hist.reset();
    }

    /// Number of observations since the last reset.
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Percentile breakdown for reporting.
    pub fn summary(&self) -> LatencySummary {
        LatencySummary::from_histogram(&self.hist)
    }
}

impl fmt::Debug for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Distribution")
            .field("name", &self.name)
            .field("count", &self.hist.len())
            .finish()
    }
}

// ─── LatencySummary ──────────────────────────────────────────────

/// A complete percentile breakdown for one distribution (milliseconds).
/// Serialized straight into the status document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p75: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
}

impl LatencySummary {
    /// Extract a summary from an HdrHistogram.
    /// Returns zeroed values if the histogram is empty.
    fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            count: hist.len(),
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_percentile(50.0),
            p75: hist.value_at_percentile(75.0),
            p90: hist.value_at_percentile(90.0),
            p95: hist.value_at_percentile(95.0),
            p99: hist.value_at_percentile(99.0),
            p999: hist.value_at_percentile(99.9),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            count: 0,
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p75: 0,
            p90: 0,
            p95: 0,
            p99: 0,
            p999: 0,
        }
    }
}
