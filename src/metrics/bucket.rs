use serde::Serialize;

use super::distribution::{Distribution, LatencySummary};

// ─── Response classes ────────────────────────────────────────────

/// HTTP status class a response is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Other,
}

impl ResponseClass {
    /// Half-open ranges on 200/300/400/500/600; everything else is `Other`.
    pub fn from_status(status: i32) -> Self {
        match status {
            200..=299 => Self::Success,
            300..=399 => Self::Redirect,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

// ─── MetricBucket ────────────────────────────────────────────────

/// Request volume by response class plus a latency distribution.
///
/// Carries no lock of its own. The owning registry mutates buckets only while
/// holding its mutex.
#[derive(Debug)]
pub struct MetricBucket {
    requests: u64,
    responses_2xx: u64,
    responses_3xx: u64,
    responses_4xx: u64,
    responses_5xx: u64,
    responses_xxx: u64,
    latency: Distribution,
}

/// Serializable copy of a bucket's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub requests: u64,
    pub latency: LatencySummary,
    pub responses_2xx: u64,
    pub responses_3xx: u64,
    pub responses_4xx: u64,
    pub responses_5xx: u64,
    pub responses_xxx: u64,
}

impl MetricBucket {
    /// New bucket whose distribution is labelled `name`; starts reset.
    pub fn new(name: impl Into<String>) -> Self {
        let mut bucket = Self {
            requests: 0,
            responses_2xx: 0,
            responses_3xx: 0,
            responses_4xx: 0,
            responses_5xx: 0,
            responses_xxx: 0,
            latency: Distribution::new(name),
        };
        bucket.reset();
        bucket
    }

    pub fn name(&self) -> &str {
        self.latency.name()
    }

    /// Zero every counter and clear the distribution.
    pub fn reset(&mut self) {
        self.requests = 0;
        self.responses_2xx = 0;
        self.responses_3xx = 0;
        self.responses_4xx = 0;
        self.responses_5xx = 0;
        self.responses_xxx = 0;
        self.latency.reset();
    }

    /// Count one completed request. Infallible: every status has a class and
    /// the latency goes to the distribution as-is.
    pub fn record(&mut self, status: i32, latency: i64) {
        self.requests += 1;
        match ResponseClass::from_status(status) {
            ResponseClass::Success => self.responses_2xx += 1,
            ResponseClass::Redirect => self.responses_3xx += 1,
            ResponseClass::ClientError => self.responses_4xx += 1,
            ResponseClass::ServerError => self.responses_5xx += 1,
            ResponseClass::Other => self.responses_xxx += 1,
        }

        self.latency.add(latency);
    }

    /// Raw traffic count, no response outcome attached.
    pub(crate) fn inc_requests(&mut self) {
        self.requests += 1;
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn latency(&self) -> &Distribution {
        &self.latency
    }

    pub fn snapshot(&self) -> BucketSnapshot {
        BucketSnapshot {
            requests: self.requests,
            latency: self.latency.summary(),
            responses_2xx: self.responses_2xx,
            responses_3xx: self.responses_3xx,
            responses_4xx: self.responses_4xx,
            responses_5xx: self.responses_5xx,
            responses_xxx: self.responses_xxx,
        }
    }
}

impl BucketSnapshot {
    /// Sum of the five response classes.
    pub fn responses(&self) -> u64 {
        self.responses_2xx
            + self.responses_3xx
            + self.responses_4xx
            + self.responses_5xx
            + self.responses_xxx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_edges() {
        let cases = [
            (i32::MIN, ResponseClass::Other),
            (-1, ResponseClass::Other),
            (0, ResponseClass::Other),
            (100, ResponseClass::Other),
            (199, ResponseClass::Other),
            (200, ResponseClass::Success),
            (299, ResponseClass::Success),
            (300, ResponseClass::Redirect),
            (399, ResponseClass::Redirect),
            (400, ResponseClass::ClientError),
            (499, ResponseClass::ClientError),
            (500, ResponseClass::ServerError),
            (599, ResponseClass::ServerError),
            (600, ResponseClass::Other),
            (i32::MAX, ResponseClass::Other),
        ];

        for (status, expected) in cases {
            assert_eq!(ResponseClass::from_status(status), expected, "status {status}");
        }
    }

    #[test]
    fn record_increments_exactly_one_class() {
        let mut b = MetricBucket::new("overall");
        b.record(200, 5);
        b.record(302, 5);
        b.record(404, 5);
        b.record(503, 5);
        b.record(600, 5);
        b.record(-7, 5);

        let s = b.snapshot();
        assert_eq!(s.requests, 6);
        assert_eq!(s.responses_2xx, 1);
        assert_eq!(s.responses_3xx, 1);
        assert_eq!(s.responses_4xx, 1);
        assert_eq!(s.responses_5xx, 1);
        assert_eq!(s.responses_xxx, 2);
        assert_eq!(s.responses(), s.requests);
        assert_eq!(s.latency.count, 6);
    }

    #[test]
    fn reset_zeroes_counters_and_latency() {
        let mut b = MetricBucket::new("component.dea");
        b.record(200, 12);
        b.record(500, 40);
        b.reset();

        let s = b.snapshot();
        assert_eq!(s.requests, 0);
        assert_eq!(s.responses(), 0);
        assert_eq!(s.latency, LatencySummary::empty());
        assert_eq!(b.name(), "component.dea");
    }

    #[test]
    fn inc_requests_bypasses_classification() {
        let mut b = MetricBucket::new("overall");
        b.inc_requests();
        assert_eq!(b.requests(), 1);
        assert_eq!(b.snapshot().responses(), 0);
        assert_eq!(b.latency().count(), 0);
    }
}
