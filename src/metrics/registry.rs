use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::bucket::{BucketSnapshot, MetricBucket};

// ─── Configuration ───────────────────────────────────────────────

/// Tag names recognised by `StatusRegistry::new`.
pub const DEFAULT_TAGS: [&str; 3] = ["component", "framework", "runtime"];

const OVERALL: &str = "overall";

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe request metrics for the whole router.
///
/// One mutex guards the overall bucket, the gauges and every tag bucket, so a
/// `record_response` is visible to readers all at once or not at all.
pub struct StatusRegistry {
    inner: Mutex<Inner>,
}

/// Consistent copy of the registry, serialized as the status document.
///
/// The overall bucket is flattened into the top level.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub overall: BucketSnapshot,
    pub urls: u64,
    #[serde(rename = "droplets")]
    pub backends: u64,
    pub requests_per_sec: u64,
    pub tags: BTreeMap<String, BTreeMap<String, BucketSnapshot>>,
    pub generated_at: DateTime<Utc>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    overall: MetricBucket,
    urls: u64,
    backends: u64,
    requests_per_sec: u64,
    // tag name → tag value → bucket; names fixed at construction
    tags: HashMap<String, HashMap<String, MetricBucket>>,
}

// ─── StatusRegistry impl ─────────────────────────────────────────

impl StatusRegistry {
    /// Registry recognising `component`, `framework` and `runtime`.
    pub fn new() -> Self {
        Self::with_tags(DEFAULT_TAGS)
    }

    /// Registry recognising exactly `names`. The set never changes afterwards.
    pub fn with_tags<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = names
            .into_iter()
            .map(|name| (name.into(), HashMap::new()))
            .collect();

        Self {
            inner: Mutex::new(Inner {
                overall: MetricBucket::new(OVERALL),
                urls: 0,
                backends: 0,
                requests_per_sec: 0,
                tags,
            }),
        }
    }

    /// Count a request without a response outcome.
    pub fn inc_requests(&self) {
        self.inner.lock().overall.inc_requests();
    }

    /// One more known backend instance.
    pub fn inc_backends(&self) {
        self.inner.lock().backends += 1;
    }

    /// One more registered route url.
    pub fn inc_urls(&self) {
        self.inner.lock().urls += 1;
    }

    /// Assigned by an external sampler; never computed here.
    pub fn set_requests_per_sec(&self, value: u64) {
        self.inner.lock().requests_per_sec = value;
    }

    /// Record one completed request against the overall bucket and every
    /// recognised tag.
    ///
    /// A negative `latency` drops the whole call. Unknown tag names are
    /// skipped; the remaining tags are still recorded.
    pub fn record_response<I, K, V>(&self, status: i32, latency: i64, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if latency < 0 {
            tracing::trace!(status, latency, "dropping response with negative latency");
            return;
        }

        let mut inner = self.inner.lock();
        inner.overall.record(status, latency);

        for (name, value) in tags {
            let (name, value) = (name.as_ref(), value.as_ref());
            let Some(values) = inner.tags.get_mut(name) else {
                tracing::trace!(tag = name, "ignoring unknown tag");
                continue;
            };

            if let Some(bucket) = values.get_mut(value) {
                bucket.record(status, latency);
            } else {
                let bucket_name = format!("{name}.{value}");
                tracing::debug!(bucket = %bucket_name, "creating tag bucket");
                let mut bucket = MetricBucket::new(bucket_name);
                bucket.record(status, latency);
                values.insert(value.to_owned(), bucket);
            }
        }
    }

    /// Overall request count, for samplers that don't need a full snapshot.
    pub fn requests(&self) -> u64 {
        self.inner.lock().overall.requests()
    }

    /// Recognised tag names, sorted.
    pub fn known_tags(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().tags.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy of a single tag-value bucket, if it has been observed.
    pub fn tag_bucket(&self, name: &str, value: &str) -> Option<BucketSnapshot> {
        self.inner
            .lock()
            .tags
            .get(name)
            .and_then(|values| values.get(value))
            .map(MetricBucket::snapshot)
    }

    /// Produce a consistent read-only copy of every counter.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn snapshot(&self) -> StatusSnapshot {
        let tags = self
            .tags
            .iter()
            .map(|(name, values)| {
                let values = values
                    .iter()
                    .map(|(value, bucket)| (value.clone(), bucket.snapshot()))
                    .collect();
                (name.clone(), values)
            })
            .collect();

        StatusSnapshot {
            overall: self.overall.snapshot(),
            urls: self.urls,
            backends: self.backends,
            requests_per_sec: self.requests_per_sec,
            tags,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const NO_TAGS: [(&str, &str); 0] = [];

    #[test]
    fn fresh_registry_is_empty() {
        let reg = StatusRegistry::new();
        let snap = reg.snapshot();

        assert_eq!(snap.overall.requests, 0);
        assert_eq!(snap.urls, 0);
        assert_eq!(snap.backends, 0);
        assert_eq!(snap.requests_per_sec, 0);
        assert_eq!(reg.known_tags(), vec!["component", "framework", "runtime"]);
        assert!(snap.tags.values().all(BTreeMap::is_empty));
    }

    #[test]
    fn record_creates_tag_bucket() {
        let reg = StatusRegistry::new();
        reg.record_response(200, 50, [("component", "gorouter")]);

        let snap = reg.snapshot();
        assert_eq!(snap.overall.requests, 1);
        assert_eq!(snap.overall.responses_2xx, 1);

        let bucket = &snap.tags["component"]["gorouter"];
        assert_eq!(bucket.requests, 1);
        assert_eq!(bucket.responses_2xx, 1);
        assert_eq!(bucket.latency.count, 1);
        assert_eq!(bucket.latency.max, 50);
    }

    #[test]
    fn negative_latency_is_a_noop() {
        let reg = StatusRegistry::new();
        reg.record_response(200, 10, [("runtime", "ruby19")]);
        let before = reg.snapshot();

        reg.record_response(500, -1, [("runtime", "ruby19"), ("framework", "sinatra")]);

        let after = reg.snapshot();
        assert_eq!(after.overall, before.overall);
        assert_eq!(after.tags, before.tags);
        assert!(after.tags["framework"].is_empty());
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let reg = StatusRegistry::new();
        reg.record_response(200, 5, [("unknown_tag", "x")]);
        reg.record_response(404, 5, [("unknown_tag", "x"), ("component", "cc")]);

        let snap = reg.snapshot();
        assert_eq!(snap.overall.requests, 2);
        assert_eq!(snap.overall.responses(), 2);
        assert!(!snap.tags.contains_key("unknown_tag"));
        assert_eq!(snap.tags["component"]["cc"].responses_4xx, 1);
        assert!(reg.tag_bucket("unknown_tag", "x").is_none());
    }

    #[test]
    fn custom_tag_set_is_fixed() {
        let reg = StatusRegistry::with_tags(["space"]);
        reg.record_response(200, 1, [("space", "dev"), ("component", "dea")]);

        assert_eq!(reg.known_tags(), vec!["space"]);
        assert_eq!(reg.tag_bucket("space", "dev").map(|b| b.requests), Some(1));
        assert!(reg.tag_bucket("component", "dea").is_none());
    }

    #[test]
    fn same_tag_value_reuses_bucket() {
        let reg = StatusRegistry::new();
        reg.record_response(200, 10, [("component", "gorouter")]);
        reg.record_response(404, 5, [("component", "uaa")]);
        reg.record_response(503, 20, [("component", "gorouter")]);

        // a replacement bucket would have started over at one request
        let bucket = reg.tag_bucket("component", "gorouter").expect("bucket exists");
        assert_eq!(bucket.requests, 2);
        assert_eq!(bucket.responses_2xx, 1);
        assert_eq!(bucket.responses_5xx, 1);
        assert_eq!(bucket.latency.count, 2);
        assert_eq!(reg.snapshot().tags["component"].len(), 2);
    }

    #[test]
    fn bucket_names_join_tag_and_value() {
        let reg = StatusRegistry::new();
        reg.record_response(200, 1, [("framework", "rails")]);

        let inner = reg.inner.lock();
        assert_eq!(inner.overall.name(), "overall");
        assert_eq!(inner.tags["framework"]["rails"].name(), "framework.rails");
    }

    #[test]
    fn gauges_are_independent_of_recording() {
        let reg = StatusRegistry::new();
        reg.inc_backends();
        reg.inc_backends();
        reg.inc_urls();
        reg.set_requests_per_sec(42);
        reg.inc_requests();

        let snap = reg.snapshot();
        assert_eq!(snap.backends, 2);
        assert_eq!(snap.urls, 1);
        assert_eq!(snap.requests_per_sec, 42);
        assert_eq!(snap.overall.requests, 1);
        assert_eq!(snap.overall.responses(), 0);
        assert_eq!(snap.overall.latency.count, 0);
    }

    #[test]
    fn overall_dominates_every_tag_bucket() {
        let reg = StatusRegistry::new();
        reg.record_response(200, 1, [("component", "a")]);
        reg.record_response(200, 1, [("component", "b"), ("runtime", "go")]);
        reg.record_response(200, 1, NO_TAGS);

        let snap = reg.snapshot();
        for values in snap.tags.values() {
            for bucket in values.values() {
                assert!(snap.overall.requests >= bucket.requests);
            }
        }
        assert_eq!(snap.overall.requests, 3);
    }

    #[test]
    fn concurrent_writers_lose_no_updates() {
        const THREADS: u64 = 8;
        const CALLS: u64 = 2_000;

        let reg = StatusRegistry::new();
        let components = ["dea", "cc", "uaa", "router"];

        let valid: u64 = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|id| {
                    let reg = &reg;
                    s.spawn(move || {
                        let mut rng = StdRng::seed_from_u64(1000 + id);
                        let mut valid = 0;
                        for _ in 0..CALLS {
                            let status = rng.gen_range(-50..700);
                            let latency = rng.gen_range(-5i64..500);
                            let component = components[rng.gen_range(0..components.len())];
                            if latency >= 0 {
                                valid += 1;
                            }
                            reg.record_response(status, latency, [("component", component)]);
                        }
                        valid
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("writer panicked")).sum()
        });

        let snap = reg.snapshot();
        assert_eq!(snap.overall.requests, valid);
        assert_eq!(snap.overall.responses(), valid);
        assert_eq!(snap.overall.latency.count, valid);

        let tagged: u64 = snap.tags["component"].values().map(|b| b.requests).sum();
        assert_eq!(tagged, valid);
    }

    #[test]
    fn snapshot_serializes_flat() {
        let reg = StatusRegistry::new();
        reg.inc_backends();
        reg.record_response(301, 3, [("runtime", "node")]);

        let json = serde_json::to_value(reg.snapshot()).expect("serializable");
        assert_eq!(json["requests"], 1);
        assert_eq!(json["responses_3xx"], 1);
        assert_eq!(json["droplets"], 1);
        assert_eq!(json["latency"]["count"], 1);
        assert_eq!(json["tags"]["runtime"]["node"]["responses_3xx"], 1);
        assert!(json.get("overall").is_none());
        assert!(json.get("backends").is_none());
    }
}
