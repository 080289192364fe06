pub mod bucket;
pub mod distribution;
pub mod registry;
pub mod sampler;
pub mod stream;

pub use bucket::{BucketSnapshot, MetricBucket, ResponseClass};
pub use distribution::{Distribution, LatencySummary};
pub use registry::{StatusRegistry, StatusSnapshot, DEFAULT_TAGS};
