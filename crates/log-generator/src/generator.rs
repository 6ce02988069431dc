//! Main generator producing synthetic log records.

use crate::generators::network::generate_lan_address;
use crate::generators::{numbered_label, one_of};
use crate::record::{
    ContainerMetadata, Environment, HttpMethod, LogLevel, LogRecord, PodInfo, RequestInfo,
    ResponseInfo,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Canned log messages.
pub const MESSAGES: [&str; 5] = [
    "Received incoming HTTP request",
    "Processed request successfully",
    "Failed to process request",
    "Request timeout encountered",
    "Service unavailable",
];

/// Request paths hit by the simulated clients.
pub const PATHS: [&str; 4] = ["/api/resource", "/api/login", "/api/logout", "/api/data"];

/// Response status codes.
pub const STATUS_CODES: [u16; 7] = [200, 201, 400, 401, 403, 404, 500];

/// Kubernetes namespaces pods are spread across.
pub const NAMESPACES: [&str; 4] = ["default", "kube-system", "production", "staging"];

/// Inclusive bounds of the simulated response latency.
pub const LATENCY_MS_MIN: u32 = 10;
pub const LATENCY_MS_MAX: u32 = 1000;

/// Generator of synthetic log records.
///
/// All field choices come from a single `StdRng`. Construct it with
/// [`LogGenerator::with_seed`] to get the same sequence of levels, paths and
/// pods on every run. Correlation ids always come from OS entropy, so two
/// runs with the same seed never publish the same id.
pub struct LogGenerator {
    rng: StdRng,
    generated: u64,
}

impl LogGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a generator with a fixed seed for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self { rng, generated: 0 }
    }

    /// Number of records produced so far.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Generate one record stamped with the current time.
    pub fn generate(&mut self) -> LogRecord {
        self.generate_at(Utc::now())
    }

    /// Generate one record stamped with `timestamp`.
    pub fn generate_at(&mut self, timestamp: DateTime<Utc>) -> LogRecord {
        let rng = &mut self.rng;

        let correlation_id = Uuid::new_v4();
        let level = *one_of(rng, &LogLevel::ALL);
        let message = one_of(rng, &MESSAGES).to_string();

        let request = RequestInfo {
            method: *one_of(rng, &HttpMethod::ALL),
            path: one_of(rng, &PATHS).to_string(),
            remote_address: generate_lan_address(rng),
        };

        let response = ResponseInfo {
            status_code: *one_of(rng, &STATUS_CODES),
            latency_ms: rng.gen_range(LATENCY_MS_MIN..=LATENCY_MS_MAX),
        };

        let pod = PodInfo {
            name: numbered_label(rng, "pod", 1..=100),
            namespace: one_of(rng, &NAMESPACES).to_string(),
            node: numbered_label(rng, "node", 1..=10),
        };

        let metadata = ContainerMetadata {
            container_id: numbered_label(rng, "container", 1000..=9999),
            image: format!("example/image:{}.0", rng.gen_range(1..=5)),
            environment: *one_of(rng, &Environment::ALL),
        };

        self.generated += 1;

        LogRecord {
            timestamp,
            correlation_id,
            level,
            message,
            pod,
            request,
            response,
            metadata,
        }
    }
}

impl Default for LogGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for LogGenerator {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        Some(self.generate())
    }
}
