//! Synthetic log record generator for kafka-log-stream.
//!
//! This crate provides the [`LogGenerator`] which produces HTTP/application log
//! records shaped like what a Kubernetes-hosted service would emit. Generation
//! has no side effects and cannot fail; it only consumes an RNG and the wall
//! clock.
//!
//! # Record layout
//!
//! ```text
//! LogRecord
//! ├── timestamp        RFC 3339, UTC, microseconds
//! ├── correlation_id   UUID v4
//! ├── level            INFO | WARNING | ERROR | DEBUG
//! ├── message          one of MESSAGES
//! ├── pod              { name, namespace, node }
//! ├── request          { method, path, remote_address }
//! ├── response         { status_code, latency_ms }
//! └── metadata         { container_id, image, environment }
//! ```
//!
//! # Example
//!
//! ```rust
//! use log_generator::LogGenerator;
//!
//! let mut generator = LogGenerator::with_seed(42);
//! let record = generator.generate();
//! let payload = record.to_json_bytes().unwrap();
//! assert!(payload.starts_with(b"{\"timestamp\":"));
//! ```

pub mod generator;
pub mod generators;
pub mod record;

// Re-exports for convenience
pub use generator::LogGenerator;
pub use record::{
    ContainerMetadata, Environment, HttpMethod, LogLevel, LogRecord, PodInfo, RequestInfo,
    ResponseInfo,
};
