//! End-to-end tests against a running Kafka broker.
//!
//! These need a broker at `kafka:9092` (or `KAFKA_BROKERS`) and are ignored by
//! default. Run them with `cargo test --test broker -- --ignored`.
