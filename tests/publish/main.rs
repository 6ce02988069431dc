//! Publish loop tests against in-memory collaborators.
//!
//! All tests run on a paused tokio clock, so pacing and idle sleeps complete
//! instantly while timestamps stay exact.

mod provisioning;
mod publish_loop;
