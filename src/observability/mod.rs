//! # Observability
//!
//! Prometheus metrics for the operator. Logging goes through `tracing`,
//! configured in [`crate::runtime::initialization`].

pub mod metrics;

pub use metrics::*;
