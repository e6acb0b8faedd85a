//! # Controller
//!
//! Core controller modules for the GCP Project Operator.
//!
//! - `backoff`: Fibonacci backoff mechanism for retries
//! - `provisioning`: The project provisioning pipeline
//! - `reconciler`: Controller-facing reconciliation entry point
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod provisioning;
pub mod reconciler;
pub mod server;
