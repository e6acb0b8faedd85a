//! # Runtime
//!
//! Process-level plumbing around the reconciler.
//!
//! - `initialization`: rustls, tracing, metrics, probe server and client setup
//! - `watch_loop`: the `ClusterDeployment` controller and its restart loop
//! - `error_policy`: requeue decisions and watch stream error reporting

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
