//! # Reconciler
//!
//! Controller-facing wrapper around the provisioning pipeline: builds the
//! request from the watched object, runs a pass and tracks per-object backoff.

mod reconcile;
mod types;

pub use reconcile::reconcile;
pub use types::{BackoffState, Reconciler, ReconcilerError};
