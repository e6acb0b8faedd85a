//! # Configuration
//!
//! - `controller`: runtime settings read from the environment
//! - `policy`: fixed provisioning tables (roles, regions, names)

mod controller;
mod policy;

pub use controller::ControllerConfig;
pub use policy::OperatorPolicy;
