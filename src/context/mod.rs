//! Construction context for global systems.
//!
//! - [`registry`]: the [`LinSysRegistry`] mapping each [`crate::config::GlobalLinSysKind`] to
//!   the function that builds it.

pub mod registry;

pub use registry::{LinSysCreator, LinSysRegistry};
