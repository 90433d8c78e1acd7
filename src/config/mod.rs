pub mod options;

pub use options::{GlobalLinSysKind, KrylovMethod, PreconditionerKind, SolverOptions};
