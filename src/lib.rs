//! statcond: global linear systems for spectral/hp element discretisations
//!
//! Element operators are built once per distinct operator key, partitioned into boundary
//! and interior blocks, and either assembled as a whole or statically condensed onto the
//! element boundaries. The resulting global system is solved directly (LU over Faer) or
//! iteratively (PCG/GMRES, matrix-free), with interior unknowns recovered element by element.

pub mod assembly;
pub mod cache;
pub mod condense;
pub mod config;
pub mod context;
pub mod core;
pub mod element;
pub mod error;
pub mod key;
pub mod linsys;
pub mod matrix;
pub mod preconditioner;
pub mod robin;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use assembly::{AssemblyMap, GlobalAssembler, LocalToGlobalMap};
pub use cache::MatrixCache;
pub use condense::{StaticCondBlock, condense};
pub use config::*;
pub use context::*;
pub use element::{Element, ElementMatrixProvider, ElementSet, ElementShape};
pub use error::*;
pub use key::{Constant, GlobalLinSysKey, OperatorKey, OperatorKind, VarCoeff};
pub use linsys::{
    GlobalLinSys, GlobalLinSysHandle, LinSysSetup, MatrixManager, create_global_lin_sys,
};
pub use matrix::*;
pub use robin::{RobinBcInfo, RobinBoundaryConditions, inject_robin};

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
