//! Preconditioners for the iterative global solves.
//!
//! Only the plug-in point and a diagonal (Jacobi) preconditioner live here; the global
//! systems build the diagonal from element blocks without assembling the operator.

use crate::error::LinSysError;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), LinSysError>;
}

pub mod jacobi;

pub use jacobi::Jacobi;
