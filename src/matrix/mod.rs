//! Matrix module: scaled dense matrices and element block matrices.

pub mod block;
pub mod scaled;

pub use block::ElementBlockMatrix;
pub use scaled::ScaledMatrix;
