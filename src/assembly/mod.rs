//! Local-to-global numbering and the additive global scatter.

pub mod assembler;
pub mod map;

pub use assembler::GlobalAssembler;
pub use map::{AssemblyMap, LocalToGlobalMap};
