//! Robin boundary contributions folded into element boundary blocks before condensation.

use crate::element::Element;
use crate::error::LinSysError;
use crate::matrix::{ElementBlockMatrix, ScaledMatrix};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::sync::Arc;

/// One Robin term on an element edge (a vertex in 1D, a face in 3D).
#[derive(Debug, Clone)]
pub struct RobinBcInfo {
    pub edge: usize,
    pub coefficients: Arc<[f64]>,
}

impl RobinBcInfo {
    pub fn new(edge: usize, coefficients: impl Into<Arc<[f64]>>) -> Self {
        Self {
            edge,
            coefficients: coefficients.into(),
        }
    }
}

/// Ordered Robin terms per element index.
#[derive(Debug, Clone, Default)]
pub struct RobinBoundaryConditions {
    chains: FxHashMap<usize, Vec<RobinBcInfo>>,
}

impl RobinBoundaryConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term to the element's chain; terms are applied in insertion order.
    pub fn push(&mut self, element: usize, info: RobinBcInfo) {
        self.chains.entry(element).or_default().push(info);
    }

    pub fn contributions(&self, element: usize) -> &[RobinBcInfo] {
        self.chains.get(&element).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of elements carrying at least one term.
    pub fn num_elements(&self) -> usize {
        self.chains.len()
    }
}

/// The block actually used for condensation of one element.
///
/// Without Robin terms the input is returned as is. Otherwise the boundary block is copied
/// with its scale multiplied in, each term is added in chain order, and the result replaces
/// the boundary block of a new matrix; `block` itself is never modified.
pub fn inject_robin<'a>(
    block: &'a ElementBlockMatrix,
    element: &dyn Element,
    chain: &[RobinBcInfo],
) -> Result<Cow<'a, ElementBlockMatrix>, LinSysError> {
    if chain.is_empty() {
        return Ok(Cow::Borrowed(block));
    }
    let nb = block.nb();
    let mut bb = block.bb().to_dense();
    for info in chain {
        element.add_robin_mass(info.edge, &info.coefficients, &mut bb)?;
    }
    LinSysError::check_len("Robin-modified boundary block rows", nb, bb.nrows())?;
    LinSysError::check_len("Robin-modified boundary block columns", nb, bb.ncols())?;
    Ok(Cow::Owned(block.with_boundary_block(ScaledMatrix::unscaled(bb))?))
}
