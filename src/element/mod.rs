//! Element capability interface.
//!
//! Geometry, basis and quadrature live outside this crate. An element only has to report its
//! shape, its local boundary/interior numbering and the factor that maps a reference-element
//! operator onto it; an [`ElementMatrixProvider`] turns operator keys into dense matrices.

use crate::error::LinSysError;
use crate::key::{OperatorKey, OperatorKind};
use crate::matrix::{ElementBlockMatrix, ScaledMatrix};
use crate::robin::{RobinBcInfo, RobinBoundaryConditions};
use faer::Mat;
use std::fmt;

/// Closed set of element shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementShape {
    Segment,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Prism,
    Pyramid,
    Hexahedron,
}

impl ElementShape {
    pub fn dimension(self) -> usize {
        match self {
            ElementShape::Segment => 1,
            ElementShape::Triangle | ElementShape::Quadrilateral => 2,
            ElementShape::Tetrahedron
            | ElementShape::Prism
            | ElementShape::Pyramid
            | ElementShape::Hexahedron => 3,
        }
    }
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the global system needs to know about one element.
pub trait Element: Send + Sync {
    fn shape(&self) -> ElementShape;

    /// Number of modes per direction; together with the shape it fixes the reference basis.
    fn num_modes(&self) -> usize;

    /// Number of quadrature points, used to offset variable coefficients.
    fn num_points(&self) -> usize;

    /// Local indices of the boundary modes, in boundary-local order.
    fn boundary_dofs(&self) -> &[usize];

    /// Local indices of the interior modes, in interior-local order.
    fn interior_dofs(&self) -> &[usize];

    fn coordim(&self) -> usize {
        self.shape().dimension()
    }

    fn num_coeffs(&self) -> usize {
        self.boundary_dofs().len() + self.interior_dofs().len()
    }

    /// Factor mapping the reference-element operator of `kind` onto this element
    /// (the Jacobian for a mass matrix of an affine element).
    fn scale_factor(&self, _kind: OperatorKind) -> f64 {
        1.0
    }

    /// Add the boundary mass term of a Robin condition on `edge` to the boundary-boundary
    /// block `bb` (boundary-local indexing, absolute values).
    fn add_robin_mass(
        &self,
        edge: usize,
        _coefficients: &[f64],
        _bb: &mut Mat<f64>,
    ) -> Result<(), LinSysError> {
        Err(LinSysError::Configuration(format!(
            "{} element does not support Robin conditions (edge {edge})",
            self.shape()
        )))
    }
}

/// Builds reference-element operators.
///
/// Results are cached per [`OperatorKey`] and shared by every element with an equal key, so
/// they must depend on the element only through what the key identifies. Geometry enters
/// later through [`Element::scale_factor`].
pub trait ElementMatrixProvider: Send + Sync {
    fn build_matrix(
        &self,
        key: &OperatorKey,
        element: &dyn Element,
    ) -> Result<ScaledMatrix, LinSysError>;

    fn build_block_matrix(
        &self,
        key: &OperatorKey,
        element: &dyn Element,
    ) -> Result<ElementBlockMatrix, LinSysError> {
        let matrix = self.build_matrix(key, element)?;
        LinSysError::check_len("element matrix rows", element.num_coeffs(), matrix.nrows())?;
        ElementBlockMatrix::from_dense(&matrix, element.boundary_dofs(), element.interior_dofs())
    }
}

/// The elements of one expansion, with their quadrature and interior offsets and any Robin data.
pub struct ElementSet {
    elements: Vec<Box<dyn Element>>,
    phys_offsets: Vec<usize>,
    interior_offsets: Vec<usize>,
    num_interior: usize,
    robin: RobinBoundaryConditions,
}

impl ElementSet {
    pub fn new(elements: Vec<Box<dyn Element>>) -> Self {
        let mut phys_offsets = Vec::with_capacity(elements.len());
        let mut interior_offsets = Vec::with_capacity(elements.len());
        let (mut phys, mut interior) = (0, 0);
        for e in &elements {
            phys_offsets.push(phys);
            interior_offsets.push(interior);
            phys += e.num_points();
            interior += e.interior_dofs().len();
        }
        Self {
            elements,
            phys_offsets,
            interior_offsets,
            num_interior: interior,
            robin: RobinBoundaryConditions::default(),
        }
    }

    pub fn with_robin(mut self, robin: RobinBoundaryConditions) -> Self {
        self.robin = robin;
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, e: usize) -> &dyn Element {
        self.elements[e].as_ref()
    }

    pub fn phys_offset(&self, e: usize) -> usize {
        self.phys_offsets[e]
    }

    /// Offset of the first interior dof of element `e` within the interior part of a global vector.
    pub fn interior_offset(&self, e: usize) -> usize {
        self.interior_offsets[e]
    }

    pub fn num_interior(&self) -> usize {
        self.num_interior
    }

    pub fn robin_contributions(&self, e: usize) -> &[RobinBcInfo] {
        self.robin.contributions(e)
    }
}

impl fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSet")
            .field("num_elements", &self.elements.len())
            .field("num_interior", &self.num_interior)
            .field("robin", &self.robin)
            .finish()
    }
}
