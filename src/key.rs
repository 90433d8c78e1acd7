//! Operator descriptors used as cache identities.
//!
//! An [`OperatorKey`] identifies one element matrix: operator kind, element shape and order,
//! scalar constants and variable-coefficient arrays. A [`GlobalLinSysKey`] is the same thing
//! without the element part, shared by every element of one assembled system.

use crate::element::{Element, ElementShape};
use crate::error::LinSysError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Operators the global systems know how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatorKind {
    Mass,
    Laplacian,
    /// `∇² u - λ u`, weak form `L + λ M`; constant 0 is `λ`.
    Helmholtz,
    /// Weak advection with velocity components given as variable coefficients.
    WeakAdvection,
    /// Advection-diffusion-reaction; constants are `(diffusivity, reaction)`.
    AdvectionDiffusionReaction,
}

impl OperatorKind {
    pub fn is_symmetric(self) -> bool {
        matches!(
            self,
            OperatorKind::Mass | OperatorKind::Laplacian | OperatorKind::Helmholtz
        )
    }

    /// Minimum number of scalar constants the operator needs.
    pub fn required_constants(self) -> usize {
        match self {
            OperatorKind::Mass | OperatorKind::Laplacian | OperatorKind::WeakAdvection => 0,
            OperatorKind::Helmholtz => 1,
            OperatorKind::AdvectionDiffusionReaction => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::Mass => "Mass",
            OperatorKind::Laplacian => "Laplacian",
            OperatorKind::Helmholtz => "Helmholtz",
            OperatorKind::WeakAdvection => "WeakAdvection",
            OperatorKind::AdvectionDiffusionReaction => "AdvectionDiffusionReaction",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperatorKind {
    type Err = LinSysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mass" => Ok(OperatorKind::Mass),
            "Laplacian" => Ok(OperatorKind::Laplacian),
            "Helmholtz" => Ok(OperatorKind::Helmholtz),
            "WeakAdvection" => Ok(OperatorKind::WeakAdvection),
            "AdvectionDiffusionReaction" => Ok(OperatorKind::AdvectionDiffusionReaction),
            other => Err(LinSysError::Configuration(format!(
                "unknown operator kind '{other}'"
            ))),
        }
    }
}

/// A scalar constant compared by value.
///
/// Uses the IEEE total order, so `-0.0` and `0.0` are distinct keys and `NaN` equals itself.
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub f64);

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Constant {}

impl PartialOrd for Constant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// A view into an externally owned coefficient array, starting at `offset`.
///
/// Two coefficients are equal iff they alias the same allocation at the same offset; the
/// values themselves are never compared.
#[derive(Debug, Clone)]
pub struct VarCoeff {
    data: Arc<[f64]>,
    offset: usize,
}

impl VarCoeff {
    pub fn new(data: Arc<[f64]>) -> Self {
        Self { data, offset: 0 }
    }

    /// The same array viewed `n` points further along.
    pub fn offset_by(&self, n: usize) -> Self {
        Self {
            data: Arc::clone(&self.data),
            offset: self.offset + n,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Values from the offset to the end of the array.
    pub fn values(&self) -> &[f64] {
        &self.data[self.offset.min(self.data.len())..]
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.data) as *const f64 as usize
    }
}

impl PartialEq for VarCoeff {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr() && self.offset == other.offset
    }
}

impl Eq for VarCoeff {}

impl PartialOrd for VarCoeff {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VarCoeff {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.addr(), self.offset).cmp(&(other.addr(), other.offset))
    }
}

impl Hash for VarCoeff {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
        self.offset.hash(state);
    }
}

/// Identity of one element matrix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperatorKey {
    kind: OperatorKind,
    shape: ElementShape,
    num_modes: usize,
    constants: Vec<Constant>,
    varcoeffs: Vec<VarCoeff>,
}

impl OperatorKey {
    pub fn new(
        kind: OperatorKind,
        shape: ElementShape,
        num_modes: usize,
        constants: &[f64],
        varcoeffs: Vec<VarCoeff>,
    ) -> Self {
        Self {
            kind,
            shape,
            num_modes,
            constants: constants.iter().copied().map(Constant).collect(),
            varcoeffs,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    pub fn num_modes(&self) -> usize {
        self.num_modes
    }

    pub fn constant(&self, i: usize) -> Option<f64> {
        self.constants.get(i).map(|c| c.0)
    }

    pub fn num_constants(&self) -> usize {
        self.constants.len()
    }

    pub fn varcoeffs(&self) -> &[VarCoeff] {
        &self.varcoeffs
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{} p={}", self.kind, self.shape, self.num_modes)?;
        for c in &self.constants {
            write!(f, " {}", c.0)?;
        }
        if !self.varcoeffs.is_empty() {
            write!(f, " +{} varcoeffs", self.varcoeffs.len())?;
        }
        f.write_str("]")
    }
}

/// Identity of an assembled global system: the element-independent part of an [`OperatorKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalLinSysKey {
    kind: OperatorKind,
    constants: Vec<Constant>,
    varcoeffs: Vec<VarCoeff>,
}

impl GlobalLinSysKey {
    pub fn new(kind: OperatorKind, constants: &[f64]) -> Result<Self, LinSysError> {
        if constants.len() < kind.required_constants() {
            return Err(LinSysError::Configuration(format!(
                "{kind} operator needs {} constant(s), got {}",
                kind.required_constants(),
                constants.len()
            )));
        }
        Ok(Self {
            kind,
            constants: constants.iter().copied().map(Constant).collect(),
            varcoeffs: Vec::new(),
        })
    }

    pub fn with_varcoeffs(mut self, varcoeffs: Vec<VarCoeff>) -> Self {
        self.varcoeffs = varcoeffs;
        self
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    pub fn constants(&self) -> Vec<f64> {
        self.constants.iter().map(|c| c.0).collect()
    }

    pub fn varcoeffs(&self) -> &[VarCoeff] {
        &self.varcoeffs
    }

    /// Key of the element matrix for `element`, whose quadrature points start at
    /// `phys_offset` in the variable-coefficient arrays.
    pub fn operator_key(&self, element: &dyn Element, phys_offset: usize) -> OperatorKey {
        OperatorKey {
            kind: self.kind,
            shape: element.shape(),
            num_modes: element.num_modes(),
            constants: self.constants.clone(),
            varcoeffs: self
                .varcoeffs
                .iter()
                .map(|v| v.offset_by(phys_offset))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(t: &T) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    #[test]
    fn keys_compare_structurally() {
        let a = OperatorKey::new(OperatorKind::Helmholtz, ElementShape::Segment, 4, &[1.0], vec![]);
        let b = OperatorKey::new(OperatorKind::Helmholtz, ElementShape::Segment, 4, &[1.0], vec![]);
        let c = OperatorKey::new(OperatorKind::Helmholtz, ElementShape::Segment, 4, &[2.0], vec![]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn varcoeffs_compare_by_identity_and_offset() {
        let data: Arc<[f64]> = Arc::from(vec![1.0, 2.0, 3.0]);
        let same_values: Arc<[f64]> = Arc::from(vec![1.0, 2.0, 3.0]);
        let v = VarCoeff::new(Arc::clone(&data));
        assert_eq!(v, VarCoeff::new(Arc::clone(&data)));
        assert_ne!(v, VarCoeff::new(same_values));
        assert_ne!(v, v.offset_by(1));
        assert_eq!(v.offset_by(2).values(), &[3.0]);
    }

    #[test]
    fn global_key_validates_constants() {
        assert!(GlobalLinSysKey::new(OperatorKind::Helmholtz, &[]).is_err());
        assert!(GlobalLinSysKey::new(OperatorKind::Mass, &[]).is_ok());
    }

    #[test]
    fn unknown_operator_name_is_a_configuration_error() {
        assert_eq!("Helmholtz".parse::<OperatorKind>().unwrap(), OperatorKind::Helmholtz);
        assert!(matches!(
            "Poisson".parse::<OperatorKind>(),
            Err(LinSysError::Configuration(_))
        ));
    }
}
