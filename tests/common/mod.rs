//! One-dimensional spectral elements for the integration tests.
//!
//! Modes `0` and `1` are the vertex modes `(1 - ξ)/2` and `(1 + ξ)/2`; modes `p >= 2` are the
//! bubbles `L_p(ξ) - L_{p-2}(ξ)`, which vanish at both vertices. Vertex values of a solution
//! are therefore its boundary coefficients.
#![allow(dead_code)]

use faer::Mat;
use statcond::{
    AssemblyMap, Element, ElementMatrixProvider, ElementSet, ElementShape, LinSysError,
    OperatorKey, OperatorKind, RobinBoundaryConditions, ScaledMatrix,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Legendre polynomials `L_0..=L_n` and their derivatives at `x`.
fn legendre(n: usize, x: f64) -> (Vec<f64>, Vec<f64>) {
    let mut l = vec![0.0; n + 1];
    let mut dl = vec![0.0; n + 1];
    l[0] = 1.0;
    if n > 0 {
        l[1] = x;
        dl[1] = 1.0;
    }
    for k in 1..n {
        let kf = k as f64;
        l[k + 1] = ((2.0 * kf + 1.0) * x * l[k] - kf * l[k - 1]) / (kf + 1.0);
        dl[k + 1] = dl[k - 1] + (2.0 * kf + 1.0) * l[k];
    }
    (l, dl)
}

/// Gauss-Legendre points and weights on `[-1, 1]`.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for i in 0..n {
        let mut x = -(std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (l, dl) = legendre(n, x);
            let dx = l[n] / dl[n];
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dl) = legendre(n, x);
        points.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dl[n] * dl[n]));
    }
    (points, weights)
}

/// Basis values `phi[mode][q]` and derivatives at the quadrature points.
pub struct ModalBasis {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
    pub phi: Vec<Vec<f64>>,
    pub dphi: Vec<Vec<f64>>,
}

impl ModalBasis {
    pub fn new(num_modes: usize) -> Self {
        let (points, weights) = gauss_legendre(num_modes + 1);
        let mut phi = vec![Vec::new(); num_modes];
        let mut dphi = vec![Vec::new(); num_modes];
        for &x in &points {
            let (l, dl) = legendre(num_modes, x);
            for p in 0..num_modes {
                let (v, d) = match p {
                    0 => (0.5 * (1.0 - x), -0.5),
                    1 => (0.5 * (1.0 + x), 0.5),
                    _ => (l[p] - l[p - 2], dl[p] - dl[p - 2]),
                };
                phi[p].push(v);
                dphi[p].push(d);
            }
        }
        Self {
            points,
            weights,
            phi,
            dphi,
        }
    }

    fn integrate(&self, f: impl Fn(usize) -> f64) -> f64 {
        self.weights.iter().enumerate().map(|(q, w)| w * f(q)).sum()
    }

    pub fn mass(&self) -> Mat<f64> {
        let n = self.phi.len();
        Mat::from_fn(n, n, |i, j| self.integrate(|q| self.phi[i][q] * self.phi[j][q]))
    }

    pub fn stiffness(&self) -> Mat<f64> {
        let n = self.phi.len();
        Mat::from_fn(n, n, |i, j| self.integrate(|q| self.dphi[i][q] * self.dphi[j][q]))
    }

    /// `∫ φ_i φ_j'`, unit velocity.
    pub fn advection(&self) -> Mat<f64> {
        let n = self.phi.len();
        Mat::from_fn(n, n, |i, j| self.integrate(|q| self.phi[i][q] * self.dphi[j][q]))
    }
}

pub struct Segment {
    pub x0: f64,
    pub x1: f64,
    num_modes: usize,
    boundary: Vec<usize>,
    interior: Vec<usize>,
}

impl Segment {
    pub fn new(x0: f64, x1: f64, num_modes: usize) -> Self {
        Self {
            x0,
            x1,
            num_modes,
            boundary: vec![0, 1],
            interior: (2..num_modes).collect(),
        }
    }

    pub fn jacobian(&self) -> f64 {
        0.5 * (self.x1 - self.x0)
    }
}

impl Element for Segment {
    fn shape(&self) -> ElementShape {
        ElementShape::Segment
    }

    fn num_modes(&self) -> usize {
        self.num_modes
    }

    fn num_points(&self) -> usize {
        self.num_modes + 1
    }

    fn boundary_dofs(&self) -> &[usize] {
        &self.boundary
    }

    fn interior_dofs(&self) -> &[usize] {
        &self.interior
    }

    fn scale_factor(&self, kind: OperatorKind) -> f64 {
        match kind {
            OperatorKind::Mass => self.jacobian(),
            OperatorKind::Laplacian => 1.0 / self.jacobian(),
            _ => 1.0,
        }
    }

    /// A Robin term at a vertex is a point mass on that vertex mode.
    fn add_robin_mass(
        &self,
        edge: usize,
        coefficients: &[f64],
        bb: &mut Mat<f64>,
    ) -> Result<(), LinSysError> {
        if edge > 1 || coefficients.is_empty() {
            return Err(LinSysError::Configuration(format!(
                "segment has no vertex {edge} or no Robin coefficient"
            )));
        }
        bb[(edge, edge)] += coefficients[0];
        Ok(())
    }
}

/// Reference-element operators of [`Segment`].
///
/// Mass and Laplacian matrices are built on `[-1, 1]` and scaled per element. Operators
/// mixing both scalings can only be shared between equally sized elements, so they need the
/// common half-length of a uniform mesh.
#[derive(Default)]
pub struct SegmentProvider {
    pub uniform_jacobian: Option<f64>,
    builds: AtomicUsize,
}

impl SegmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform(jacobian: f64) -> Self {
        Self {
            uniform_jacobian: Some(jacobian),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ElementMatrixProvider for SegmentProvider {
    fn build_matrix(
        &self,
        key: &OperatorKey,
        _element: &dyn Element,
    ) -> Result<ScaledMatrix, LinSysError> {
        let unsupported = || LinSysError::UnsupportedOperator {
            kind: key.kind().to_string(),
            shape: key.shape().to_string(),
        };
        if key.shape() != ElementShape::Segment {
            return Err(unsupported());
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        let basis = ModalBasis::new(key.num_modes());
        let n = key.num_modes();
        let matrix = match key.kind() {
            OperatorKind::Mass => basis.mass(),
            OperatorKind::Laplacian => basis.stiffness(),
            OperatorKind::WeakAdvection => basis.advection(),
            OperatorKind::Helmholtz => {
                let j = self.uniform_jacobian.ok_or_else(unsupported)?;
                let lambda = key.constant(0).ok_or_else(unsupported)?;
                let (m, k) = (basis.mass(), basis.stiffness());
                Mat::from_fn(n, n, |r, c| k[(r, c)] / j + lambda * j * m[(r, c)])
            }
            OperatorKind::AdvectionDiffusionReaction => {
                let j = self.uniform_jacobian.ok_or_else(unsupported)?;
                let eps = key.constant(0).ok_or_else(unsupported)?;
                let sigma = key.constant(1).ok_or_else(unsupported)?;
                let (m, k, a) = (basis.mass(), basis.stiffness(), basis.advection());
                Mat::from_fn(n, n, |r, c| {
                    eps * k[(r, c)] / j + a[(r, c)] + sigma * j * m[(r, c)]
                })
            }
        };
        Ok(ScaledMatrix::unscaled(matrix))
    }
}

/// Which mesh end vertices carry Dirichlet values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirichletEnds {
    None,
    Left,
    Both,
}

/// A 1D mesh of [`Segment`]s with vertices at `nodes`.
pub struct Mesh {
    pub nodes: Vec<f64>,
    pub num_modes: usize,
    pub dirichlet: DirichletEnds,
}

impl Mesh {
    pub fn new(nodes: &[f64], num_modes: usize, dirichlet: DirichletEnds) -> Self {
        Self {
            nodes: nodes.to_vec(),
            num_modes,
            dirichlet,
        }
    }

    /// `n` equal elements on `[a, b]`.
    pub fn uniform(a: f64, b: f64, n: usize, num_modes: usize, dirichlet: DirichletEnds) -> Self {
        let nodes: Vec<f64> = (0..=n).map(|i| a + (b - a) * i as f64 / n as f64).collect();
        Self::new(&nodes, num_modes, dirichlet)
    }

    pub fn num_elements(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn num_dirichlet(&self) -> usize {
        match self.dirichlet {
            DirichletEnds::None => 0,
            DirichletEnds::Left => 1,
            DirichletEnds::Both => 2,
        }
    }

    /// Global boundary index of vertex `v`; Dirichlet vertices come first.
    pub fn global_vertex(&self, v: usize) -> usize {
        let last = self.num_elements();
        match self.dirichlet {
            DirichletEnds::Both if v == 0 => 0,
            DirichletEnds::Both if v == last => 1,
            DirichletEnds::Both => v + 1,
            _ => v,
        }
    }

    pub fn num_boundary(&self) -> usize {
        self.nodes.len()
    }

    pub fn interior_per_element(&self) -> usize {
        self.num_modes - 2
    }

    pub fn num_global_dofs(&self) -> usize {
        self.num_boundary() + self.num_elements() * self.interior_per_element()
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.nodes
            .windows(2)
            .map(|w| Segment::new(w[0], w[1], self.num_modes))
            .collect()
    }

    pub fn element_set(&self, robin: RobinBoundaryConditions) -> ElementSet {
        let elements: Vec<Box<dyn Element>> = self
            .segments()
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn Element>)
            .collect();
        ElementSet::new(elements).with_robin(robin)
    }

    pub fn map(&self) -> AssemblyMap {
        let bmap = (0..self.num_elements())
            .map(|e| vec![self.global_vertex(e), self.global_vertex(e + 1)])
            .collect();
        AssemblyMap::without_signs(bmap, self.num_boundary())
            .and_then(|m| m.with_dirichlet(self.num_dirichlet()))
            .expect("valid mesh map")
    }

    /// Global load vector `∫ f φ_i`.
    pub fn load(&self, f: impl Fn(f64) -> f64) -> Vec<f64> {
        let basis = ModalBasis::new(self.num_modes);
        let nbnd = self.num_boundary();
        let ni = self.interior_per_element();
        let mut rhs = vec![0.0; self.num_global_dofs()];
        for (e, seg) in self.segments().iter().enumerate() {
            let j = seg.jacobian();
            for p in 0..self.num_modes {
                let value: f64 = basis
                    .points
                    .iter()
                    .zip(&basis.weights)
                    .enumerate()
                    .map(|(q, (&xi, &w))| {
                        let x = seg.x0 + (xi + 1.0) * j;
                        w * f(x) * basis.phi[p][q] * j
                    })
                    .sum();
                let g = match p {
                    0 => self.global_vertex(e),
                    1 => self.global_vertex(e + 1),
                    _ => nbnd + e * ni + (p - 2),
                };
                rhs[g] += value;
            }
        }
        rhs
    }

    /// Value of the solution at vertex `v`.
    pub fn vertex_value(&self, solution: &[f64], v: usize) -> f64 {
        solution[self.global_vertex(v)]
    }
}

/// Random vector with entries in `[-1, 1)`.
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}
