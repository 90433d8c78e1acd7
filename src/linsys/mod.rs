//! Global linear systems over a set of elements.
//!
//! Every variant is built once for a [`GlobalLinSysKey`] and then solved repeatedly for
//! different right-hand sides. Right-hand sides and solutions are global vectors laid out as
//! `[boundary | interior of element 0 | interior of element 1 | ...]`; the first
//! `num_dirichlet()` boundary entries are prescribed rather than solved for.

pub mod direct_full;
pub mod direct_static_cond;
pub mod iterative;
pub mod manager;
pub mod operator;

pub use crate::config::GlobalLinSysKind;
pub use direct_full::DirectFull;
pub use direct_static_cond::DirectStaticCond;
pub use iterative::IterativeSystem;
pub use manager::MatrixManager;
pub use operator::{FreeOperator, FullOperator, GlobalOperator, SchurOperator};

use crate::assembly::LocalToGlobalMap;
use crate::config::SolverOptions;
use crate::context::LinSysRegistry;
use crate::element::ElementSet;
use crate::error::LinSysError;
use crate::key::GlobalLinSysKey;
use crate::matrix::ElementBlockMatrix;
use faer::Mat;
use std::fmt;
use std::sync::Arc;

/// A solvable global system.
pub trait GlobalLinSys: Send + Sync {
    fn kind(&self) -> GlobalLinSysKind;

    fn key(&self) -> &GlobalLinSysKey;

    /// Length of the right-hand side and solution vectors.
    fn num_global_dofs(&self) -> usize;

    fn num_dirichlet(&self) -> usize;

    /// Solve with the leading `dirichlet.len()` boundary values prescribed.
    ///
    /// Entries of `rhs` at Dirichlet positions are ignored; the solution carries the
    /// prescribed values there.
    fn solve_with_dirichlet(&self, rhs: &[f64], dirichlet: &[f64]) -> Result<Vec<f64>, LinSysError>;

    /// Solve with homogeneous Dirichlet values.
    fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, LinSysError> {
        self.solve_with_dirichlet(rhs, &vec![0.0; self.num_dirichlet()])
    }

    /// The block matrix element `element` contributes, for inspection.
    fn element_block(&self, element: usize) -> Result<ElementBlockMatrix, LinSysError>;
}

pub type GlobalLinSysHandle = Box<dyn GlobalLinSys>;

/// Everything a global system is built from.
#[derive(Clone)]
pub struct LinSysSetup {
    pub key: GlobalLinSysKey,
    pub elements: Arc<ElementSet>,
    pub map: Arc<dyn LocalToGlobalMap>,
    pub manager: Arc<MatrixManager>,
    pub options: SolverOptions,
}

impl LinSysSetup {
    pub fn new(
        key: GlobalLinSysKey,
        elements: Arc<ElementSet>,
        map: Arc<dyn LocalToGlobalMap>,
        manager: Arc<MatrixManager>,
    ) -> Self {
        Self {
            key,
            elements,
            map,
            manager,
            options: SolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn num_global_boundary(&self) -> usize {
        self.map.num_global_boundary()
    }

    pub fn num_global_dofs(&self) -> usize {
        self.map.num_global_boundary() + self.elements.num_interior()
    }

    pub fn num_dirichlet(&self) -> usize {
        self.map.num_dirichlet()
    }

    pub(crate) fn validate(&self) -> Result<(), LinSysError> {
        self.options.validate()?;
        LinSysError::check_len(
            "element count of the local-to-global map",
            self.elements.len(),
            self.map.num_elements(),
        )?;
        if self.map.num_dirichlet() > self.map.num_global_boundary() {
            return Err(LinSysError::Configuration(format!(
                "{} Dirichlet dofs exceed the {} global boundary dofs",
                self.map.num_dirichlet(),
                self.map.num_global_boundary()
            )));
        }
        Ok(())
    }

    pub(crate) fn check_rhs(&self, rhs: &[f64], dirichlet: &[f64]) -> Result<(), LinSysError> {
        LinSysError::check_len("right-hand side", self.num_global_dofs(), rhs.len())?;
        LinSysError::check_len("Dirichlet values", self.num_dirichlet(), dirichlet.len())
    }

    pub(crate) fn element_block(&self, element: usize) -> Result<ElementBlockMatrix, LinSysError> {
        if element >= self.elements.len() {
            return Err(LinSysError::Configuration(format!(
                "element {element} out of range for {} elements",
                self.elements.len()
            )));
        }
        self.manager.element_block(&self.key, &self.elements, element)
    }
}

impl fmt::Debug for LinSysSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinSysSetup")
            .field("key", &self.key)
            .field("elements", &self.elements)
            .field("num_global_boundary", &self.map.num_global_boundary())
            .field("num_dirichlet", &self.map.num_dirichlet())
            .field("options", &self.options)
            .finish()
    }
}

/// Build the variant named by `setup.options.kind` through `registry`.
pub fn create_global_lin_sys(
    registry: &LinSysRegistry,
    setup: LinSysSetup,
) -> Result<GlobalLinSysHandle, LinSysError> {
    registry.create(setup)
}

/// Split `a` into its free block `a[n_dir.., n_dir..]` and the coupling `a[n_dir.., ..n_dir]`
/// to the prescribed dofs.
pub(crate) fn split_dirichlet(a: &Mat<f64>, n_dir: usize) -> (Mat<f64>, Mat<f64>) {
    let n_free = a.nrows() - n_dir;
    let free = Mat::from_fn(n_free, n_free, |i, j| a[(n_dir + i, n_dir + j)]);
    let coupling = Mat::from_fn(n_free, n_dir, |i, j| a[(n_dir + i, j)]);
    (free, coupling)
}

/// `b -= coupling · values`
pub(crate) fn lift_dirichlet(coupling: &Mat<f64>, values: &[f64], b: &mut [f64]) {
    for (i, bi) in b.iter_mut().enumerate() {
        for (j, &v) in values.iter().enumerate() {
            *bi -= coupling[(i, j)] * v;
        }
    }
}

/// Evaluate `f` for every element index, in parallel when available.
pub(crate) fn map_elements<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..n).map(f).collect()
    }
}
