//! Direct solve of the complete system, interior dofs included.
//!
//! No condensation takes place; the global operator is assembled from the element blocks and
//! factored as a whole. Cheaper to set up than the condensed variant when elements are few and
//! of low order.

use crate::assembly::GlobalAssembler;
use crate::config::GlobalLinSysKind;
use crate::error::LinSysError;
use crate::key::GlobalLinSysKey;
use crate::linsys::{GlobalLinSys, GlobalLinSysHandle, LinSysSetup, lift_dirichlet, split_dirichlet};
use crate::matrix::ElementBlockMatrix;
use crate::solver::LuSolver;
use faer::Mat;
use log::info;

pub struct DirectFull {
    setup: LinSysSetup,
    lu: LuSolver,
    coupling: Mat<f64>,
}

impl DirectFull {
    pub fn new(setup: LinSysSetup) -> Result<Self, LinSysError> {
        setup.validate()?;
        let blocks = setup.manager.element_blocks(&setup.key, &setup.elements)?;
        let global =
            GlobalAssembler::new(setup.map.as_ref()).assemble_full(&blocks, &setup.elements)?;
        let (free, coupling) = split_dirichlet(&global, setup.num_dirichlet());
        let lu = LuSolver::factor(free.as_ref())?;
        info!(
            "{} system for {}: {} dofs ({} Dirichlet)",
            GlobalLinSysKind::DirectFull,
            setup.key.kind(),
            setup.num_global_dofs(),
            setup.num_dirichlet()
        );
        Ok(Self {
            setup,
            lu,
            coupling,
        })
    }

    pub fn create(setup: LinSysSetup) -> Result<GlobalLinSysHandle, LinSysError> {
        Ok(Box::new(Self::new(setup)?))
    }
}

impl GlobalLinSys for DirectFull {
    fn kind(&self) -> GlobalLinSysKind {
        GlobalLinSysKind::DirectFull
    }

    fn key(&self) -> &GlobalLinSysKey {
        &self.setup.key
    }

    fn num_global_dofs(&self) -> usize {
        self.setup.num_global_dofs()
    }

    fn num_dirichlet(&self) -> usize {
        self.setup.num_dirichlet()
    }

    fn solve_with_dirichlet(&self, rhs: &[f64], dirichlet: &[f64]) -> Result<Vec<f64>, LinSysError> {
        self.setup.check_rhs(rhs, dirichlet)?;
        let n_dir = dirichlet.len();
        let mut u_free = rhs[n_dir..].to_vec();
        lift_dirichlet(&self.coupling, dirichlet, &mut u_free);
        self.lu.solve_in_place(&mut u_free)?;
        let mut out = Vec::with_capacity(rhs.len());
        out.extend_from_slice(dirichlet);
        out.extend_from_slice(&u_free);
        Ok(out)
    }

    fn element_block(&self, element: usize) -> Result<ElementBlockMatrix, LinSysError> {
        self.setup.element_block(element)
    }
}
