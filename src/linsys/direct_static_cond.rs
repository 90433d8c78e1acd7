//! Direct solve of the statically condensed system.
//!
//! Set-up condenses every element, assembles the global Schur complement and factors its
//! free block once. Each solve then
//!
//! 1. eliminates the interior loads from the boundary right-hand side,
//! 2. solves the boundary system,
//! 3. recovers the interior unknowns element by element.

use crate::assembly::GlobalAssembler;
use crate::config::GlobalLinSysKind;
use crate::error::LinSysError;
use crate::key::GlobalLinSysKey;
use crate::linsys::{
    GlobalLinSys, GlobalLinSysHandle, LinSysSetup, SchurOperator, lift_dirichlet, split_dirichlet,
};
use crate::matrix::ElementBlockMatrix;
use crate::solver::LuSolver;
use faer::Mat;
use log::info;

pub struct DirectStaticCond {
    setup: LinSysSetup,
    schur: SchurOperator,
    lu: LuSolver,
    coupling: Mat<f64>,
}

impl DirectStaticCond {
    pub fn new(setup: LinSysSetup) -> Result<Self, LinSysError> {
        setup.validate()?;
        let blocks = setup
            .manager
            .static_cond_blocks(&setup.key, &setup.elements)?;
        let global = GlobalAssembler::new(setup.map.as_ref()).assemble_schur(&blocks)?;
        let (free, coupling) = split_dirichlet(&global, setup.num_dirichlet());
        let lu = LuSolver::factor(free.as_ref())?;
        info!(
            "{} system for {}: {} boundary dofs ({} Dirichlet), {} interior dofs condensed",
            GlobalLinSysKind::DirectStaticCond,
            setup.key.kind(),
            setup.num_global_boundary(),
            setup.num_dirichlet(),
            setup.elements.num_interior()
        );
        let schur = SchurOperator::new(blocks, setup.map.clone())?;
        Ok(Self {
            setup,
            schur,
            lu,
            coupling,
        })
    }

    pub fn create(setup: LinSysSetup) -> Result<GlobalLinSysHandle, LinSysError> {
        Ok(Box::new(Self::new(setup)?))
    }

    pub fn schur(&self) -> &SchurOperator {
        &self.schur
    }
}

impl GlobalLinSys for DirectStaticCond {
    fn kind(&self) -> GlobalLinSysKind {
        GlobalLinSysKind::DirectStaticCond
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
        let condensed = self.schur.condense_rhs(rhs, &self.setup.elements);

        let mut u_free = condensed[n_dir..].to_vec();
        lift_dirichlet(&self.coupling, dirichlet, &mut u_free);
        self.lu.solve_in_place(&mut u_free)?;

        let mut out = vec![0.0; self.num_global_dofs()];
        let nbnd = self.setup.num_global_boundary();
        out[..n_dir].copy_from_slice(dirichlet);
        out[n_dir..nbnd].copy_from_slice(&u_free);
        let u_b = out[..nbnd].to_vec();
        self.schur
            .back_substitute(rhs, &u_b, &self.setup.elements, &mut out);
        Ok(out)
    }

    fn element_block(&self, element: usize) -> Result<ElementBlockMatrix, LinSysError> {
        self.setup.element_block(element)
    }
}
