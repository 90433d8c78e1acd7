//! Krylov solves of the full or condensed system, applied matrix-free.
//!
//! The operator is never assembled: each product gathers the global vector into the
//! elements, applies their blocks and scatters back. The diagonal preconditioner uses the
//! assembled diagonal, accumulated from the element blocks the same way.

use crate::config::{GlobalLinSysKind, KrylovMethod, PreconditionerKind};
use crate::error::LinSysError;
use crate::key::GlobalLinSysKey;
use crate::linsys::{
    FreeOperator, FullOperator, GlobalLinSys, GlobalLinSysHandle, GlobalOperator, LinSysSetup,
    SchurOperator,
};
use crate::matrix::ElementBlockMatrix;
use crate::preconditioner::{Jacobi, Preconditioner};
use crate::solver::{GmresSolver, LinearSolver, PcgSolver};
use crate::utils::SolveStats;
use log::{debug, info};

enum Operator {
    Full(FullOperator),
    StaticCond(SchurOperator),
}

impl Operator {
    fn as_dyn(&self) -> &dyn GlobalOperator {
        match self {
            Operator::Full(op) => op as &dyn GlobalOperator,
            Operator::StaticCond(op) => op as &dyn GlobalOperator,
        }
    }
}

/// `IterativeFull` or `IterativeStaticCond`, depending on the kind it was created with.
pub struct IterativeSystem {
    setup: LinSysSetup,
    operator: Operator,
    method: KrylovMethod,
    jacobi: Option<Jacobi<f64>>,
}

impl IterativeSystem {
    pub fn new(setup: LinSysSetup) -> Result<Self, LinSysError> {
        setup.validate()?;
        let operator = match setup.options.kind {
            GlobalLinSysKind::IterativeFull => {
                let blocks = setup.manager.element_blocks(&setup.key, &setup.elements)?;
                Operator::Full(FullOperator::new(blocks, setup.map.as_ref(), &setup.elements)?)
            }
            GlobalLinSysKind::IterativeStaticCond => {
                let blocks = setup
                    .manager
                    .static_cond_blocks(&setup.key, &setup.elements)?;
                Operator::StaticCond(SchurOperator::new(blocks, setup.map.clone())?)
            }
            other => {
                return Err(LinSysError::Configuration(format!(
                    "{other} is not an iterative global system"
                )));
            }
        };
        let method = setup.options.krylov.unwrap_or(if setup.key.kind().is_symmetric() {
            KrylovMethod::Pcg
        } else {
            KrylovMethod::Gmres
        });
        let jacobi = match setup.options.preconditioner {
            PreconditionerKind::Null => None,
            PreconditionerKind::Diagonal => {
                let free = FreeOperator::new(operator.as_dyn(), setup.num_dirichlet());
                Some(Jacobi::from_diagonal(&free.diagonal()?))
            }
        };
        info!(
            "{} system for {}: {} unknowns, {:?} with {:?} preconditioner",
            setup.options.kind,
            setup.key.kind(),
            operator.as_dyn().size() - setup.num_dirichlet(),
            method,
            setup.options.preconditioner
        );
        Ok(Self {
            setup,
            operator,
            method,
            jacobi,
        })
    }

    pub fn create(setup: LinSysSetup) -> Result<GlobalLinSysHandle, LinSysError> {
        Ok(Box::new(Self::new(setup)?))
    }

    pub fn method(&self) -> KrylovMethod {
        self.method
    }

    /// Solve `A_free x = b` on the unknown dofs.
    fn krylov_solve<'a>(
        &self,
        free: &FreeOperator<'a>,
        b: &Vec<f64>,
    ) -> Result<Vec<f64>, LinSysError> {
        let opts = &self.setup.options;
        let pc = self
            .jacobi
            .as_ref()
            .map(|j| j as &dyn Preconditioner<FreeOperator<'a>, Vec<f64>>);
        let mut x = vec![0.0; b.len()];
        let stats: SolveStats<f64> = match self.method {
            KrylovMethod::Pcg => {
                PcgSolver::new(opts.tol, opts.max_iters).solve(free, pc, b, &mut x)?
            }
            KrylovMethod::Gmres => {
                GmresSolver::new(opts.restart, opts.tol, opts.max_iters).solve(free, pc, b, &mut x)?
            }
        };
        if !stats.converged {
            return Err(LinSysError::NotConverged {
                iterations: stats.iterations,
                residual: stats.final_residual,
            });
        }
        debug!(
            "{:?} converged in {} iterations (residual {:e})",
            self.method, stats.iterations, stats.final_residual
        );
        Ok(x)
    }
}

impl GlobalLinSys for IterativeSystem {
    fn kind(&self) -> GlobalLinSysKind {
        match self.operator {
            Operator::Full(_) => GlobalLinSysKind::IterativeFull,
            Operator::StaticCond(_) => GlobalLinSysKind::IterativeStaticCond,
        }
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
        let op = self.operator.as_dyn();
        let free = FreeOperator::new(op, n_dir);

        let reduced = match &self.operator {
            Operator::Full(_) => rhs.to_vec(),
            Operator::StaticCond(schur) => schur.condense_rhs(rhs, &self.setup.elements),
        };
        let mut b = reduced[n_dir..].to_vec();
        if dirichlet.iter().any(|&v| v != 0.0) {
            let load = free.dirichlet_load(dirichlet);
            b.iter_mut().zip(&load).for_each(|(bi, li)| *bi -= li);
        }
        let x_free = self.krylov_solve(&free, &b)?;

        let mut out = vec![0.0; self.num_global_dofs()];
        out[..n_dir].copy_from_slice(dirichlet);
        out[n_dir..n_dir + x_free.len()].copy_from_slice(&x_free);
        if let Operator::StaticCond(schur) = &self.operator {
            let u_b = out[..self.setup.num_global_boundary()].to_vec();
            schur.back_substitute(rhs, &u_b, &self.setup.elements, &mut out);
        }
        Ok(out)
    }

    fn element_block(&self, element: usize) -> Result<ElementBlockMatrix, LinSysError> {
        self.setup.element_block(element)
    }
}
