//! Preconditioned Conjugate Gradient (PCG) per Saad §9.2

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::LinSysError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};
use log::debug;

pub struct PcgSolver<T> {
    pub conv: Convergence<T>,
    /// Unpreconditioned residual norms, starting with the initial one.
    pub residual_history: Vec<T>,
}

impl<T: Copy + num_traits::Float> PcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            conv: Convergence { tol, max_iters },
            residual_history: Vec::new(),
        }
    }
}

impl<M, V, T> LinearSolver<M, V> for PcgSolver<T>
where
    M: MatVec<V>,
    (): InnerProduct<V, Scalar = T>,
    V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone,
    T: num_traits::Float + Clone + From<f64> + std::fmt::Debug,
{
    type Error = LinSysError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<T>, LinSysError> {
        let n = b.as_ref().len();
        LinSysError::check_len("PCG initial guess", n, x.as_ref().len())?;
        let ip = ();

        if ip.norm(b) == T::zero() {
            x.as_mut().iter_mut().for_each(|xi| *xi = T::zero());
            return Ok(SolveStats {
                iterations: 0,
                final_residual: T::zero(),
                converged: true,
            });
        }

        let mut x_vec = x.as_ref().to_vec();
        let mut r = {
            let mut tmp = V::from(vec![T::zero(); n]);
            a.matvec(&V::from(x_vec.clone()), &mut tmp);
            let r_vec = tmp
                .as_ref()
                .iter()
                .zip(b.as_ref())
                .map(|(&ax, &bi)| bi - ax)
                .collect::<Vec<_>>();
            V::from(r_vec)
        };
        let mut z = V::from(vec![T::zero(); n]);
        match pc {
            Some(pc) => pc.apply(&r, &mut z)?,
            None => z.clone_from(&r),
        }
        let mut p = z.clone();
        let mut rz = ip.dot(&r, &z);

        let res0 = ip.norm(&r);
        let mut stats = SolveStats {
            iterations: 0,
            final_residual: res0,
            converged: res0 == T::zero(),
        };
        self.residual_history.push(res0);
        if stats.converged {
            return Ok(stats);
        }

        for i in 0..self.conv.max_iters {
            let mut ap = V::from(vec![T::zero(); n]);
            a.matvec(&p, &mut ap);
            let p_dot_ap = ip.dot(&p, &ap);
            if p_dot_ap <= T::zero() {
                return Err(LinSysError::IndefiniteMatrix);
            }
            let alpha = rz / p_dot_ap;
            for (xj, pj) in x_vec.iter_mut().zip(p.as_ref()) {
                *xj = *xj + alpha * *pj;
            }
            for (rj, apj) in r.as_mut().iter_mut().zip(ap.as_ref()) {
                *rj = *rj - alpha * *apj;
            }
            match pc {
                Some(pc) => pc.apply(&r, &mut z)?,
                None => z.clone_from(&r),
            }
            let rz_new = ip.dot(&r, &z);
            let res_norm = ip.norm(&r);
            self.residual_history.push(res_norm);
            let (stop, s) = self.conv.check(res_norm, res0, i + 1);
            stats = s;
            if stop {
                break;
            }
            let beta = rz_new / rz;
            if beta < T::zero() {
                return Err(LinSysError::IndefinitePreconditioner);
            }
            for (pj, zj) in p.as_mut().iter_mut().zip(z.as_ref()) {
                *pj = *zj + beta * *pj;
            }
            rz = rz_new;
        }
        debug!(
            "PCG finished after {} iterations, residual {:?}, converged: {}",
            stats.iterations, stats.final_residual, stats.converged
        );
        *x = V::from(x_vec);
        Ok(stats)
    }
}
