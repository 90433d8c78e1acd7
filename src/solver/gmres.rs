//! Restarted GMRES with optional right preconditioning (Saad §6.4, §9.3.2)
//!
//! Used for the global systems of non-self-adjoint operators (advection, ADR), where the
//! assembled Schur complement is not symmetric and CG does not apply.
//!
//! # Features
//! - Right preconditioning, so the monitored residual is the true residual
//! - Double Gram-Schmidt orthogonalization
//! - Happy breakdown detection
//! - Givens rotations for the least-squares update
//!
//! # References
//! - Saad, Y. (2003). Iterative Methods for Sparse Linear Systems, 2nd Edition. SIAM.

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::LinSysError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};
use log::debug;
use num_traits::Float;

pub struct GmresSolver<T> {
    /// Number of Arnoldi vectors before restart
    pub restart: usize,
    pub conv: Convergence<T>,
}

impl<T: Copy + Float> GmresSolver<T> {
    pub fn new(restart: usize, tol: T, max_iters: usize) -> Self {
        Self {
            restart: restart.max(1),
            conv: Convergence { tol, max_iters },
        }
    }

    /// Apply the previous rotations to column `j` of `h`, then build and apply a new one.
    fn apply_givens_and_update_g(
        h: &mut [Vec<T>],
        g: &mut [T],
        cs: &mut [T],
        sn: &mut [T],
        j: usize,
        epsilon: T,
    ) {
        for i in 0..j {
            let temp = cs[i] * h[i][j] + sn[i] * h[i + 1][j];
            h[i + 1][j] = -sn[i] * h[i][j] + cs[i] * h[i + 1][j];
            h[i][j] = temp;
        }
        let h_kk = h[j][j];
        let h_k1k = h[j + 1][j];
        let r = (h_kk * h_kk + h_k1k * h_k1k).sqrt();
        if r.abs() < epsilon {
            cs[j] = T::one();
            sn[j] = T::zero();
        } else {
            cs[j] = h_kk / r;
            sn[j] = h_k1k / r;
        }
        h[j][j] = cs[j] * h_kk + sn[j] * h_k1k;
        h[j + 1][j] = T::zero();
        let temp = cs[j] * g[j] + sn[j] * g[j + 1];
        g[j + 1] = -sn[j] * g[j] + cs[j] * g[j + 1];
        g[j] = temp;
    }

    /// Solve the upper-triangular system `H y = g`, skipping vanishing pivots.
    fn back_substitution(h: &[Vec<T>], g: &[T], y: &mut [T], m: usize, epsilon: T) {
        for i in (0..m).rev() {
            y[i] = g[i];
            for j in (i + 1)..m {
                y[i] = y[i] - h[i][j] * y[j];
            }
            if h[i][i].abs() > epsilon {
                y[i] = y[i] / h[i][i];
            } else {
                y[i] = T::zero();
            }
        }
    }
}

fn residual<M, V, T>(a: &M, b: &V, x: &[T]) -> V
where
    M: MatVec<V>,
    V: AsRef<[T]> + From<Vec<T>>,
    T: Float,
{
    let n = x.len();
    let mut tmp = V::from(vec![T::zero(); n]);
    a.matvec(&V::from(x.to_vec()), &mut tmp);
    V::from(
        tmp.as_ref()
            .iter()
            .zip(b.as_ref())
            .map(|(&ax, &bi)| bi - ax)
            .collect::<Vec<_>>(),
    )
}

impl<M, V, T> LinearSolver<M, V> for GmresSolver<T>
where
    M: MatVec<V>,
    (): InnerProduct<V, Scalar = T>,
    V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone,
    T: Float + From<f64> + std::fmt::Debug,
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
        LinSysError::check_len("GMRES initial guess", n, x.as_ref().len())?;
        let ip = ();
        let epsilon: T = From::from(1e-14);

        if ip.norm(b) == T::zero() {
            x.as_mut().iter_mut().for_each(|xi| *xi = T::zero());
            return Ok(SolveStats {
                iterations: 0,
                final_residual: T::zero(),
                converged: true,
            });
        }

        let mut xk = x.as_ref().to_vec();
        let mut r0 = residual(a, b, &xk);
        let mut beta = ip.norm(&r0);
        let res0 = beta;
        let mut stats = SolveStats {
            iterations: 0,
            final_residual: beta,
            converged: beta == T::zero(),
        };
        let mut iteration = 0;

        while !stats.converged && iteration < self.conv.max_iters {
            let mut v_basis: Vec<V> = Vec::with_capacity(self.restart + 1);
            // z_j = M⁻¹ v_j, the directions the solution is updated along
            let mut z_basis: Vec<V> = Vec::with_capacity(self.restart);
            v_basis.push(V::from(
                r0.as_ref().iter().map(|&ri| ri / beta).collect::<Vec<_>>(),
            ));

            let mut h = vec![vec![T::zero(); self.restart]; self.restart + 1];
            let mut g = vec![T::zero(); self.restart + 1];
            g[0] = beta;
            let mut cs = vec![T::zero(); self.restart];
            let mut sn = vec![T::zero(); self.restart];
            let mut m = 0;

            for j in 0..self.restart {
                if iteration >= self.conv.max_iters {
                    break;
                }
                iteration += 1;
                let mut z = V::from(vec![T::zero(); n]);
                match pc {
                    Some(pc) => pc.apply(&v_basis[j], &mut z)?,
                    None => z.clone_from(&v_basis[j]),
                }
                let mut w = V::from(vec![T::zero(); n]);
                a.matvec(&z, &mut w);
                z_basis.push(z);

                for _pass in 0..2 {
                    for i in 0..=j {
                        let hij = ip.dot(&w, &v_basis[i]);
                        h[i][j] = h[i][j] + hij;
                        for (wk, vik) in w.as_mut().iter_mut().zip(v_basis[i].as_ref()) {
                            *wk = *wk - hij * *vik;
                        }
                    }
                }
                h[j + 1][j] = ip.norm(&w);
                let happy_breakdown = h[j + 1][j].abs() < epsilon;
                if !happy_breakdown {
                    let hn = h[j + 1][j];
                    v_basis.push(V::from(
                        w.as_ref().iter().map(|&wi| wi / hn).collect::<Vec<_>>(),
                    ));
                }

                Self::apply_givens_and_update_g(&mut h, &mut g, &mut cs, &mut sn, j, epsilon);
                m = j + 1;
                let (stop, _) = self.conv.check(g[j + 1].abs(), res0, iteration);
                if stop || happy_breakdown {
                    break;
                }
            }

            let mut y = vec![T::zero(); m];
            Self::back_substitution(&h, &g, &mut y, m, epsilon);
            for (yj, zj) in y.iter().zip(&z_basis) {
                for (xi, zji) in xk.iter_mut().zip(zj.as_ref()) {
                    *xi = *xi + *yj * *zji;
                }
            }

            r0 = residual(a, b, &xk);
            beta = ip.norm(&r0);
            let (_, s) = self.conv.check(beta, res0, iteration);
            stats = s;
            if m == 0 {
                break;
            }
        }
        debug!(
            "GMRES({}) finished after {} iterations, residual {:?}, converged: {}",
            self.restart, stats.iterations, stats.final_residual, stats.converged
        );
        *x = V::from(xk);
        Ok(stats)
    }
}
