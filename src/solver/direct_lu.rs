//! Dense LU with partial pivoting, backed by Faer.
//!
//! Used for the assembled global systems and for element interior blocks. The
//! factorization is computed once and reused for every right-hand side afterwards.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs
//! - Golub & Van Loan, Matrix Computations

use crate::error::LinSysError;
use faer::linalg::solvers::{DenseSolveCore, PartialPivLu, SolveCore};
use faer::{Conj, Mat, MatMut, MatRef};

/// Cached LU factorization of a square matrix.
pub struct LuSolver {
    dim: usize,
    factor: Option<PartialPivLu<f64>>,
}

impl LuSolver {
    /// Factor `a`.
    ///
    /// Faer does not stop at a zero pivot, so the diagonal of `U` is checked afterwards. A
    /// pivot no larger than `eps * n * max|u_kk|` is reported as
    /// [`LinSysError::SingularBlock`] with the index of the first such pivot.
    pub fn factor(a: MatRef<'_, f64>) -> Result<Self, LinSysError> {
        let n = a.nrows();
        LinSysError::check_len("matrix columns", n, a.ncols())?;
        if n == 0 {
            return Ok(Self { dim: 0, factor: None });
        }
        let lu = PartialPivLu::new(a);
        check_pivots(lu.U())?;
        Ok(Self {
            dim: n,
            factor: Some(lu),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Overwrite `x` with `A⁻¹ x`.
    pub fn solve_in_place(&self, x: &mut [f64]) -> Result<(), LinSysError> {
        LinSysError::check_len("right-hand side", self.dim, x.len())?;
        if let Some(factor) = &self.factor {
            let n = x.len();
            let x_mat = MatMut::from_column_major_slice_mut(x, n, 1);
            factor.solve_in_place_with_conj(Conj::No, x_mat);
        }
        Ok(())
    }

    /// Explicit `A⁻¹`.
    pub fn inverse(&self) -> Mat<f64> {
        match &self.factor {
            Some(factor) => factor.inverse(),
            None => Mat::zeros(0, 0),
        }
    }
}

fn check_pivots(u: MatRef<'_, f64>) -> Result<(), LinSysError> {
    let n = u.nrows();
    let max = (0..n).map(|k| u[(k, k)].abs()).fold(0.0_f64, f64::max);
    let tiny = f64::EPSILON * n as f64 * max;
    match (0..n).find(|&k| !(u[(k, k)].abs() > tiny)) {
        Some(pivot) => Err(LinSysError::SingularBlock {
            element: None,
            pivot,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense<const N: usize>(rows: [[f64; N]; N]) -> Mat<f64> {
        Mat::from_fn(N, N, |i, j| rows[i][j])
    }

    #[test]
    fn lu_solver_solves_dense_system() {
        // [[2,1,1],[1,3,2],[1,0,0]] x = [4,5,6], x = [6,15,-23]
        let a = dense([[2.0, 1.0, 1.0], [1.0, 3.0, 2.0], [1.0, 0.0, 0.0]]);
        let lu = LuSolver::factor(a.as_ref()).unwrap();
        let mut x = vec![4.0, 5.0, 6.0];
        lu.solve_in_place(&mut x).unwrap();
        let expected = [6.0, 15.0, -23.0];
        for (xi, ei) in x.iter().zip(expected.iter()) {
            assert!((xi - ei).abs() < 1e-10, "xi = {}, expected = {}", xi, ei);
        }
    }

    #[test]
    fn solves_system_requiring_pivoting() {
        // leading zero forces a row swap
        let a = dense([[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [2.0, 0.0, 3.0]]);
        let lu = LuSolver::factor(a.as_ref()).unwrap();
        let x_true = [1.0, -2.0, 0.5];
        let mut b: Vec<f64> = (0..3)
            .map(|i| (0..3).map(|j| a[(i, j)] * x_true[j]).sum())
            .collect();
        lu.solve_in_place(&mut b).unwrap();
        for (xi, ei) in b.iter().zip(x_true.iter()) {
            assert!((xi - ei).abs() < 1e-12, "xi = {}, expected = {}", xi, ei);
        }
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = dense([[4.0, 1.0], [1.0, 3.0]]);
        let inv = LuSolver::factor(a.as_ref()).unwrap().inverse();
        for i in 0..2 {
            for j in 0..2 {
                let v: f64 = (0..2).map(|k| a[(i, k)] * inv[(k, j)]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn zero_matrix_is_singular_at_first_pivot() {
        let a = Mat::<f64>::zeros(2, 2);
        assert_eq!(
            LuSolver::factor(a.as_ref()).err(),
            Some(LinSysError::SingularBlock {
                element: None,
                pivot: 0
            })
        );
    }

    #[test]
    fn rank_deficient_matrix_is_singular() {
        let a = dense([[1.0, 2.0], [2.0, 4.0]]);
        assert!(matches!(
            LuSolver::factor(a.as_ref()),
            Err(LinSysError::SingularBlock { pivot: 1, .. })
        ));
    }

    #[test]
    fn neumann_laplacian_is_singular() {
        // 1D linear-element stiffness without any prescribed node; rows sum to zero
        let a = dense([
            [1.0, -1.0, 0.0, 0.0],
            [-1.0, 2.0, -1.0, 0.0],
            [0.0, -1.0, 2.0, -1.0],
            [0.0, 0.0, -1.0, 1.0],
        ]);
        assert!(matches!(
            LuSolver::factor(a.as_ref()),
            Err(LinSysError::SingularBlock { element: None, pivot: 3 })
        ));
    }

    #[test]
    fn ill_conditioned_helmholtz_block_factors() {
        // stiffness plus a small mass shift is nonsingular even though it is close to the
        // Neumann Laplacian above
        let lambda = 1e-6;
        let a = dense([
            [1.0 + lambda, -1.0, 0.0, 0.0],
            [-1.0, 2.0 + lambda, -1.0, 0.0],
            [0.0, -1.0, 2.0 + lambda, -1.0],
            [0.0, 0.0, -1.0, 1.0 + lambda],
        ]);
        let lu = LuSolver::factor(a.as_ref()).unwrap();
        let mut x = vec![lambda; 4];
        lu.solve_in_place(&mut x).unwrap();
        for xi in &x {
            assert!((xi - 1.0).abs() < 1e-6, "xi = {}", xi);
        }
    }

    #[test]
    fn empty_matrix_factors_trivially() {
        let a = Mat::<f64>::zeros(0, 0);
        let lu = LuSolver::factor(a.as_ref()).unwrap();
        assert_eq!(lu.dim(), 0);
        assert_eq!(lu.inverse().nrows(), 0);
        lu.solve_in_place(&mut []).unwrap();
    }

    #[test]
    fn non_square_matrix_is_a_dimension_mismatch() {
        let a = Mat::<f64>::zeros(2, 3);
        assert!(matches!(
            LuSolver::factor(a.as_ref()),
            Err(LinSysError::DimensionMismatch { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn wrong_rhs_length_is_a_dimension_mismatch() {
        let id = Mat::<f64>::identity(2, 2);
        let lu = LuSolver::factor(id.as_ref()).unwrap();
        let mut x = vec![1.0; 3];
        assert!(matches!(
            lu.solve_in_place(&mut x),
            Err(LinSysError::DimensionMismatch { expected: 2, found: 3, .. })
        ));
    }
}
