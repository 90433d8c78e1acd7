//! Convergence tracking & tolerance checks for iterative solvers.

/// Stopping criteria & stats.
#[derive(Debug, Clone, Copy)]
pub struct Convergence<T> {
    pub tol: T,
    pub max_iters: usize,
}

#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
}

impl<T: Copy + num_traits::Float> Convergence<T> {
    /// Returns (should_stop, stats) given current `res_norm` and iteration `i`.
    ///
    /// Iteration stops once the relative residual drops to `tol` or the iteration budget is
    /// spent; only the former counts as converged.
    pub fn check(&self, res_norm: T, res0_norm: T, i: usize) -> (bool, SolveStats<T>) {
        let rel = if res0_norm > T::zero() {
            res_norm / res0_norm
        } else {
            res_norm
        };
        let converged = rel <= self.tol;
        (
            converged || i >= self.max_iters,
            SolveStats {
                iterations: i,
                final_residual: res_norm,
                converged,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_budget_stops_without_converging() {
        let conv = Convergence { tol: 1e-8, max_iters: 5 };
        let (stop, stats) = conv.check(1e-3, 1.0, 5);
        assert!(stop);
        assert!(!stats.converged);
        let (stop, stats) = conv.check(1e-9, 1.0, 2);
        assert!(stop && stats.converged);
        let (stop, _) = conv.check(1e-3, 1.0, 2);
        assert!(!stop);
    }
}
