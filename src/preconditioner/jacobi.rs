// Jacobi preconditioner implementation

use crate::core::traits::{Indexing, MatVec};
use crate::error::LinSysError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
///
/// Zero diagonal entries are passed through unscaled.
#[derive(Debug, Clone)]
pub struct Jacobi<T> {
    pub(crate) inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    pub fn from_diagonal(diag: &[T]) -> Self {
        Self {
            inv_diag: diag
                .iter()
                .map(|&d| if d != T::zero() { T::one() / d } else { T::one() })
                .collect(),
        }
    }

    /// Extract the diagonal of an operator by applying it to unit vectors.
    pub fn from_operator<M, V>(a: &M) -> Self
    where
        M: MatVec<V> + Indexing,
        V: AsRef<[T]> + From<Vec<T>>,
    {
        let n = a.nrows();
        let mut diag = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];
        for i in 0..n {
            e[i] = T::one();
            let e_v = V::from(e.clone());
            let mut col_v = V::from(vec![T::zero(); n]);
            a.matvec(&e_v, &mut col_v);
            diag[i] = col_v.as_ref()[i];
            e[i] = T::zero();
        }
        Self::from_diagonal(&diag)
    }

    pub fn len(&self) -> usize {
        self.inv_diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inv_diag.is_empty()
    }
}

impl<M, V, T> Preconditioner<M, V> for Jacobi<T>
where
    V: AsRef<[T]> + AsMut<[T]>,
    T: Float + Send + Sync,
{
    fn apply(&self, x: &V, y: &mut V) -> Result<(), LinSysError> {
        let x_ref = x.as_ref();
        LinSysError::check_len("Jacobi input", self.inv_diag.len(), x_ref.len())?;
        let y_mut = y.as_mut();
        for i in 0..x_ref.len() {
            y_mut[i] = self.inv_diag[i] * x_ref[i];
        }
        Ok(())
    }
}
