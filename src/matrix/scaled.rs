//! Dense matrices carrying a lazily applied scale factor.
//!
//! Reference-element operators are cached once per operator key and shared between all
//! elements of the same shape and order. The geometric factor of an individual element is
//! kept next to the shared storage instead of being multiplied into it, so rescaling is an
//! `Arc` clone and never a copy.

use faer::Mat;
use std::sync::Arc;

/// A dense matrix `scale · A` with `A` held in shared storage.
#[derive(Debug, Clone)]
pub struct ScaledMatrix {
    scale: f64,
    matrix: Arc<Mat<f64>>,
}

impl ScaledMatrix {
    pub fn new(scale: f64, matrix: Mat<f64>) -> Self {
        Self::from_shared(scale, Arc::new(matrix))
    }

    pub fn from_shared(scale: f64, matrix: Arc<Mat<f64>>) -> Self {
        Self { scale, matrix }
    }

    /// Wrap absolute values (scale factor one).
    pub fn unscaled(matrix: Mat<f64>) -> Self {
        Self::new(1.0, matrix)
    }

    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::unscaled(Mat::zeros(nrows, ncols))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Entries without the scale factor applied.
    pub fn raw(&self) -> &Mat<f64> {
        &self.matrix
    }

    pub fn shared(&self) -> &Arc<Mat<f64>> {
        &self.matrix
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Scaled entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.scale * self.matrix[(i, j)]
    }

    /// Same storage, scale multiplied by `factor`.
    pub fn rescaled(&self, factor: f64) -> Self {
        Self {
            scale: self.scale * factor,
            matrix: Arc::clone(&self.matrix),
        }
    }

    pub fn shares_storage_with(&self, other: &ScaledMatrix) -> bool {
        Arc::ptr_eq(&self.matrix, &other.matrix)
    }

    /// Copy of the entries with the scale factor multiplied in.
    pub fn to_dense(&self) -> Mat<f64> {
        let s = self.scale;
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| s * self.matrix[(i, j)])
    }

    /// `y = scale · A · x`
    pub fn matvec_into(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(y.len(), self.nrows());
        for (i, yi) in y.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (j, &xj) in x.iter().enumerate() {
                acc += self.matrix[(i, j)] * xj;
            }
            *yi = self.scale * acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescaling_shares_storage_and_multiplies_scale() {
        let m = ScaledMatrix::new(2.0, Mat::from_fn(2, 2, |i, j| (i + j) as f64));
        let r = m.rescaled(3.0);
        assert!(r.shares_storage_with(&m));
        assert_eq!(r.scale(), 6.0);
        assert_eq!(r.get(1, 1), 12.0);
        assert_eq!(m.get(1, 1), 4.0);
    }

    #[test]
    fn matvec_applies_scale() {
        let m = ScaledMatrix::new(0.5, Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 }));
        let mut y = [0.0; 2];
        m.matvec_into(&[1.0, 3.0], &mut y);
        assert_eq!(y, [1.0, 3.0]);
    }
}
