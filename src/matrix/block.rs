//! 2×2 boundary/interior block view of an element operator.

use crate::error::LinSysError;
use crate::matrix::ScaledMatrix;
use faer::Mat;

/// Element operator partitioned into boundary (`b`) and interior (`i`) degrees of freedom:
///
/// ```text
/// | M_bb  M_bi |
/// | M_ib  M_ii |
/// ```
#[derive(Debug, Clone)]
pub struct ElementBlockMatrix {
    bb: ScaledMatrix,
    bi: ScaledMatrix,
    ib: ScaledMatrix,
    ii: ScaledMatrix,
}

impl ElementBlockMatrix {
    /// Assemble from four blocks, checking that their shapes agree.
    pub fn from_blocks(
        bb: ScaledMatrix,
        bi: ScaledMatrix,
        ib: ScaledMatrix,
        ii: ScaledMatrix,
    ) -> Result<Self, LinSysError> {
        let nb = bb.nrows();
        let ni = ii.nrows();
        LinSysError::check_len("boundary-boundary block columns", nb, bb.ncols())?;
        LinSysError::check_len("interior-interior block columns", ni, ii.ncols())?;
        LinSysError::check_len("boundary-interior block rows", nb, bi.nrows())?;
        LinSysError::check_len("boundary-interior block columns", ni, bi.ncols())?;
        LinSysError::check_len("interior-boundary block rows", ni, ib.nrows())?;
        LinSysError::check_len("interior-boundary block columns", nb, ib.ncols())?;
        Ok(Self { bb, bi, ib, ii })
    }

    /// Partition a full local matrix with the element's boundary/interior permutation.
    ///
    /// `boundary` and `interior` together must enumerate every local index exactly once.
    pub fn from_dense(
        matrix: &ScaledMatrix,
        boundary: &[usize],
        interior: &[usize],
    ) -> Result<Self, LinSysError> {
        let n = matrix.nrows();
        LinSysError::check_len("element matrix columns", n, matrix.ncols())?;
        LinSysError::check_len("boundary + interior dofs", n, boundary.len() + interior.len())?;
        let mut seen = vec![false; n];
        for &idx in boundary.iter().chain(interior) {
            if idx >= n || seen[idx] {
                return Err(LinSysError::Configuration(format!(
                    "boundary/interior dof lists are not a permutation of 0..{n} (index {idx})"
                )));
            }
            seen[idx] = true;
        }

        let raw = matrix.raw();
        let s = matrix.scale();
        let take = |rows: &[usize], cols: &[usize]| {
            ScaledMatrix::new(
                s,
                Mat::from_fn(rows.len(), cols.len(), |i, j| raw[(rows[i], cols[j])]),
            )
        };
        Ok(Self {
            bb: take(boundary, boundary),
            bi: take(boundary, interior),
            ib: take(interior, boundary),
            ii: take(interior, interior),
        })
    }

    pub fn nb(&self) -> usize {
        self.bb.nrows()
    }

    pub fn ni(&self) -> usize {
        self.ii.nrows()
    }

    pub fn bb(&self) -> &ScaledMatrix {
        &self.bb
    }

    pub fn bi(&self) -> &ScaledMatrix {
        &self.bi
    }

    pub fn ib(&self) -> &ScaledMatrix {
        &self.ib
    }

    pub fn ii(&self) -> &ScaledMatrix {
        &self.ii
    }

    /// The scale shared by all four blocks, if they have one.
    pub fn common_scale(&self) -> Option<f64> {
        let s = self.bb.scale();
        [&self.bi, &self.ib, &self.ii]
            .iter()
            .all(|m| m.scale() == s)
            .then_some(s)
    }

    /// All blocks rescaled by `factor`, sharing storage with `self`.
    pub fn rescaled(&self, factor: f64) -> Self {
        Self {
            bb: self.bb.rescaled(factor),
            bi: self.bi.rescaled(factor),
            ib: self.ib.rescaled(factor),
            ii: self.ii.rescaled(factor),
        }
    }

    pub fn with_boundary_block(&self, bb: ScaledMatrix) -> Result<Self, LinSysError> {
        Self::from_blocks(bb, self.bi.clone(), self.ib.clone(), self.ii.clone())
    }

    /// Scaled dense matrix in `[boundary | interior]` ordering.
    pub fn to_dense(&self) -> Mat<f64> {
        let nb = self.nb();
        let n = nb + self.ni();
        Mat::from_fn(n, n, |i, j| match (i < nb, j < nb) {
            (true, true) => self.bb.get(i, j),
            (true, false) => self.bi.get(i, j - nb),
            (false, true) => self.ib.get(i - nb, j),
            (false, false) => self.ii.get(i - nb, j - nb),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScaledMatrix {
        // entries encode (row, col) so the partition is easy to check
        ScaledMatrix::new(2.0, Mat::from_fn(3, 3, |i, j| (10 * i + j) as f64))
    }

    #[test]
    fn partition_follows_permutation() {
        let block = ElementBlockMatrix::from_dense(&sample(), &[0, 2], &[1]).unwrap();
        assert_eq!(block.nb(), 2);
        assert_eq!(block.ni(), 1);
        assert_eq!(block.bb().raw()[(1, 0)], 20.0);
        assert_eq!(block.bi().raw()[(1, 0)], 21.0);
        assert_eq!(block.ib().raw()[(0, 1)], 12.0);
        assert_eq!(block.ii().raw()[(0, 0)], 11.0);
        assert_eq!(block.common_scale(), Some(2.0));
        assert_eq!(block.to_dense()[(2, 2)], 22.0);
    }

    #[test]
    fn rejects_non_bijective_permutation() {
        let err = ElementBlockMatrix::from_dense(&sample(), &[0, 0], &[1]).unwrap_err();
        assert!(matches!(err, LinSysError::Configuration(_)));
        let err = ElementBlockMatrix::from_dense(&sample(), &[0], &[1]).unwrap_err();
        assert!(matches!(err, LinSysError::DimensionMismatch { .. }));
    }

    #[test]
    fn boundary_only_element_has_empty_interior_blocks() {
        let block = ElementBlockMatrix::from_dense(&sample(), &[0, 1, 2], &[]).unwrap();
        assert_eq!(block.ni(), 0);
        assert_eq!(block.bi().ncols(), 0);
        assert_eq!(block.ib().nrows(), 0);
    }
}
