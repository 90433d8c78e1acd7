//! Additive scatter of element contributions into global matrices and vectors.
//!
//! Element blocks may be produced in parallel, but the scatter itself is sequential: entries
//! of dofs shared between elements receive contributions from each of them, and summing them
//! in element order keeps the result reproducible.
//!
//! Global vectors of the full system are laid out as `[boundary | interior of element 0 |
//! interior of element 1 | ...]`; interior dofs carry no sign.

use crate::assembly::LocalToGlobalMap;
use crate::condense::StaticCondBlock;
use crate::element::ElementSet;
use crate::error::LinSysError;
use crate::matrix::ElementBlockMatrix;
use faer::Mat;
use log::debug;

#[derive(Clone, Copy)]
pub struct GlobalAssembler<'a> {
    map: &'a dyn LocalToGlobalMap,
}

impl<'a> GlobalAssembler<'a> {
    pub fn new(map: &'a dyn LocalToGlobalMap) -> Self {
        Self { map }
    }

    pub fn num_global_boundary(&self) -> usize {
        self.map.num_global_boundary()
    }

    /// Check that `nb` local boundary dofs of every element agree with the map.
    pub fn check_boundary_sizes(
        &self,
        nb: impl ExactSizeIterator<Item = usize>,
    ) -> Result<(), LinSysError> {
        LinSysError::check_len("element count of the local-to-global map", nb.len(), self.map.num_elements())?;
        for (e, n) in nb.enumerate() {
            LinSysError::check_len("element boundary dofs", self.map.boundary_map(e).len(), n)?;
        }
        Ok(())
    }

    /// Global Schur complement over all boundary dofs, Dirichlet ones included.
    pub fn assemble_schur(&self, blocks: &[StaticCondBlock]) -> Result<Mat<f64>, LinSysError> {
        self.check_boundary_sizes(blocks.iter().map(StaticCondBlock::nb))?;
        let n = self.map.num_global_boundary();
        let mut global = Mat::zeros(n, n);
        for (e, block) in blocks.iter().enumerate() {
            let s = block.schur();
            let bmap = self.map.boundary_map(e);
            let sign = self.map.boundary_sign(e);
            for i in 0..bmap.len() {
                for j in 0..bmap.len() {
                    global[(bmap[i], bmap[j])] += sign[i] * sign[j] * s.get(i, j);
                }
            }
        }
        debug!("assembled {n}x{n} Schur complement from {} elements", blocks.len());
        Ok(global)
    }

    /// Global operator over boundary and interior dofs.
    pub fn assemble_full(
        &self,
        blocks: &[ElementBlockMatrix],
        elements: &ElementSet,
    ) -> Result<Mat<f64>, LinSysError> {
        self.check_boundary_sizes(blocks.iter().map(ElementBlockMatrix::nb))?;
        let n = self.map.num_global_boundary() + elements.num_interior();
        let mut global = Mat::zeros(n, n);
        for (e, block) in blocks.iter().enumerate() {
            let dofs = self.full_dofs(e, block.ni(), elements)?;
            let local = block.to_dense();
            for (i, &(gi, si)) in dofs.iter().enumerate() {
                for (j, &(gj, sj)) in dofs.iter().enumerate() {
                    global[(gi, gj)] += si * sj * local[(i, j)];
                }
            }
        }
        debug!("assembled {n}x{n} full operator from {} elements", blocks.len());
        Ok(global)
    }

    /// Diagonal of the global Schur complement, without assembling it.
    pub fn schur_diagonal(&self, blocks: &[StaticCondBlock]) -> Result<Vec<f64>, LinSysError> {
        self.check_boundary_sizes(blocks.iter().map(StaticCondBlock::nb))?;
        let mut diag = vec![0.0; self.map.num_global_boundary()];
        for (e, block) in blocks.iter().enumerate() {
            let s = block.schur();
            for (i, &g) in self.map.boundary_map(e).iter().enumerate() {
                diag[g] += s.get(i, i);
            }
        }
        Ok(diag)
    }

    /// `global[bmap[i]] += sign[i] * local[i]`
    pub fn scatter_boundary(&self, element: usize, local: &[f64], global: &mut [f64]) {
        let bmap = self.map.boundary_map(element);
        let sign = self.map.boundary_sign(element);
        for ((&g, &s), &v) in bmap.iter().zip(sign).zip(local) {
            global[g] += s * v;
        }
    }

    /// `local[i] = sign[i] * global[bmap[i]]`
    pub fn gather_boundary(&self, element: usize, global: &[f64], local: &mut [f64]) {
        let bmap = self.map.boundary_map(element);
        let sign = self.map.boundary_sign(element);
        for ((l, &g), &s) in local.iter_mut().zip(bmap).zip(sign) {
            *l = s * global[g];
        }
    }

    /// Global positions and signs of all local dofs of `element`, boundary first.
    pub fn full_dofs(
        &self,
        element: usize,
        ni: usize,
        elements: &ElementSet,
    ) -> Result<Vec<(usize, f64)>, LinSysError> {
        LinSysError::check_len(
            "element interior dofs",
            elements.element(element).interior_dofs().len(),
            ni,
        )?;
        let offset = self.map.num_global_boundary() + elements.interior_offset(element);
        Ok(self
            .map
            .boundary_map(element)
            .iter()
            .copied()
            .zip(self.map.boundary_sign(element).iter().copied())
            .chain((0..ni).map(|k| (offset + k, 1.0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::AssemblyMap;
    use crate::condense::condense;
    use crate::matrix::ScaledMatrix;

    fn boundary_only(rows: [[f64; 2]; 2]) -> StaticCondBlock {
        let m = ScaledMatrix::unscaled(Mat::from_fn(2, 2, |i, j| rows[i][j]));
        condense(&ElementBlockMatrix::from_dense(&m, &[0, 1], &[]).unwrap()).unwrap()
    }

    #[test]
    fn two_mass_elements_give_tridiagonal_matrix() {
        let mass = [[2.0 / 3.0, 1.0 / 3.0], [1.0 / 3.0, 2.0 / 3.0]];
        let blocks = vec![boundary_only(mass), boundary_only(mass)];
        let map = AssemblyMap::without_signs(vec![vec![0, 1], vec![1, 2]], 3).unwrap();
        let g = GlobalAssembler::new(&map).assemble_schur(&blocks).unwrap();
        let expected = [
            [2.0 / 3.0, 1.0 / 3.0, 0.0],
            [1.0 / 3.0, 4.0 / 3.0, 1.0 / 3.0],
            [0.0, 1.0 / 3.0, 2.0 / 3.0],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert!((g[(i, j)] - expected[i][j]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn shared_entry_is_sum_of_signed_contributions() {
        let a = boundary_only([[1.0, 2.0], [3.0, 4.0]]);
        let b = boundary_only([[10.0, 20.0], [30.0, 40.0]]);
        let bmap = vec![vec![0, 1], vec![1, 2]];
        let bsign = vec![vec![1.0, 1.0], vec![-1.0, 1.0]];
        let both = AssemblyMap::new(bmap.clone(), bsign.clone(), 3).unwrap();
        let g = GlobalAssembler::new(&both)
            .assemble_schur(&[a.clone(), b.clone()])
            .unwrap();

        let only_a = AssemblyMap::new(bmap[..1].to_vec(), bsign[..1].to_vec(), 3).unwrap();
        let ga = GlobalAssembler::new(&only_a).assemble_schur(&[a]).unwrap();

        // b's local 0 sits at global 1 with sign -1
        assert_eq!(g[(1, 1)] - ga[(1, 1)], 10.0);
        assert_eq!(g[(1, 2)] - ga[(1, 2)], -20.0);
        assert_eq!(g[(2, 1)] - ga[(2, 1)], -30.0);
        assert_eq!(g[(0, 1)], 2.0);
    }

    #[test]
    fn scatter_and_gather_apply_signs() {
        let map = AssemblyMap::new(vec![vec![2, 0]], vec![vec![-1.0, 1.0]], 3).unwrap();
        let asm = GlobalAssembler::new(&map);
        let mut global = vec![1.0; 3];
        asm.scatter_boundary(0, &[5.0, 7.0], &mut global);
        assert_eq!(global, vec![8.0, 1.0, -4.0]);
        let mut local = [0.0; 2];
        asm.gather_boundary(0, &global, &mut local);
        assert_eq!(local, [4.0, 8.0]);
    }

    #[test]
    fn block_count_must_match_map() {
        let map = AssemblyMap::without_signs(vec![vec![0, 1], vec![1, 2]], 3).unwrap();
        let one = vec![boundary_only([[1.0, 0.0], [0.0, 1.0]])];
        assert!(matches!(
            GlobalAssembler::new(&map).assemble_schur(&one),
            Err(LinSysError::DimensionMismatch { .. })
        ));
    }
}
