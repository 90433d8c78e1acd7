//! Matrix-free global operators applied element by element.

use crate::assembly::{GlobalAssembler, LocalToGlobalMap};
use crate::condense::StaticCondBlock;
use crate::core::traits::{Indexing, MatVec};
use crate::element::ElementSet;
use crate::error::LinSysError;
use crate::linsys::map_elements;
use crate::matrix::ElementBlockMatrix;
use std::sync::Arc;

/// Action of an assembled operator without the assembled matrix.
pub trait GlobalOperator: Send + Sync {
    fn size(&self) -> usize;

    /// `y = A x`
    fn apply(&self, x: &[f64], y: &mut [f64]);

    /// Diagonal of the assembled operator.
    fn diagonal(&self) -> Result<Vec<f64>, LinSysError>;
}

/// The global Schur complement `Σ_e Aᵀ_e S_e A_e` over all boundary dofs.
pub struct SchurOperator {
    blocks: Vec<StaticCondBlock>,
    map: Arc<dyn LocalToGlobalMap>,
}

impl SchurOperator {
    pub fn new(
        blocks: Vec<StaticCondBlock>,
        map: Arc<dyn LocalToGlobalMap>,
    ) -> Result<Self, LinSysError> {
        GlobalAssembler::new(map.as_ref())
            .check_boundary_sizes(blocks.iter().map(StaticCondBlock::nb))?;
        Ok(Self { blocks, map })
    }

    pub fn blocks(&self) -> &[StaticCondBlock] {
        &self.blocks
    }

    fn assembler(&self) -> GlobalAssembler<'_> {
        GlobalAssembler::new(self.map.as_ref())
    }

    /// Boundary right-hand side with the interior loads eliminated:
    /// `g = f_b - Σ_e Aᵀ_e P_e f_i^e`.
    pub fn condense_rhs(&self, rhs: &[f64], elements: &ElementSet) -> Vec<f64> {
        let nbnd = self.map.num_global_boundary();
        let corrections = map_elements(self.blocks.len(), |e| {
            let block = &self.blocks[e];
            let start = nbnd + elements.interior_offset(e);
            let mut local = vec![0.0; block.nb()];
            block.condense_rhs(&rhs[start..start + block.ni()], &mut local);
            local
        });
        let mut g = rhs[..nbnd].to_vec();
        let assembler = self.assembler();
        for (e, local) in corrections.iter().enumerate() {
            assembler.scatter_boundary(e, local, &mut g);
        }
        g
    }

    /// Fill the interior part of `out` from the boundary solution `u_b`.
    pub fn back_substitute(&self, rhs: &[f64], u_b: &[f64], elements: &ElementSet, out: &mut [f64]) {
        let nbnd = self.map.num_global_boundary();
        let assembler = self.assembler();
        let interiors = map_elements(self.blocks.len(), |e| {
            let block = &self.blocks[e];
            let start = nbnd + elements.interior_offset(e);
            let mut local_b = vec![0.0; block.nb()];
            assembler.gather_boundary(e, u_b, &mut local_b);
            let mut u_i = vec![0.0; block.ni()];
            block.back_substitute(&rhs[start..start + block.ni()], &local_b, &mut u_i);
            u_i
        });
        for (e, u_i) in interiors.iter().enumerate() {
            let start = nbnd + elements.interior_offset(e);
            out[start..start + u_i.len()].copy_from_slice(u_i);
        }
    }
}

impl GlobalOperator for SchurOperator {
    fn size(&self) -> usize {
        self.map.num_global_boundary()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let assembler = self.assembler();
        let locals = map_elements(self.blocks.len(), |e| {
            let block = &self.blocks[e];
            let mut xl = vec![0.0; block.nb()];
            assembler.gather_boundary(e, x, &mut xl);
            let mut yl = vec![0.0; block.nb()];
            block.schur_matvec(&xl, &mut yl);
            yl
        });
        y.iter_mut().for_each(|v| *v = 0.0);
        for (e, yl) in locals.iter().enumerate() {
            assembler.scatter_boundary(e, yl, y);
        }
    }

    fn diagonal(&self) -> Result<Vec<f64>, LinSysError> {
        self.assembler().schur_diagonal(&self.blocks)
    }
}

/// The complete global operator over boundary and interior dofs.
pub struct FullOperator {
    blocks: Vec<ElementBlockMatrix>,
    dofs: Vec<Vec<(usize, f64)>>,
    size: usize,
}

impl FullOperator {
    pub fn new(
        blocks: Vec<ElementBlockMatrix>,
        map: &dyn LocalToGlobalMap,
        elements: &ElementSet,
    ) -> Result<Self, LinSysError> {
        let assembler = GlobalAssembler::new(map);
        assembler.check_boundary_sizes(blocks.iter().map(ElementBlockMatrix::nb))?;
        let dofs = blocks
            .iter()
            .enumerate()
            .map(|(e, block)| assembler.full_dofs(e, block.ni(), elements))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            blocks,
            dofs,
            size: map.num_global_boundary() + elements.num_interior(),
        })
    }

    pub fn blocks(&self) -> &[ElementBlockMatrix] {
        &self.blocks
    }
}

impl GlobalOperator for FullOperator {
    fn size(&self) -> usize {
        self.size
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let locals = map_elements(self.blocks.len(), |e| {
            let block = &self.blocks[e];
            let nb = block.nb();
            let xl: Vec<f64> = self.dofs[e].iter().map(|&(g, s)| s * x[g]).collect();
            let (xb, xi) = xl.split_at(nb);
            let mut yl = vec![0.0; xl.len()];
            let mut tmp_b = vec![0.0; nb];
            let mut tmp_i = vec![0.0; block.ni()];
            {
                let (yb, yi) = yl.split_at_mut(nb);
                block.bb().matvec_into(xb, yb);
                block.bi().matvec_into(xi, &mut tmp_b);
                yb.iter_mut().zip(&tmp_b).for_each(|(a, b)| *a += b);
                block.ib().matvec_into(xb, yi);
                block.ii().matvec_into(xi, &mut tmp_i);
                yi.iter_mut().zip(&tmp_i).for_each(|(a, b)| *a += b);
            }
            yl
        });
        y.iter_mut().for_each(|v| *v = 0.0);
        for (e, yl) in locals.iter().enumerate() {
            for (&(g, s), &v) in self.dofs[e].iter().zip(yl) {
                y[g] += s * v;
            }
        }
    }

    fn diagonal(&self) -> Result<Vec<f64>, LinSysError> {
        let mut diag = vec![0.0; self.size];
        for (block, dofs) in self.blocks.iter().zip(&self.dofs) {
            let nb = block.nb();
            for (k, &(g, _)) in dofs.iter().enumerate() {
                diag[g] += if k < nb {
                    block.bb().get(k, k)
                } else {
                    block.ii().get(k - nb, k - nb)
                };
            }
        }
        Ok(diag)
    }
}

/// A global operator restricted to the dofs after the first `num_dirichlet`.
pub struct FreeOperator<'a> {
    op: &'a dyn GlobalOperator,
    num_dirichlet: usize,
}

impl<'a> FreeOperator<'a> {
    pub fn new(op: &'a dyn GlobalOperator, num_dirichlet: usize) -> Self {
        Self { op, num_dirichlet }
    }

    pub fn size(&self) -> usize {
        self.op.size() - self.num_dirichlet
    }

    /// Free rows of `A · [values, 0]`, the load the prescribed values put on the unknowns.
    pub fn dirichlet_load(&self, values: &[f64]) -> Vec<f64> {
        let n = self.op.size();
        let mut x = vec![0.0; n];
        x[..self.num_dirichlet].copy_from_slice(values);
        let mut y = vec![0.0; n];
        self.op.apply(&x, &mut y);
        y.split_off(self.num_dirichlet)
    }

    pub fn diagonal(&self) -> Result<Vec<f64>, LinSysError> {
        let mut diag = self.op.diagonal()?;
        Ok(diag.split_off(self.num_dirichlet))
    }
}

impl MatVec<Vec<f64>> for FreeOperator<'_> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        let n = self.op.size();
        let mut full_x = vec![0.0; n];
        full_x[self.num_dirichlet..].copy_from_slice(x);
        let mut full_y = vec![0.0; n];
        self.op.apply(&full_x, &mut full_y);
        y.copy_from_slice(&full_y[self.num_dirichlet..]);
    }
}

impl Indexing for FreeOperator<'_> {
    fn nrows(&self) -> usize {
        self.size()
    }
}
