//! Static condensation of one element operator.
//!
//! For an element block
//!
//! ```text
//! | M_bb  M_bi | | u_b |   | f_b |
//! | M_ib  M_ii | | u_i | = | f_i |
//! ```
//!
//! the interior unknowns are eliminated locally, leaving the Schur complement
//! `S = M_bb - M_bi M_ii⁻¹ M_ib` on the boundary. The products needed to condense a
//! right-hand side (`P = M_bi M_ii⁻¹`) and to recover the interior
//! (`u_i = M_ii⁻¹ (f_i - M_ib u_b)`) are kept alongside `S`.
//!
//! When all four blocks carry the same scale `c`, condensation runs on the unscaled storage
//! and the result keeps `c`: `S` and `M_ib` scale with `c`, `M_ii⁻¹` with `1/c`, and `P` is
//! scale free. A condensed reference element can therefore be shared by every element that
//! differs from it only by its geometric factor.

use crate::error::LinSysError;
use crate::matrix::{ElementBlockMatrix, ScaledMatrix};
use crate::solver::LuSolver;
use faer::Mat;
use log::trace;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StaticCondBlock {
    scale: f64,
    schur: Arc<Mat<f64>>,
    bnd_inv_int: Arc<Mat<f64>>,
    int_bnd: Arc<Mat<f64>>,
    inv_int: Arc<Mat<f64>>,
}

/// Condense `block`, returning [`LinSysError::SingularBlock`] if `M_ii` cannot be factored.
///
/// The error carries no element index; callers attach it with [`LinSysError::in_element`].
pub fn condense(block: &ElementBlockMatrix) -> Result<StaticCondBlock, LinSysError> {
    let (nb, ni) = (block.nb(), block.ni());
    let shared_scale = block
        .common_scale()
        .filter(|c| c.is_finite() && *c != 0.0);

    if ni == 0 {
        let (scale, schur) = match shared_scale {
            Some(c) => (c, Arc::clone(block.bb().shared())),
            None => (1.0, Arc::new(block.bb().to_dense())),
        };
        return Ok(StaticCondBlock {
            scale,
            schur,
            bnd_inv_int: Arc::new(Mat::zeros(nb, 0)),
            int_bnd: Arc::new(Mat::zeros(0, nb)),
            inv_int: Arc::new(Mat::zeros(0, 0)),
        });
    }

    let (scale, bb, bi, ib, ii) = match shared_scale {
        Some(c) => (
            c,
            Arc::clone(block.bb().shared()),
            Arc::clone(block.bi().shared()),
            Arc::clone(block.ib().shared()),
            Arc::clone(block.ii().shared()),
        ),
        None => (
            1.0,
            Arc::new(block.bb().to_dense()),
            Arc::new(block.bi().to_dense()),
            Arc::new(block.ib().to_dense()),
            Arc::new(block.ii().to_dense()),
        ),
    };

    let inv_int = LuSolver::factor((*ii).as_ref())?.inverse();
    let p = &*bi * &inv_int;
    let pib = &p * &*ib;
    let schur = &*bb - &pib;
    trace!("condensed element block nb={nb} ni={ni} scale={scale}");

    Ok(StaticCondBlock {
        scale,
        schur: Arc::new(schur),
        bnd_inv_int: Arc::new(p),
        int_bnd: ib,
        inv_int: Arc::new(inv_int),
    })
}

impl StaticCondBlock {
    pub fn nb(&self) -> usize {
        self.schur.nrows()
    }

    pub fn ni(&self) -> usize {
        self.inv_int.nrows()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The same condensation for an operator multiplied by `factor`.
    pub fn rescaled(&self, factor: f64) -> Self {
        Self {
            scale: self.scale * factor,
            ..self.clone()
        }
    }

    /// `S`, the block that enters global assembly.
    pub fn schur(&self) -> ScaledMatrix {
        ScaledMatrix::from_shared(self.scale, Arc::clone(&self.schur))
    }

    /// `P = M_bi M_ii⁻¹`.
    pub fn bnd_inv_int(&self) -> ScaledMatrix {
        ScaledMatrix::from_shared(1.0, Arc::clone(&self.bnd_inv_int))
    }

    pub fn int_bnd(&self) -> ScaledMatrix {
        ScaledMatrix::from_shared(self.scale, Arc::clone(&self.int_bnd))
    }

    pub fn inv_int(&self) -> ScaledMatrix {
        ScaledMatrix::from_shared(1.0 / self.scale, Arc::clone(&self.inv_int))
    }

    pub fn to_dense_schur(&self) -> Mat<f64> {
        self.schur().to_dense()
    }

    /// `g_b -= P f_i`
    pub fn condense_rhs(&self, f_i: &[f64], g_b: &mut [f64]) {
        debug_assert_eq!(f_i.len(), self.ni());
        debug_assert_eq!(g_b.len(), self.nb());
        for (r, g) in g_b.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &f) in f_i.iter().enumerate() {
                acc += self.bnd_inv_int[(r, k)] * f;
            }
            *g -= acc;
        }
    }

    /// `u_i = M_ii⁻¹ (f_i - M_ib u_b)`
    pub fn back_substitute(&self, f_i: &[f64], u_b: &[f64], u_i: &mut [f64]) {
        let ni = self.ni();
        debug_assert_eq!(f_i.len(), ni);
        debug_assert_eq!(u_b.len(), self.nb());
        debug_assert_eq!(u_i.len(), ni);
        let c = self.scale;
        let t: Vec<f64> = (0..ni)
            .map(|r| {
                let mut acc = 0.0;
                for (k, &u) in u_b.iter().enumerate() {
                    acc += self.int_bnd[(r, k)] * u;
                }
                f_i[r] - c * acc
            })
            .collect();
        for (r, out) in u_i.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &tk) in t.iter().enumerate() {
                acc += self.inv_int[(r, k)] * tk;
            }
            *out = acc / c;
        }
    }

    /// `y = S x`
    pub fn schur_matvec(&self, x: &[f64], y: &mut [f64]) {
        self.schur().matvec_into(x, y);
    }
}
