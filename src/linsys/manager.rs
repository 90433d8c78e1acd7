//! Element matrices for one or more global systems, built once per operator key.
//!
//! Element matrices are requested from the [`ElementMatrixProvider`] on the reference
//! element, cached by [`OperatorKey`], and rescaled per element by its geometric factor.
//! Condensed blocks are cached the same way. Elements carrying Robin data get their own
//! condensed entry, keyed additionally by element index, because the Robin terms make their
//! matrix differ from the shared reference one.

use crate::cache::MatrixCache;
use crate::condense::{StaticCondBlock, condense};
use crate::element::{ElementMatrixProvider, ElementSet};
use crate::error::LinSysError;
use crate::key::{GlobalLinSysKey, OperatorKey};
use crate::matrix::ElementBlockMatrix;
use crate::robin::inject_robin;
use log::debug;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Key of a condensed block: shared entries use `None`, Robin-modified ones their element.
pub type StaticCondKey = (OperatorKey, Option<usize>);

pub struct MatrixManager {
    provider: Arc<dyn ElementMatrixProvider>,
    matrices: MatrixCache<OperatorKey, ElementBlockMatrix>,
    static_cond: MatrixCache<StaticCondKey, StaticCondBlock>,
}

impl MatrixManager {
    pub fn new(provider: Arc<dyn ElementMatrixProvider>) -> Self {
        Self {
            provider,
            matrices: MatrixCache::new(),
            static_cond: MatrixCache::new(),
        }
    }

    pub fn matrix_cache(&self) -> &MatrixCache<OperatorKey, ElementBlockMatrix> {
        &self.matrices
    }

    pub fn static_cond_cache(&self) -> &MatrixCache<StaticCondKey, StaticCondBlock> {
        &self.static_cond
    }

    fn reference_block(
        &self,
        key: &OperatorKey,
        elements: &ElementSet,
        e: usize,
    ) -> Result<Arc<ElementBlockMatrix>, LinSysError> {
        let element = elements.element(e);
        self.matrices
            .get_or_try_insert_with(key, || self.provider.build_block_matrix(key, element))
    }

    /// Block matrix of element `e` as it enters the global operator: rescaled to the element
    /// and with its Robin terms added.
    pub fn element_block(
        &self,
        key: &GlobalLinSysKey,
        elements: &ElementSet,
        e: usize,
    ) -> Result<ElementBlockMatrix, LinSysError> {
        let element = elements.element(e);
        let op_key = key.operator_key(element, elements.phys_offset(e));
        let factor = element_scale(elements, key, e)?;
        let reference = self.reference_block(&op_key, elements, e)?;
        let scaled = reference.rescaled(factor);
        let block = inject_robin(&scaled, element, elements.robin_contributions(e))?;
        Ok(block.into_owned())
    }

    /// Condensed block of element `e`.
    pub fn static_cond_block(
        &self,
        key: &GlobalLinSysKey,
        elements: &ElementSet,
        e: usize,
    ) -> Result<StaticCondBlock, LinSysError> {
        let element = elements.element(e);
        let op_key = key.operator_key(element, elements.phys_offset(e));
        let factor = element_scale(elements, key, e)?;
        let robin = elements.robin_contributions(e);

        if robin.is_empty() {
            let shared = self
                .static_cond
                .get_or_try_insert_with(&(op_key.clone(), None), || {
                    let reference = self.reference_block(&op_key, elements, e)?;
                    condense(&reference).map_err(|err| err.in_element(e))
                })?;
            return Ok(shared.rescaled(factor));
        }

        let own = self
            .static_cond
            .get_or_try_insert_with(&(op_key.clone(), Some(e)), || {
                let reference = self.reference_block(&op_key, elements, e)?;
                let scaled = reference.rescaled(factor);
                let block = inject_robin(&scaled, element, robin)?;
                condense(&block).map_err(|err| err.in_element(e))
            })?;
        Ok(StaticCondBlock::clone(&own))
    }

    /// Element blocks of every element; the first failure aborts.
    pub fn element_blocks(
        &self,
        key: &GlobalLinSysKey,
        elements: &ElementSet,
    ) -> Result<Vec<ElementBlockMatrix>, LinSysError> {
        debug!("building {} element blocks for {}", elements.len(), key.kind());
        #[cfg(feature = "rayon")]
        let blocks = (0..elements.len())
            .into_par_iter()
            .map(|e| self.element_block(key, elements, e))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let blocks = (0..elements.len())
            .map(|e| self.element_block(key, elements, e))
            .collect();
        blocks
    }

    /// Condensed blocks of every element; the first failure aborts.
    pub fn static_cond_blocks(
        &self,
        key: &GlobalLinSysKey,
        elements: &ElementSet,
    ) -> Result<Vec<StaticCondBlock>, LinSysError> {
        debug!("condensing {} elements for {}", elements.len(), key.kind());
        #[cfg(feature = "rayon")]
        let blocks = (0..elements.len())
            .into_par_iter()
            .map(|e| self.static_cond_block(key, elements, e))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let blocks = (0..elements.len())
            .map(|e| self.static_cond_block(key, elements, e))
            .collect();
        blocks
    }
}

/// Scale factor of element `e`. A zero factor makes every block of the element vanish.
fn element_scale(
    elements: &ElementSet,
    key: &GlobalLinSysKey,
    e: usize,
) -> Result<f64, LinSysError> {
    let factor = elements.element(e).scale_factor(key.kind());
    if factor == 0.0 {
        return Err(LinSysError::SingularBlock {
            element: Some(e),
            pivot: 0,
        });
    }
    if !factor.is_finite() {
        return Err(LinSysError::Configuration(format!(
            "element {e} has scale factor {factor} for {}",
            key.kind()
        )));
    }
    Ok(factor)
}

impl fmt::Debug for MatrixManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixManager")
            .field("matrices", &self.matrices)
            .field("static_cond", &self.static_cond)
            .finish()
    }
}
