use thiserror::Error;

// Unified error type for statcond

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinSysError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unsupported operator {kind} on {shape} element")]
    UnsupportedOperator { kind: String, shape: String },
    #[error("singular block{} (zero pivot at row {pivot})", element_suffix(.element))]
    SingularBlock { element: Option<usize>, pivot: usize },
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("indefinite matrix detected (p^T A p <= 0)")]
    IndefiniteMatrix,
    #[error("indefinite preconditioner detected (beta < 0)")]
    IndefinitePreconditioner,
    #[error("iterative solve did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },
}

fn element_suffix(element: &Option<usize>) -> String {
    match element {
        Some(e) => format!(" in element {e}"),
        None => " in global system".to_string(),
    }
}

impl LinSysError {
    /// Attach an element index to a singular-block error raised by a local factorization.
    pub fn in_element(self, element: usize) -> Self {
        match self {
            LinSysError::SingularBlock { pivot, .. } => LinSysError::SingularBlock {
                element: Some(element),
                pivot,
            },
            other => other,
        }
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(LinSysError::DimensionMismatch {
                what,
                expected,
                found,
            })
        }
    }
}
