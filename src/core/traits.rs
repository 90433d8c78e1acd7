//! Seams between the Krylov solvers and whatever they are asked to invert.
//!
//! Assembled `faer` matrices implement these directly; the global systems implement them on a
//! matrix-free view of the element operators restricted to the unknown dofs.

/// `y = A x`, overwriting `y`.
pub trait MatVec<V> {
    fn matvec(&self, x: &V, y: &mut V);
}

/// Euclidean inner product and norm of vectors of type `V`.
pub trait InnerProduct<V> {
    type Scalar: Copy + PartialOrd + From<f64>;

    fn dot(&self, x: &V, y: &V) -> Self::Scalar;

    /// `sqrt(dot(x, x))`
    fn norm(&self, x: &V) -> Self::Scalar;
}

/// Row count of an operator or length of a vector.
pub trait Indexing {
    fn nrows(&self) -> usize;
}
