//! Read model trait for query access.

/// A queryable read model maintained by a projection.
pub trait ReadModel {
    /// Returns the name of this read model.
    fn name(&self) -> &'static str;

    /// Returns the number of entries currently held.
    fn count(&self) -> usize;
}
