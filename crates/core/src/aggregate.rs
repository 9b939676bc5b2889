//! Aggregate root trait for order-like domain models.

/// Aggregate root marker + minimal interface.
///
/// Orders are the aggregate roots of this platform: lines, and the
/// classification of their fulfillment records, are only changed through the
/// order that owns them.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Bumped once per persisted mutation (state transition, copy, line
    /// reclassification).
    fn version(&self) -> u64;
}
