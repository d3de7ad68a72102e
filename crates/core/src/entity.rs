//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities live inside an aggregate (e.g. offers inside a property) and are
/// only ever mutated through their aggregate root.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
