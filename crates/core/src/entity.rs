//! Entity trait: identity + continuity across state changes.

use uuid::Uuid;

/// Entity marker + minimal interface.
///
/// Every persisted record in the academy is keyed by a UUID newtype, so the
/// identifier must convert losslessly into a raw [`Uuid`] for storage.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync + Into<Uuid> + 'static;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
