//! Strong, zero-cost identifiers for model components.
//!
//! Every independently-owned sub-part of a model (corner, line, surface,
//! block, collection, …) is addressed by a [`ComponentId`]: the pairing of a
//! [`ComponentKind`] tag with an opaque [`ComponentUid`]. The uid wraps a
//! nonzero `u64` to enforce at compile- and runtime that 0 is reserved as an
//! invalid or sentinel value.
//!
//! This module provides:
//! - A transparent `ComponentUid` newtype around `NonZeroU64` for zero-cost
//!   memory layout guarantees.
//! - The closed set of component kinds, split between mesh components and
//!   collection components.
//! - Implementations of common traits (`Debug`, `Display`, ordering, hashing)
//!   so ids can be used in maps, sets, and printed easily.

use std::{fmt, num::NonZeroU64};

use crate::model_error::ModelWeldError;

/// Opaque unique identifier of one component, unique across all kinds.
///
/// # Memory layout
/// This type is `repr(transparent)`, meaning it has the same ABI and
/// alignment as its single field (`NonZeroU64`).
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ComponentUid(NonZeroU64);

impl ComponentUid {
    /// Creates a new `ComponentUid` from a raw `u64` value.
    ///
    /// # Errors
    /// Returns `Err(InvalidComponentUid)` if `raw == 0`; 0 is reserved as the
    /// invalid/sentinel value.
    #[inline]
    pub fn new(raw: u64) -> Result<Self, ModelWeldError> {
        NonZeroU64::new(raw)
            .map(ComponentUid)
            .ok_or(ModelWeldError::InvalidComponentUid)
    }

    /// Returns the inner `u64` value of this uid.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for ComponentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentUid").field(&self.get()).finish()
    }
}

impl fmt::Display for ComponentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// The closed set of component kinds a model is assembled from.
///
/// Mesh components own an element mesh of their dimension; collection
/// components group mesh components and own no mesh of their own.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ComponentKind {
    Corner,
    Line,
    Surface,
    Block,
    ModelBoundary,
    CornerCollection,
    LineCollection,
    SurfaceCollection,
    BlockCollection,
}

impl ComponentKind {
    /// Whether this kind is a collection (groups mesh components, owns no mesh).
    #[inline]
    pub const fn is_collection(self) -> bool {
        matches!(
            self,
            ComponentKind::CornerCollection
                | ComponentKind::LineCollection
                | ComponentKind::SurfaceCollection
                | ComponentKind::BlockCollection
        )
    }

    /// Short lowercase name, used in `Display` output and log messages.
    pub const fn name(self) -> &'static str {
        match self {
            ComponentKind::Corner => "corner",
            ComponentKind::Line => "line",
            ComponentKind::Surface => "surface",
            ComponentKind::Block => "block",
            ComponentKind::ModelBoundary => "model_boundary",
            ComponentKind::CornerCollection => "corner_collection",
            ComponentKind::LineCollection => "line_collection",
            ComponentKind::SurfaceCollection => "surface_collection",
            ComponentKind::BlockCollection => "block_collection",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of one component: a kind tag plus an opaque unique id.
///
/// `ComponentId` is `Copy` and 16 bytes; it is the key type of the
/// relationship graph, the component registry, and the vertex identifier.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ComponentId {
    kind: ComponentKind,
    uid: ComponentUid,
}

impl ComponentId {
    /// Pairs a kind with a uid.
    #[inline]
    pub const fn new(kind: ComponentKind, uid: ComponentUid) -> Self {
        Self { kind, uid }
    }

    /// The kind tag of this component.
    #[inline]
    pub const fn kind(self) -> ComponentKind {
        self.kind
    }

    /// The opaque unique id of this component.
    #[inline]
    pub const fn uid(self) -> ComponentUid {
        self.uid
    }

    /// Whether this id names a collection component.
    #[inline]
    pub const fn is_collection(self) -> bool {
        self.kind.is_collection()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.uid)
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertion that `ComponentUid` has the same layout as `u64`.
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(ComponentUid, u64);

    #[test]
    fn alignment_matches_u64() {
        assert_eq_align!(ComponentUid, u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(raw: u64) -> ComponentUid {
        ComponentUid::new(raw).unwrap()
    }

    #[test]
    fn zero_uid_rejected() {
        assert_eq!(
            ComponentUid::new(0).unwrap_err(),
            ModelWeldError::InvalidComponentUid
        );
    }

    #[test]
    fn new_and_get() {
        assert_eq!(uid(42).get(), 42);
        assert_eq!(uid(u64::MAX).get(), u64::MAX);
    }

    #[test]
    fn debug_and_display() {
        let id = ComponentId::new(ComponentKind::Surface, uid(7));
        assert_eq!(format!("{id}"), "surface#7");
        assert_eq!(format!("{:?}", uid(7)), "ComponentUid(7)");
    }

    #[test]
    fn collection_predicate() {
        assert!(ComponentKind::LineCollection.is_collection());
        assert!(!ComponentKind::Line.is_collection());
        assert!(!ComponentKind::ModelBoundary.is_collection());
    }

    #[test]
    fn ordering_and_hash() {
        use std::collections::HashSet;
        let a = ComponentId::new(ComponentKind::Corner, uid(1));
        let b = ComponentId::new(ComponentKind::Corner, uid(2));
        assert!(a < b);
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(a);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = ComponentId::new(ComponentKind::Block, uid(9));
        let s = serde_json::to_string(&id).unwrap();
        let back: ComponentId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, id);
    }
}
