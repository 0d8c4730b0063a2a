//! ModelWeldError: unified error type for model-weld public APIs.
//!
//! This error type is used throughout the model-weld library to provide robust,
//! non-panicking error handling for all public APIs. Variants group into three
//! families: validation errors (bad index, bad mapping, type mismatch),
//! consistency errors (an edit that would violate a structural invariant), and
//! not-found errors (query against an absent id, name, or link). A fourth
//! family covers the versioned-record surface consumed by the external
//! persistence collaborator.

use thiserror::Error;

use crate::topology::component::{ComponentId, ComponentKind};
use crate::vertex::MeshComponentVertex;

/// Unified error type for model-weld operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelWeldError {
    /// Attempted to construct a [`ComponentUid`](crate::topology::component::ComponentUid)
    /// with a zero value (0 is reserved as invalid/sentinel).
    #[error("component uid must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidComponentUid,
    /// An element index was outside `[0, size)` for its element set.
    #[error("index {index} out of range for element set of size {size}")]
    IndexOutOfRange { index: usize, size: usize },
    /// `create_or_find` asked for a value type different from the one an
    /// existing attribute of the same name already stores.
    #[error("attribute `{name}` stores values of type `{stored}`, requested `{requested}`")]
    AttributeTypeMismatch {
        name: String,
        stored: &'static str,
        requested: &'static str,
    },
    /// Query against an attribute name that does not exist.
    #[error("attribute `{0}` not found")]
    AttributeNotFound(String),
    /// Rename target already names another attribute.
    #[error("attribute `{0}` already exists")]
    AttributeAlreadyExists(String),
    /// A delete mask or old→new mapping does not cover the element set.
    #[error("mapping covers {found} elements but the element set has {expected}")]
    MappingLengthMismatch { expected: usize, found: usize },
    /// A permutation is not a bijection onto `[0, n)`.
    #[error("permutation is not a bijection: new index {0} is duplicated or out of range")]
    InvalidPermutation(u32),
    /// `register_component` on an id that is already registered.
    #[error("component {0} is already registered")]
    ComponentAlreadyRegistered(ComponentId),
    /// An operation referenced a component id that is not registered / not part
    /// of the model.
    #[error("component {0} is not registered")]
    ComponentNotFound(ComponentId),
    /// A collection-only operation was handed a mesh component.
    #[error("component {0} is not a collection component")]
    NotACollection(ComponentId),
    /// A mesh-only operation was handed a collection component.
    #[error("component {0} is not a mesh component")]
    NotAMeshComponent(ComponentId),
    /// A component-creation request named a kind from the wrong partition.
    #[error("component kind {kind} is not a {expected} kind")]
    ComponentKindMismatch {
        kind: ComponentKind,
        expected: &'static str,
    },
    /// Query against a mesh-component vertex that carries no unique-vertex link.
    #[error("mesh component vertex {0} is not linked to a unique vertex")]
    VertexNotLinked(MeshComponentVertex),
    /// A unique-vertex id beyond the allocated table was referenced.
    #[error("unique vertex {vertex} out of range ({nb_unique} allocated)")]
    UniqueVertexOutOfRange { vertex: u32, nb_unique: u32 },
    /// A stored record carries a version tag this build has no decoder for.
    #[error("unsupported {record} record version {version}")]
    UnsupportedFormatVersion { record: &'static str, version: u32 },
    /// A record names an attribute value type no decoder was registered for.
    #[error("attribute value type `{0}` is not registered for decoding")]
    UnknownAttributeType(String),
    /// Byte-level encode/decode of a record payload failed.
    #[error("record encode/decode failed: {0}")]
    RecordCodec(String),
}
