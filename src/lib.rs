//! # model-weld
//!
//! model-weld is the consistency substrate of a multi-component
//! boundary-representation modeling system. Geometry itself lives elsewhere;
//! this crate keeps a model made of many independently-meshed components
//! consistent through every structural edit. It provides:
//!
//! - [`AttributeManager`](attribute::AttributeManager): a per-element-set
//!   columnar attribute store with Dense, Constant, and Sparse storage
//!   representations behind one call surface. Bulk edits (delete, permute)
//!   run in one pass per attribute and return an
//!   [`Old2New`](attribute::Old2New) index mapping.
//! - [`RelationshipGraph`](topology::RelationshipGraph): typed adjacency
//!   between components (boundary/incidence, item-in-collection, internal
//!   embedding) with mirrored storage and mandatory cascade cleanup, so a
//!   dangling relation is never observable.
//! - [`VertexIdentifier`](vertex::VertexIdentifier): the many-to-one map
//!   unifying physically-shared vertices of independent sub-meshes into
//!   canonical unique vertices, rewritten automatically from the `Old2New`
//!   mapping of every structural edit.
//! - [`ComponentRegistry`](topology::ComponentRegistry): per-kind bookkeeping
//!   of live component ids.
//!
//! A [`Model`](model::Model) owns one of each shared structure; its
//! [`ModelBuilder`](model::ModelBuilder) is the sole mutating entry point and
//! sequences every edit so the structures can never drift apart.
//!
//! ## Concurrency
//!
//! Single-writer: all mutation flows synchronously through one builder per
//! model, with no internal locking. Concurrent read-only queries from
//! multiple threads are safe provided no mutation is in flight; enforcing
//! that discipline is the caller's responsibility.
//!
//! ## Persistence
//!
//! Persistence is an external collaborator. Each stateful component
//! snapshots to one versioned record (`*Record` types); decoding dispatches
//! on the stored version tag and fails
//! [`UnsupportedFormatVersion`](model_error::ModelWeldError::UnsupportedFormatVersion)
//! on tags this build does not know. Attribute payloads decode through the
//! process-global [attribute type registry](attribute::register_attribute_type).
//!
//! ## Usage
//! Add `model-weld` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! model-weld = "0.3"
//! ```

// Re-export our major subsystems:
pub mod attribute;
pub mod debug_invariants;
pub mod model;
pub mod model_error;
pub mod record;
pub mod topology;
pub mod vertex;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::attribute::{
        Attribute, AttributeManager, AttributeRepr, AttributeValue, NO_ID, Old2New,
        register_attribute_type,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::model::{Component, Model, ModelBuilder};
    pub use crate::model_error::ModelWeldError;
    pub use crate::record::{record_from_bytes, record_to_bytes};
    pub use crate::topology::{
        ComponentId, ComponentKind, ComponentRegistry, ComponentUid, RelationKind,
        RelationshipGraph,
    };
    pub use crate::vertex::{MeshComponentVertex, UniqueVertexId, VertexIdentifier};
}
