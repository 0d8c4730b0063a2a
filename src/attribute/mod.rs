//! Per-element-set attribute storage.
//!
//! One [`AttributeManager`] per element set owns every named attribute and
//! the set's logical size; structural edits return [`Old2New`] mappings that
//! downstream index holders (notably the
//! [`VertexIdentifier`](crate::vertex::VertexIdentifier)) consume to stay
//! consistent.

pub mod manager;
pub mod old2new;
pub mod store;
pub mod type_registry;

pub use manager::{
    ATTRIBUTE_MANAGER_RECORD_VERSION, AttributeEntryRecord, AttributeManager,
    AttributeManagerRecord,
};
pub use old2new::{NO_ID, Old2New};
pub use store::{Attribute, AttributeRepr, AttributeValue};
pub use type_registry::register_attribute_type;
