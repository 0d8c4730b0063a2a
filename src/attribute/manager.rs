//! AttributeManager: the per-element-set columnar attribute store.
//!
//! An `AttributeManager` owns every named attribute of one element set plus
//! the set's logical size. Attributes are stored type-erased
//! (`Box<dyn ErasedAttribute>`) behind a name→attribute map and an insertion
//! `order` vector, so iteration and record encoding are deterministic.
//!
//! # Invariants
//!
//! - Each attribute name appears exactly once in `order`.
//! - The map contains precisely the names listed in `order`.
//! - Every attribute's logical size equals the manager's size.
//!
//! These invariants are checked after mutations in debug builds and when the
//! `check-invariants` feature is enabled. They can also be verified manually
//! via [`validate_invariants`](DebugInvariants::validate_invariants).

use std::any::Any;
use std::collections::HashMap;

use crate::attribute::old2new::Old2New;
use crate::attribute::store::{Attribute, AttributeRepr, AttributeValue};
use crate::attribute::type_registry;
use crate::debug_invariants::DebugInvariants;
use crate::model_error::ModelWeldError;
use crate::record;

/// Object-safe surface of one stored attribute, independent of its value type.
///
/// Structural edits go through this trait so the manager can drive every
/// attribute in one pass without knowing its `T`.
pub(crate) trait ErasedAttribute: std::fmt::Debug + Send + Sync {
    fn len(&self) -> usize;
    fn repr(&self) -> AttributeRepr;
    fn value_type_name(&self) -> &'static str;
    fn resize(&mut self, new_len: usize);
    fn apply_old2new(&mut self, map: &Old2New);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn ErasedAttribute>;
    fn encode_entry(&self, name: &str) -> Result<AttributeEntryRecord, ModelWeldError>;
}

impl<T: AttributeValue> ErasedAttribute for Attribute<T> {
    fn len(&self) -> usize {
        Attribute::len(self)
    }

    fn repr(&self) -> AttributeRepr {
        Attribute::repr(self)
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn resize(&mut self, new_len: usize) {
        Attribute::resize(self, new_len);
    }

    fn apply_old2new(&mut self, map: &Old2New) {
        Attribute::apply_old2new(self, map);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedAttribute> {
        Box::new(self.clone())
    }

    fn encode_entry(&self, name: &str) -> Result<AttributeEntryRecord, ModelWeldError> {
        Ok(AttributeEntryRecord {
            name: name.to_string(),
            value_type: std::any::type_name::<T>().to_string(),
            repr: Attribute::repr(self),
            default: record::encode(self.default_value())?,
            payload: self.encode_payload()?,
        })
    }
}

/// Columnar attribute store for one element set.
#[derive(Debug)]
pub struct AttributeManager {
    /// Name → type-erased attribute.
    attributes: HashMap<String, Box<dyn ErasedAttribute>>,
    /// Insertion order of attribute names, for deterministic iteration.
    order: Vec<String>,
    /// Logical size of the element set; every attribute matches it.
    size: usize,
    /// Monotonic version that changes on any structural modification.
    version: u64,
}

impl Clone for AttributeManager {
    fn clone(&self) -> Self {
        Self {
            attributes: self
                .attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.clone_boxed()))
                .collect(),
            order: self.order.clone(),
            size: self.size,
            version: self.version,
        }
    }
}

impl Default for AttributeManager {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AttributeManager {
    /// Creates a manager for an element set of `size` elements, with no
    /// attributes yet.
    pub fn new(size: usize) -> Self {
        Self {
            attributes: HashMap::new(),
            order: Vec::new(),
            size,
            version: 0,
        }
    }

    /// Logical size of the element set.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of attributes.
    #[inline]
    pub fn nb_attributes(&self) -> usize {
        debug_assert_eq!(self.order.len(), self.attributes.len());
        self.order.len()
    }

    /// Whether an attribute named `name` exists, of any value type.
    #[inline]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute names in insertion (deterministic) order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Representation of the attribute named `name`.
    ///
    /// # Errors
    /// Returns `Err(AttributeNotFound)` if absent.
    pub fn attribute_repr(&self, name: &str) -> Result<AttributeRepr, ModelWeldError> {
        self.attributes
            .get(name)
            .map(|attr| attr.repr())
            .ok_or_else(|| ModelWeldError::AttributeNotFound(name.to_string()))
    }

    /// Monotonic version that changes whenever the store structure changes.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the attribute named `name`, creating it with `default` and
    /// `repr` if absent.
    ///
    /// Finding an existing attribute of the right type ignores the requested
    /// representation and default.
    ///
    /// # Errors
    /// Returns `Err(AttributeTypeMismatch)` if `name` exists with a different
    /// value type; the existing attribute is untouched.
    pub fn create_or_find<T: AttributeValue>(
        &mut self,
        name: &str,
        default: T,
        repr: AttributeRepr,
    ) -> Result<&mut Attribute<T>, ModelWeldError> {
        if !self.attributes.contains_key(name) {
            self.attributes.insert(
                name.to_string(),
                Box::new(Attribute::new(default, repr, self.size)),
            );
            self.order.push(name.to_string());
            self.version = self.version.wrapping_add(1);
            #[cfg(any(debug_assertions, feature = "check-invariants"))]
            self.debug_assert_invariants();
        }
        self.attribute_mut(name)
    }

    /// Typed read access to the attribute named `name`.
    ///
    /// # Errors
    /// `AttributeNotFound` if absent, `AttributeTypeMismatch` if `name`
    /// stores a different value type.
    pub fn attribute<T: AttributeValue>(&self, name: &str) -> Result<&Attribute<T>, ModelWeldError> {
        let erased = self
            .attributes
            .get(name)
            .ok_or_else(|| ModelWeldError::AttributeNotFound(name.to_string()))?;
        erased.as_any().downcast_ref::<Attribute<T>>().ok_or_else(|| {
            ModelWeldError::AttributeTypeMismatch {
                name: name.to_string(),
                stored: erased.value_type_name(),
                requested: std::any::type_name::<T>(),
            }
        })
    }

    /// Typed write access to the attribute named `name`.
    ///
    /// # Errors
    /// `AttributeNotFound` if absent, `AttributeTypeMismatch` if `name`
    /// stores a different value type.
    pub fn attribute_mut<T: AttributeValue>(
        &mut self,
        name: &str,
    ) -> Result<&mut Attribute<T>, ModelWeldError> {
        let erased = self
            .attributes
            .get_mut(name)
            .ok_or_else(|| ModelWeldError::AttributeNotFound(name.to_string()))?;
        let stored = erased.value_type_name();
        erased
            .as_any_mut()
            .downcast_mut::<Attribute<T>>()
            .ok_or_else(|| ModelWeldError::AttributeTypeMismatch {
                name: name.to_string(),
                stored,
                requested: std::any::type_name::<T>(),
            })
    }

    /// Deletes the attribute named `name`.
    ///
    /// # Errors
    /// Returns `Err(AttributeNotFound)` if absent.
    pub fn delete_attribute(&mut self, name: &str) -> Result<(), ModelWeldError> {
        if self.attributes.remove(name).is_none() {
            return Err(ModelWeldError::AttributeNotFound(name.to_string()));
        }
        self.order.retain(|n| n != name);
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Renames the attribute `old` to `new`, keeping its insertion rank.
    ///
    /// # Errors
    /// `AttributeNotFound` if `old` is absent, `AttributeAlreadyExists` if
    /// `new` already names an attribute. Nothing changes on error.
    pub fn rename_attribute(&mut self, old: &str, new: &str) -> Result<(), ModelWeldError> {
        if !self.attributes.contains_key(old) {
            return Err(ModelWeldError::AttributeNotFound(old.to_string()));
        }
        if self.attributes.contains_key(new) {
            return Err(ModelWeldError::AttributeAlreadyExists(new.to_string()));
        }
        let attr = self.attributes.remove(old).unwrap();
        self.attributes.insert(new.to_string(), attr);
        let slot = self.order.iter_mut().find(|n| n.as_str() == old).unwrap();
        *slot = new.to_string();
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Grows or shrinks every attribute to logical size `new_size`.
    ///
    /// Growth pads with each attribute's default value; shrink truncates
    /// silently, including sparse entries beyond `new_size`.
    pub fn resize(&mut self, new_size: usize) {
        for attr in self.attributes.values_mut() {
            attr.resize(new_size);
        }
        self.size = new_size;
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
    }

    /// Removes the flagged indices (`true` = remove) from every attribute,
    /// compacting survivors to `[0, size - removed)`.
    ///
    /// Returns the old→new mapping of the edit, with
    /// [`NO_ID`](crate::attribute::old2new::NO_ID) marking deleted entries.
    ///
    /// # Errors
    /// Returns `Err(MappingLengthMismatch)` if the mask does not cover the
    /// element set; nothing changes on error.
    ///
    /// # Complexity
    /// One **O(size)** pass per Dense attribute; Sparse attributes touch only
    /// present keys; Constant attributes are O(1).
    pub fn delete_elements(&mut self, mask: &[bool]) -> Result<Old2New, ModelWeldError> {
        if mask.len() != self.size {
            return Err(ModelWeldError::MappingLengthMismatch {
                expected: self.size,
                found: mask.len(),
            });
        }
        let map = Old2New::from_delete_mask(mask);
        log::trace!(
            "delete_elements: {} of {} elements removed",
            self.size - map.new_len(),
            self.size
        );
        for attr in self.attributes.values_mut() {
            attr.apply_old2new(&map);
        }
        self.size = map.new_len();
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(map)
    }

    /// Reindexes every attribute per the bijection `perm[old] = new`.
    ///
    /// Returns the corresponding old→new mapping.
    ///
    /// # Errors
    /// `MappingLengthMismatch` if `perm` does not cover the element set,
    /// `InvalidPermutation` if it is not a bijection; nothing changes on
    /// error.
    pub fn permute_elements(&mut self, perm: &[u32]) -> Result<Old2New, ModelWeldError> {
        if perm.len() != self.size {
            return Err(ModelWeldError::MappingLengthMismatch {
                expected: self.size,
                found: perm.len(),
            });
        }
        let map = Old2New::from_permutation(perm)?;
        for attr in self.attributes.values_mut() {
            attr.apply_old2new(&map);
        }
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(map)
    }

    /// Snapshots the manager as one versioned record.
    ///
    /// # Errors
    /// Returns `Err(RecordCodec)` if an attribute payload fails to encode.
    pub fn to_record(&self) -> Result<AttributeManagerRecord, ModelWeldError> {
        let mut attributes = Vec::with_capacity(self.order.len());
        for name in &self.order {
            attributes.push(self.attributes[name].encode_entry(name)?);
        }
        Ok(AttributeManagerRecord {
            version: ATTRIBUTE_MANAGER_RECORD_VERSION,
            size: self.size as u64,
            attributes,
        })
    }

    /// Rebuilds a manager from a versioned record.
    ///
    /// Decoding dispatches on the stored version tag; each attribute entry is
    /// decoded through the process-global
    /// [type registry](crate::attribute::type_registry::register_attribute_type).
    ///
    /// # Errors
    /// `UnsupportedFormatVersion` for an unknown version tag,
    /// `UnknownAttributeType` if an entry names an unregistered value type,
    /// `RecordCodec` on payload corruption.
    pub fn from_record(record: &AttributeManagerRecord) -> Result<Self, ModelWeldError> {
        match record.version {
            1 => Self::from_record_v1(record),
            version => Err(ModelWeldError::UnsupportedFormatVersion {
                record: "AttributeManager",
                version,
            }),
        }
    }

    fn from_record_v1(record: &AttributeManagerRecord) -> Result<Self, ModelWeldError> {
        let size = record.size as usize;
        let mut manager = Self::new(size);
        for entry in &record.attributes {
            let attr = type_registry::decode_attribute(entry, size)?;
            manager.attributes.insert(entry.name.clone(), attr);
            manager.order.push(entry.name.clone());
        }
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        manager.debug_assert_invariants();
        Ok(manager)
    }
}

impl DebugInvariants for AttributeManager {
    fn debug_assert_invariants(&self) {
        crate::weld_debug_assert_ok!(self.validate_invariants(), "AttributeManager invalid");
    }

    fn validate_invariants(&self) -> Result<(), ModelWeldError> {
        use std::collections::HashSet;

        // 1) order is unique and matches map keys both ways
        let set: HashSet<&str> = self.order.iter().map(String::as_str).collect();
        if set.len() != self.order.len() {
            let mut seen = HashSet::new();
            let dup = self
                .order
                .iter()
                .find(|n| !seen.insert(n.as_str()))
                .unwrap();
            return Err(ModelWeldError::AttributeAlreadyExists(dup.clone()));
        }
        if let Some(name) = self.order.iter().find(|n| !self.attributes.contains_key(n.as_str())) {
            return Err(ModelWeldError::AttributeNotFound(name.clone()));
        }
        if let Some(name) = self.attributes.keys().find(|n| !set.contains(n.as_str())) {
            return Err(ModelWeldError::AttributeNotFound(name.clone()));
        }

        // 2) every attribute matches the manager's size
        for attr in self.attributes.values() {
            if attr.len() != self.size {
                return Err(ModelWeldError::MappingLengthMismatch {
                    expected: self.size,
                    found: attr.len(),
                });
            }
        }
        Ok(())
    }
}

/// Record version currently written by [`AttributeManager::to_record`].
pub const ATTRIBUTE_MANAGER_RECORD_VERSION: u32 = 1;

/// One attribute inside an [`AttributeManagerRecord`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttributeEntryRecord {
    pub name: String,
    /// Value type name as registered in the attribute type registry.
    pub value_type: String,
    pub repr: AttributeRepr,
    /// Encoded default value.
    pub default: Vec<u8>,
    /// Encoded current values; shape depends on `repr`.
    pub payload: Vec<u8>,
}

/// Versioned snapshot of one [`AttributeManager`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttributeManagerRecord {
    pub version: u32,
    pub size: u64,
    pub attributes: Vec<AttributeEntryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_or_find_is_idempotent() {
        let mut manager = AttributeManager::new(3);
        manager
            .create_or_find::<f64>("w", 0.0, AttributeRepr::Dense)
            .unwrap()
            .set(1, 2.0)
            .unwrap();
        // Second call finds the same attribute; default/repr are ignored.
        let attr = manager
            .create_or_find::<f64>("w", 9.0, AttributeRepr::Sparse)
            .unwrap();
        assert_eq!(attr.repr(), AttributeRepr::Dense);
        assert_eq!(*attr.get(1).unwrap(), 2.0);
        assert_eq!(manager.nb_attributes(), 1);
    }

    #[test]
    fn type_mismatch_leaves_attribute_untouched() {
        let mut manager = AttributeManager::new(2);
        manager
            .create_or_find::<u32>("tag", 7, AttributeRepr::Dense)
            .unwrap();
        let err = manager
            .create_or_find::<f32>("tag", 0.0, AttributeRepr::Dense)
            .unwrap_err();
        assert!(matches!(err, ModelWeldError::AttributeTypeMismatch { .. }));
        assert_eq!(*manager.attribute::<u32>("tag").unwrap().get(0).unwrap(), 7);
    }

    #[test]
    fn names_keep_insertion_order() {
        let mut manager = AttributeManager::new(0);
        for name in ["c", "a", "b"] {
            manager
                .create_or_find::<i32>(name, 0, AttributeRepr::Sparse)
                .unwrap();
        }
        let names: Vec<_> = manager.attribute_names().collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn rename_keeps_rank_and_rejects_collisions() {
        let mut manager = AttributeManager::new(1);
        manager
            .create_or_find::<i32>("a", 0, AttributeRepr::Dense)
            .unwrap();
        manager
            .create_or_find::<i32>("b", 0, AttributeRepr::Dense)
            .unwrap();
        assert_eq!(
            manager.rename_attribute("a", "b").unwrap_err(),
            ModelWeldError::AttributeAlreadyExists("b".into())
        );
        manager.rename_attribute("a", "z").unwrap();
        let names: Vec<_> = manager.attribute_names().collect();
        assert_eq!(names, vec!["z", "b"]);
        assert!(matches!(
            manager.rename_attribute("missing", "x").unwrap_err(),
            ModelWeldError::AttributeNotFound(_)
        ));
    }

    #[test]
    fn resize_reaches_every_attribute() {
        let mut manager = AttributeManager::new(2);
        manager
            .create_or_find::<f64>("d", 1.0, AttributeRepr::Dense)
            .unwrap();
        manager
            .create_or_find::<f64>("c", 2.0, AttributeRepr::Constant)
            .unwrap();
        manager
            .create_or_find::<f64>("s", 3.0, AttributeRepr::Sparse)
            .unwrap();
        manager.resize(5);
        assert_eq!(manager.size(), 5);
        for name in ["d", "c", "s"] {
            assert_eq!(manager.attribute::<f64>(name).unwrap().len(), 5);
        }
        assert_eq!(*manager.attribute::<f64>("d").unwrap().get(4).unwrap(), 1.0);
    }

    #[test]
    fn delete_elements_scenario() {
        // Size 5, dense "w" default 0.0, set index 2 = 3.5, delete [F,F,T,F,F].
        let mut manager = AttributeManager::new(5);
        manager
            .create_or_find::<f64>("w", 0.0, AttributeRepr::Dense)
            .unwrap()
            .set(2, 3.5)
            .unwrap();
        let map = manager
            .delete_elements(&[false, false, true, false, false])
            .unwrap();
        assert_eq!(manager.size(), 4);
        assert_eq!(map.as_slice(), &[0, 1, crate::attribute::old2new::NO_ID, 2, 3]);
        let w = manager.attribute::<f64>("w").unwrap();
        for index in 0..4 {
            assert_eq!(*w.get(index).unwrap(), 0.0);
        }
    }

    #[test]
    fn bad_mask_is_rejected_before_mutation() {
        let mut manager = AttributeManager::new(3);
        manager
            .create_or_find::<u8>("m", 0, AttributeRepr::Dense)
            .unwrap()
            .set(0, 5)
            .unwrap();
        let before = manager.version();
        assert!(manager.delete_elements(&[true]).is_err());
        assert!(manager.permute_elements(&[0, 0, 1]).is_err());
        assert_eq!(manager.version(), before);
        assert_eq!(*manager.attribute::<u8>("m").unwrap().get(0).unwrap(), 5);
    }

    #[test]
    fn permute_moves_values() {
        let mut manager = AttributeManager::new(3);
        let attr = manager
            .create_or_find::<i64>("v", 0, AttributeRepr::Dense)
            .unwrap();
        for index in 0..3 {
            attr.set(index, index as i64).unwrap();
        }
        manager.permute_elements(&[2, 0, 1]).unwrap();
        let v = manager.attribute::<i64>("v").unwrap();
        assert_eq!(*v.get(0).unwrap(), 1);
        assert_eq!(*v.get(1).unwrap(), 2);
        assert_eq!(*v.get(2).unwrap(), 0);
    }

    #[test]
    fn record_roundtrip_preserves_values() {
        let mut manager = AttributeManager::new(4);
        manager
            .create_or_find::<f64>("d", 0.5, AttributeRepr::Dense)
            .unwrap()
            .set(3, 4.5)
            .unwrap();
        manager
            .create_or_find::<String>("s", String::new(), AttributeRepr::Sparse)
            .unwrap()
            .set(1, "hi".to_string())
            .unwrap();
        let record = manager.to_record().unwrap();
        let back = AttributeManager::from_record(&record).unwrap();
        assert_eq!(back.size(), 4);
        assert_eq!(*back.attribute::<f64>("d").unwrap().get(3).unwrap(), 4.5);
        assert_eq!(*back.attribute::<f64>("d").unwrap().get(0).unwrap(), 0.5);
        assert_eq!(back.attribute::<String>("s").unwrap().get(1).unwrap(), "hi");
        let names: Vec<_> = back.attribute_names().collect();
        assert_eq!(names, vec!["d", "s"]);
    }

    #[test]
    fn unknown_record_version_is_rejected() {
        let record = AttributeManagerRecord {
            version: 99,
            size: 0,
            attributes: vec![],
        };
        assert_eq!(
            AttributeManager::from_record(&record).unwrap_err(),
            ModelWeldError::UnsupportedFormatVersion {
                record: "AttributeManager",
                version: 99
            }
        );
    }
}
