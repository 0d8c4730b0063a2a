//! Typed per-element attributes and their storage representations.
//!
//! An [`Attribute<T>`] maps element indices of one element set to values of
//! type `T`. Three physical representations sit behind one call surface:
//!
//! - **Dense** — one slot per index, backed by a `Vec<T>`.
//! - **Constant** — a single shared value read by every index.
//! - **Sparse** — a hash map of explicitly-set indices; absent indices read
//!   the default value.
//!
//! Structural edits (`resize`, delete, permute) are specialized per
//! representation so the hot path never pays dynamic dispatch per element:
//! Constant is O(1), Sparse touches only present keys, Dense is one O(n)
//! pass.

use hashbrown::HashMap;
use itertools::Itertools;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::attribute::old2new::{NO_ID, Old2New};
use crate::model_error::ModelWeldError;
use crate::record;

/// Marker for types storable in attributes.
///
/// Blanket-implemented for every `Clone + Send + Sync + Debug` type that is
/// serde-serializable; the serde bound is what lets an attribute participate
/// in versioned records.
pub trait AttributeValue:
    Clone + Send + Sync + std::fmt::Debug + Serialize + DeserializeOwned + 'static
{
}

impl<T> AttributeValue for T where
    T: Clone + Send + Sync + std::fmt::Debug + Serialize + DeserializeOwned + 'static
{
}

/// Storage representation of an attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AttributeRepr {
    /// One slot per element index.
    Dense,
    /// One shared value for all indices.
    Constant,
    /// Hash map of present indices; others read the default.
    Sparse,
}

#[derive(Clone, Debug)]
enum AttributeData<T> {
    Dense(Vec<T>),
    Constant(T),
    Sparse(HashMap<u32, T>),
}

/// A named, typed mapping from element indices to values.
///
/// The logical size is owned by the enclosing
/// [`AttributeManager`](crate::attribute::AttributeManager); every attribute
/// of one manager always has the same logical size.
#[derive(Clone, Debug)]
pub struct Attribute<T> {
    default: T,
    len: usize,
    data: AttributeData<T>,
}

impl<T: AttributeValue> Attribute<T> {
    /// Creates an attribute of logical size `len` where every index reads
    /// `default`.
    pub(crate) fn new(default: T, repr: AttributeRepr, len: usize) -> Self {
        let data = match repr {
            AttributeRepr::Dense => AttributeData::Dense(vec![default.clone(); len]),
            AttributeRepr::Constant => AttributeData::Constant(default.clone()),
            AttributeRepr::Sparse => AttributeData::Sparse(HashMap::new()),
        };
        Self { default, len, data }
    }

    /// The representation this attribute stores values in.
    #[inline]
    pub fn repr(&self) -> AttributeRepr {
        match self.data {
            AttributeData::Dense(_) => AttributeRepr::Dense,
            AttributeData::Constant(_) => AttributeRepr::Constant,
            AttributeData::Sparse(_) => AttributeRepr::Sparse,
        }
    }

    /// The value read by indices that were never set.
    ///
    /// For Constant attributes this is the value the attribute was created
    /// with; the current shared value may differ after a `set`.
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Logical size of the attribute (equal to the owning manager's size).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the element set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value at `index`.
    ///
    /// # Errors
    /// Returns `Err(IndexOutOfRange)` if `index >= len`.
    pub fn get(&self, index: usize) -> Result<&T, ModelWeldError> {
        if index >= self.len {
            return Err(ModelWeldError::IndexOutOfRange {
                index,
                size: self.len,
            });
        }
        Ok(match &self.data {
            AttributeData::Dense(values) => &values[index],
            AttributeData::Constant(value) => value,
            AttributeData::Sparse(values) => {
                values.get(&(index as u32)).unwrap_or(&self.default)
            }
        })
    }

    /// Sets the value at `index`.
    ///
    /// For a Constant attribute this replaces the single shared value, so
    /// every index reads the new value afterwards.
    ///
    /// # Errors
    /// Returns `Err(IndexOutOfRange)` if `index >= len`; the attribute is
    /// untouched.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), ModelWeldError> {
        if index >= self.len {
            return Err(ModelWeldError::IndexOutOfRange {
                index,
                size: self.len,
            });
        }
        match &mut self.data {
            AttributeData::Dense(values) => values[index] = value,
            AttributeData::Constant(shared) => *shared = value,
            AttributeData::Sparse(values) => {
                values.insert(index as u32, value);
            }
        }
        Ok(())
    }

    /// Number of indices holding an explicitly-set value.
    ///
    /// Dense reports the full size, Constant reports 0 or the full size
    /// depending on nothing (always the full size), Sparse reports its
    /// occupancy.
    pub fn nb_set_values(&self) -> usize {
        match &self.data {
            AttributeData::Dense(values) => values.len(),
            AttributeData::Constant(_) => self.len,
            AttributeData::Sparse(values) => values.len(),
        }
    }

    /// Grows or shrinks the attribute to logical size `new_len`.
    ///
    /// Growth pads with the default value; shrink truncates silently,
    /// including sparse keys at or beyond `new_len`.
    pub(crate) fn resize(&mut self, new_len: usize) {
        match &mut self.data {
            AttributeData::Dense(values) => values.resize(new_len, self.default.clone()),
            AttributeData::Constant(_) => {}
            AttributeData::Sparse(values) => {
                if new_len < self.len {
                    values.retain(|&index, _| (index as usize) < new_len);
                }
            }
        }
        self.len = new_len;
    }

    /// Reindexes the attribute per an old→new mapping whose old side covers
    /// the current size. Deleted entries are dropped; survivors land at their
    /// new index.
    pub(crate) fn apply_old2new(&mut self, map: &Old2New) {
        debug_assert_eq!(map.len(), self.len);
        match &mut self.data {
            AttributeData::Dense(values) => {
                let old = std::mem::replace(values, Vec::new());
                let mut new = vec![self.default.clone(); map.new_len()];
                for (old_index, value) in old.into_iter().enumerate() {
                    let new_index = map.raw(old_index);
                    if new_index != NO_ID {
                        new[new_index as usize] = value;
                    }
                }
                *values = new;
            }
            AttributeData::Constant(_) => {}
            AttributeData::Sparse(values) => {
                let old = std::mem::replace(values, HashMap::new());
                for (old_index, value) in old {
                    if let Some(new_index) = map.get(old_index as usize) {
                        values.insert(new_index, value);
                    }
                }
            }
        }
        self.len = map.new_len();
    }

    /// Encodes the attribute payload (current values, not the default) as one
    /// byte string. Sparse entries are sorted by index so the encoding is
    /// deterministic.
    pub(crate) fn encode_payload(&self) -> Result<Vec<u8>, ModelWeldError> {
        match &self.data {
            AttributeData::Dense(values) => record::encode(values),
            AttributeData::Constant(value) => record::encode(value),
            AttributeData::Sparse(values) => {
                let entries: Vec<(u32, T)> = values
                    .iter()
                    .map(|(&index, value)| (index, value.clone()))
                    .sorted_by_key(|(index, _)| *index)
                    .collect();
                record::encode(&entries)
            }
        }
    }

    /// Rebuilds an attribute from an encoded payload.
    ///
    /// # Errors
    /// Returns `Err(RecordCodec)` if the bytes do not decode as the payload
    /// shape of `repr`.
    pub(crate) fn decode_payload(
        default: T,
        repr: AttributeRepr,
        len: usize,
        payload: &[u8],
    ) -> Result<Self, ModelWeldError> {
        let data = match repr {
            AttributeRepr::Dense => AttributeData::Dense(record::decode::<Vec<T>>(payload)?),
            AttributeRepr::Constant => AttributeData::Constant(record::decode::<T>(payload)?),
            AttributeRepr::Sparse => {
                let entries: Vec<(u32, T)> = record::decode(payload)?;
                AttributeData::Sparse(entries.into_iter().collect())
            }
        };
        Ok(Self { default, len, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reprs() -> [AttributeRepr; 3] {
        [
            AttributeRepr::Dense,
            AttributeRepr::Constant,
            AttributeRepr::Sparse,
        ]
    }

    #[test]
    fn unset_indices_read_default() {
        for repr in reprs() {
            let attr = Attribute::new(1.5f64, repr, 4);
            for index in 0..4 {
                assert_eq!(*attr.get(index).unwrap(), 1.5, "{repr:?}");
            }
        }
    }

    #[test]
    fn out_of_range_fails_fast() {
        for repr in reprs() {
            let mut attr = Attribute::new(0u32, repr, 3);
            assert!(matches!(
                attr.get(3),
                Err(ModelWeldError::IndexOutOfRange { index: 3, size: 3 })
            ));
            assert!(attr.set(7, 1).is_err());
        }
    }

    #[test]
    fn constant_set_is_shared() {
        let mut attr = Attribute::new(0i32, AttributeRepr::Constant, 5);
        attr.set(2, 9).unwrap();
        assert_eq!(*attr.get(0).unwrap(), 9);
        assert_eq!(*attr.get(4).unwrap(), 9);
        // The creation default is unchanged.
        assert_eq!(*attr.default_value(), 0);
    }

    #[test]
    fn resize_preserves_prefix_and_pads_with_default() {
        for repr in reprs() {
            let mut attr = Attribute::new(0i64, repr, 3);
            attr.set(1, 8).unwrap();
            attr.resize(5);
            assert_eq!(attr.len(), 5);
            assert_eq!(*attr.get(1).unwrap(), 8);
            if repr != AttributeRepr::Constant {
                assert_eq!(*attr.get(4).unwrap(), 0);
            }
        }
    }

    #[test]
    fn shrink_truncates_sparse_keys() {
        let mut attr = Attribute::new(0u8, AttributeRepr::Sparse, 10);
        attr.set(2, 1).unwrap();
        attr.set(9, 2).unwrap();
        attr.resize(5);
        assert_eq!(attr.len(), 5);
        assert_eq!(attr.nb_set_values(), 1);
        assert_eq!(*attr.get(2).unwrap(), 1);
        // Growing back exposes the default, not the truncated value.
        attr.resize(10);
        assert_eq!(*attr.get(9).unwrap(), 0);
    }

    #[test]
    fn apply_old2new_moves_survivors() {
        let map = Old2New::from_delete_mask(&[false, true, false, false]);
        for repr in [AttributeRepr::Dense, AttributeRepr::Sparse] {
            let mut attr = Attribute::new(0u32, repr, 4);
            attr.set(0, 10).unwrap();
            attr.set(2, 20).unwrap();
            attr.apply_old2new(&map);
            assert_eq!(attr.len(), 3);
            assert_eq!(*attr.get(0).unwrap(), 10);
            assert_eq!(*attr.get(1).unwrap(), 20);
            assert_eq!(*attr.get(2).unwrap(), 0);
        }
    }

    #[test]
    fn apply_old2new_constant_is_untouched() {
        let map = Old2New::from_delete_mask(&[true, false]);
        let mut attr = Attribute::new(3u16, AttributeRepr::Constant, 2);
        attr.apply_old2new(&map);
        assert_eq!(attr.len(), 1);
        assert_eq!(*attr.get(0).unwrap(), 3);
    }

    #[test]
    fn payload_roundtrip() {
        for repr in reprs() {
            let mut attr = Attribute::new(0.0f32, repr, 6);
            attr.set(3, 2.5).unwrap();
            let bytes = attr.encode_payload().unwrap();
            let back = Attribute::decode_payload(0.0f32, repr, 6, &bytes).unwrap();
            for index in 0..6 {
                assert_eq!(back.get(index).unwrap(), attr.get(index).unwrap());
            }
        }
    }
}
