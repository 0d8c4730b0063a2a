//! Old→new index mappings produced by structural edits.
//!
//! Every bulk edit of an element set (delete, permute) is summarized by an
//! [`Old2New`] mapping: for each old index, either the new index it moved to
//! or the [`NO_ID`] sentinel marking a deleted entry. The mapping is what the
//! attribute manager returns from `delete_elements`/`permute_elements` and
//! what the vertex identifier consumes to rewrite cross-component links.

use crate::model_error::ModelWeldError;

/// Sentinel marking a deleted entry in an [`Old2New`] mapping.
pub const NO_ID: u32 = u32::MAX;

/// Mapping from old element indices to new ones, with [`NO_ID`] for deleted
/// entries.
///
/// # Invariants
///
/// - Surviving new indices form exactly `[0, new_len)`, each appearing once.
/// - `new_len <= len`, with equality iff nothing was deleted.
///
/// Both constructors ([`from_delete_mask`](Self::from_delete_mask),
/// [`from_permutation`](Self::from_permutation)) establish these invariants;
/// the raw entries are not otherwise mutable.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Old2New {
    entries: Vec<u32>,
    new_len: usize,
}

impl Old2New {
    /// The identity mapping on `[0, n)`.
    pub fn identity(n: usize) -> Self {
        Self {
            entries: (0..n as u32).collect(),
            new_len: n,
        }
    }

    /// Builds the compaction mapping for a delete mask (`true` = remove).
    ///
    /// Survivors keep their relative order and are packed to
    /// `[0, n - removed)`.
    ///
    /// # Complexity
    /// One **O(n)** pass.
    pub fn from_delete_mask(mask: &[bool]) -> Self {
        let mut entries = Vec::with_capacity(mask.len());
        let mut next = 0u32;
        for &remove in mask {
            if remove {
                entries.push(NO_ID);
            } else {
                entries.push(next);
                next += 1;
            }
        }
        Self {
            entries,
            new_len: next as usize,
        }
    }

    /// Builds the mapping for a permutation, `perm[old] = new`.
    ///
    /// # Errors
    /// Returns `Err(InvalidPermutation)` if `perm` is not a bijection onto
    /// `[0, perm.len())`; the offending new index is reported.
    pub fn from_permutation(perm: &[u32]) -> Result<Self, ModelWeldError> {
        let n = perm.len();
        let mut seen = vec![false; n];
        for &new in perm {
            if new as usize >= n || seen[new as usize] {
                return Err(ModelWeldError::InvalidPermutation(new));
            }
            seen[new as usize] = true;
        }
        Ok(Self {
            entries: perm.to_vec(),
            new_len: n,
        })
    }

    /// Number of old indices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping covers an empty element set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of surviving (new) indices.
    #[inline]
    pub fn new_len(&self) -> usize {
        self.new_len
    }

    /// New index for `old`, or `None` if `old` was deleted or out of range.
    #[inline]
    pub fn get(&self, old: usize) -> Option<u32> {
        match self.entries.get(old) {
            Some(&NO_ID) | None => None,
            Some(&new) => Some(new),
        }
    }

    /// Raw entry for `old`, including the [`NO_ID`] sentinel.
    ///
    /// # Panics
    /// Panics if `old` is out of range; use [`get`](Self::get) for checked
    /// access.
    #[inline]
    pub fn raw(&self, old: usize) -> u32 {
        self.entries[old]
    }

    /// Whether every entry maps to itself (nothing moved, nothing deleted).
    pub fn is_identity(&self) -> bool {
        self.new_len == self.entries.len()
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(old, &new)| old as u32 == new)
    }

    /// Iterates `(old, new)` pairs, with `new == NO_ID` for deleted entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.entries.iter().copied().enumerate()
    }

    /// The raw entry slice, `NO_ID` marking deleted indices.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.entries
    }

    /// Applies the mapping to an external array of the old size, reproducing
    /// the compaction/reordering a manager applied internally.
    ///
    /// # Errors
    /// Returns `Err(MappingLengthMismatch)` if `values` is not of the old
    /// size.
    pub fn apply_to<T: Clone>(&self, values: &[T]) -> Result<Vec<T>, ModelWeldError> {
        if values.len() != self.entries.len() {
            return Err(ModelWeldError::MappingLengthMismatch {
                expected: self.entries.len(),
                found: values.len(),
            });
        }
        let mut out: Vec<Option<T>> = vec![None; self.new_len];
        for (old, &new) in self.entries.iter().enumerate() {
            if new != NO_ID {
                out[new as usize] = Some(values[old].clone());
            }
        }
        // Every new slot is filled by the bijection-onto-[0,new_len) invariant.
        Ok(out.into_iter().map(|v| v.unwrap()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_mask_compacts_survivors() {
        let m = Old2New::from_delete_mask(&[false, false, true, false, false]);
        assert_eq!(m.as_slice(), &[0, 1, NO_ID, 2, 3]);
        assert_eq!(m.len(), 5);
        assert_eq!(m.new_len(), 4);
        assert_eq!(m.get(2), None);
        assert_eq!(m.get(3), Some(2));
        assert_eq!(m.get(99), None);
    }

    #[test]
    fn identity_is_identity() {
        assert!(Old2New::identity(4).is_identity());
        assert!(!Old2New::from_delete_mask(&[true, false]).is_identity());
        let swap = Old2New::from_permutation(&[1, 0]).unwrap();
        assert!(!swap.is_identity());
    }

    #[test]
    fn permutation_validation() {
        assert!(Old2New::from_permutation(&[2, 0, 1]).is_ok());
        assert_eq!(
            Old2New::from_permutation(&[0, 0, 1]).unwrap_err(),
            ModelWeldError::InvalidPermutation(0)
        );
        assert_eq!(
            Old2New::from_permutation(&[0, 3]).unwrap_err(),
            ModelWeldError::InvalidPermutation(3)
        );
    }

    #[test]
    fn apply_reproduces_compaction() {
        let m = Old2New::from_delete_mask(&[true, false, false, true]);
        assert_eq!(m.apply_to(&['a', 'b', 'c', 'd']).unwrap(), vec!['b', 'c']);
    }

    #[test]
    fn apply_reproduces_reordering() {
        let m = Old2New::from_permutation(&[2, 0, 1]).unwrap();
        assert_eq!(m.apply_to(&[10, 20, 30]).unwrap(), vec![20, 30, 10]);
    }

    #[test]
    fn apply_checks_length() {
        let m = Old2New::identity(3);
        assert_eq!(
            m.apply_to(&[1]).unwrap_err(),
            ModelWeldError::MappingLengthMismatch {
                expected: 3,
                found: 1
            }
        );
    }
}
