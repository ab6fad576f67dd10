//! Atom-indexed partitioning of the basis-function range
//!
//! Each atom owns a contiguous run of basis functions. The partition is built
//! from the per-atom start offsets reported by the shell list and is used to
//! split density matrices into intra-atom and inter-atom parts.

use std::ops::Range;

use crate::error::{DensityError, Result};

/// Closed-open basis-function ranges, one per atom, in atom order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomPartition {
    blocks: Vec<Range<usize>>,
    n_basis: usize,
}

impl AtomPartition {
    /// Builds the partition from per-atom start offsets
    ///
    /// `offsets[a]` is the first basis function on atom `a`. The terminal
    /// sentinel `n_basis` is appended unless the table already ends with it.
    /// An empty table gives an empty partition.
    ///
    /// Fails with [`DensityError::DimensionMismatch`] when the table does not
    /// start at 0, is not strictly increasing, or runs past `n_basis`.
    pub fn from_offsets(offsets: &[usize], n_basis: usize) -> Result<Self> {
        if offsets.is_empty() {
            return Ok(Self {
                blocks: Vec::new(),
                n_basis,
            });
        }

        if offsets[0] != 0 {
            return Err(DensityError::DimensionMismatch(format!(
                "atom offsets must start at 0, found {}",
                offsets[0]
            )));
        }

        let mut bounds = offsets.to_vec();
        if bounds.last() != Some(&n_basis) {
            bounds.push(n_basis);
        }

        if let Some(w) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DensityError::DimensionMismatch(format!(
                "atom offsets must be strictly increasing up to {} basis functions, found {} followed by {}",
                n_basis, w[0], w[1]
            )));
        }

        let blocks = bounds.windows(2).map(|w| w[0]..w[1]).collect();

        Ok(Self { blocks, n_basis })
    }

    pub fn blocks(&self) -> &[Range<usize>] {
        &self.blocks
    }

    pub fn n_atoms(&self) -> usize {
        self.blocks.len()
    }

    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    /// Atom owning basis function `index`, if any
    pub fn atom_of(&self, index: usize) -> Option<usize> {
        // blocks are sorted and contiguous
        let atom = self.blocks.partition_point(|b| b.end <= index);
        self.blocks
            .get(atom)
            .filter(|b| b.contains(&index))
            .map(|_| atom)
    }

    /// True when basis functions `i` and `j` sit on the same atom
    pub fn same_atom(&self, i: usize, j: usize) -> bool {
        match (self.atom_of(i), self.atom_of(j)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_atoms_with_sentinel() {
        let p = AtomPartition::from_offsets(&[0, 2, 5], 5).unwrap();
        assert_eq!(p.blocks(), &[0..2, 2..5]);
        assert_eq!(p.n_atoms(), 2);
        assert_eq!(p.n_basis(), 5);
    }

    #[test]
    fn test_sentinel_is_appended() {
        let p = AtomPartition::from_offsets(&[0, 2], 5).unwrap();
        assert_eq!(p.blocks(), &[0..2, 2..5]);
    }

    #[test]
    fn test_single_atom() {
        let p = AtomPartition::from_offsets(&[0], 7).unwrap();
        assert_eq!(p.blocks(), &[0..7]);
        assert_eq!(p.n_atoms(), 1);
        assert!(p.same_atom(0, 6));
    }

    #[test]
    fn test_zero_atoms() {
        let p = AtomPartition::from_offsets(&[], 4).unwrap();
        assert_eq!(p.n_atoms(), 0);
        assert_eq!(p.n_basis(), 4);
        assert_eq!(p.atom_of(0), None);
    }

    #[test]
    fn test_rejects_non_increasing() {
        let err = AtomPartition::from_offsets(&[0, 3, 3], 5).unwrap_err();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));

        let err = AtomPartition::from_offsets(&[0, 4, 2], 5).unwrap_err();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));
    }

    #[test]
    fn test_rejects_offsets_past_basis_size() {
        let err = AtomPartition::from_offsets(&[0, 2, 6], 5).unwrap_err();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));

        let err = AtomPartition::from_offsets(&[0, 5, 6], 5).unwrap_err();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));
    }

    #[test]
    fn test_rejects_nonzero_start() {
        let err = AtomPartition::from_offsets(&[1, 3], 5).unwrap_err();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));
    }

    #[test]
    fn test_atom_lookup() {
        let p = AtomPartition::from_offsets(&[0, 1, 4], 6).unwrap();
        assert_eq!(p.atom_of(0), Some(0));
        assert_eq!(p.atom_of(1), Some(1));
        assert_eq!(p.atom_of(3), Some(1));
        assert_eq!(p.atom_of(4), Some(2));
        assert_eq!(p.atom_of(5), Some(2));
        assert_eq!(p.atom_of(6), None);

        assert!(p.same_atom(1, 3));
        assert!(!p.same_atom(0, 1));
        assert!(!p.same_atom(5, 6));
    }
}
