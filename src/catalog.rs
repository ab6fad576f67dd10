//! Ordered collection of the density matrices available for display
//!
//! The catalog only grows. Entries keep the order they were added in and are
//! handed out by shared reference, so a renderer can read them while the
//! catalog is alive without any locking.

use crate::density::{DensityKind, DensityMatrix};
use crate::error::Result;
use crate::orbitals::{CanonicalOrbitals, OrbitalType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityCatalog {
    entries: Vec<DensityMatrix>,
}

impl DensityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the catalog for an orbital set
    ///
    /// `base` entries come first. For canonical orbitals the six computed
    /// densities follow in construction order. If the computation fails no
    /// catalog is produced.
    pub fn build(base: Vec<DensityMatrix>, orbitals: &CanonicalOrbitals) -> Result<Self> {
        let computed = match orbitals.orbital_type {
            OrbitalType::Canonical => orbitals.density_matrices()?,
            _ => Vec::new(),
        };

        let mut catalog = Self { entries: base };
        catalog.extend(computed);

        log::debug!("Number of available densities {}", catalog.len());

        Ok(catalog)
    }

    pub fn push(&mut self, density: DensityMatrix) {
        self.entries.push(density);
    }

    pub fn extend<I>(&mut self, densities: I)
    where
        I: IntoIterator<Item = DensityMatrix>,
    {
        self.entries.extend(densities);
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[DensityMatrix] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DensityMatrix> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&DensityMatrix> {
        self.entries.get(index)
    }

    /// Every entry of `kind`, in insertion order
    pub fn by_kind(&self, kind: DensityKind) -> Vec<&DensityMatrix> {
        self.entries.iter().filter(|d| d.kind() == kind).collect()
    }

    /// Every entry labelled `label`, in insertion order
    pub fn by_label(&self, label: &str) -> Vec<&DensityMatrix> {
        self.entries.iter().filter(|d| d.label() == label).collect()
    }

    /// `(kind, label)` of each entry, for selection lists
    pub fn kinds(&self) -> Vec<(DensityKind, &str)> {
        self.entries.iter().map(|d| (d.kind(), d.label())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a DensityCatalog {
    type Item = &'a DensityMatrix;
    type IntoIter = std::slice::Iter<'a, DensityMatrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
