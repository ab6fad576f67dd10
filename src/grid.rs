//! Per-orbital scalar fields sampled on a regular 3D grid
//!
//! Grids are produced elsewhere; this module only describes their shape and
//! lets the first-order engine check that a set of grids shares one sampling
//! geometry before it combines them point by point.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};

/// Positions closer than this (in Bohr) are treated as the same sample point
const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Spin channel of an orbital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spin {
    Alpha,
    Beta,
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Alpha => f.write_str("alpha"),
            Spin::Beta => f.write_str("beta"),
        }
    }
}

/// Regular sampling lattice: `points[k]` samples along axis `k`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Position of the first sample, in Bohr
    pub origin: [f64; 3],
    /// Distance between neighbouring samples along each axis
    pub spacing: [f64; 3],
    pub points: [usize; 3],
}

impl GridGeometry {
    pub fn new(origin: [f64; 3], spacing: [f64; 3], points: [usize; 3]) -> Self {
        Self {
            origin,
            spacing,
            points,
        }
    }

    /// Total number of sample points
    pub fn len(&self) -> usize {
        self.points.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same point counts and, within tolerance, the same sample positions
    pub fn matches(&self, other: &GridGeometry) -> bool {
        let close = |a: &[f64; 3], b: &[f64; 3]| {
            a.iter().zip(b).all(|(x, y)| (x - y).abs() <= GEOMETRY_TOLERANCE)
        };

        self.points == other.points
            && close(&self.origin, &other.origin)
            && close(&self.spacing, &other.spacing)
    }

    /// Cartesian position of the sample at flat index `index`
    ///
    /// The last axis varies fastest.
    pub fn position(&self, index: usize) -> Option<[f64; 3]> {
        if index >= self.len() {
            return None;
        }
        let [_, ny, nz] = self.points;
        let i = index / (ny * nz);
        let j = (index / nz) % ny;
        let k = index % nz;

        Some([
            self.origin[0] + i as f64 * self.spacing[0],
            self.origin[1] + j as f64 * self.spacing[1],
            self.origin[2] + k as f64 * self.spacing[2],
        ])
    }
}

/// Values of one orbital sampled on a [`GridGeometry`]
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalGrid {
    orbital: usize,
    spin: Spin,
    geometry: GridGeometry,
    values: Vec<f64>,
}

impl OrbitalGrid {
    /// Fails with [`DensityError::DimensionMismatch`] when the value count
    /// differs from the number of sample points.
    pub fn new(orbital: usize, spin: Spin, geometry: GridGeometry, values: Vec<f64>) -> Result<Self> {
        if values.len() != geometry.len() {
            return Err(DensityError::DimensionMismatch(format!(
                "{} orbital {} grid has {} values for {} sample points",
                spin,
                orbital,
                values.len(),
                geometry.len()
            )));
        }

        Ok(Self {
            orbital,
            spin,
            geometry,
            values,
        })
    }

    /// Samples `f` at every point of `geometry`
    pub fn from_fn<F>(orbital: usize, spin: Spin, geometry: GridGeometry, f: F) -> Self
    where
        F: Fn([f64; 3]) -> f64,
    {
        let values = (0..geometry.len())
            .filter_map(|idx| geometry.position(idx))
            .map(f)
            .collect();

        Self {
            orbital,
            spin,
            geometry,
            values,
        }
    }

    pub fn orbital(&self) -> usize {
        self.orbital
    }

    pub fn spin(&self) -> Spin {
        self.spin
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Checks that every grid shares the geometry of the first
///
/// Returns the shared geometry, or `None` for an empty slice.
pub fn common_geometry(grids: &[Arc<OrbitalGrid>]) -> Result<Option<GridGeometry>> {
    let Some(first) = grids.first() else {
        return Ok(None);
    };
    let reference = first.geometry;

    match grids.iter().position(|g| !g.geometry.matches(&reference)) {
        Some(index) => Err(DensityError::GeometryMismatch { index }),
        None => Ok(Some(reference)),
    }
}

/// Grids of the given spin channel, ordered by orbital index
pub fn select_spin(grids: &[Arc<OrbitalGrid>], spin: Spin) -> Vec<Arc<OrbitalGrid>> {
    let mut selected: Vec<_> = grids.iter().filter(|g| g.spin == spin).cloned().collect();
    selected.sort_by_key(|g| g.orbital);
    selected
}
