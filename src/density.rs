//! Density matrices built from occupied molecular-orbital coefficients
//!
//! For occupied coefficient blocks `Ca` (nAlpha x N) and `Cb` (nBeta x N):
//!
//! - `Pa = Ca^T Ca`, `Pb = Cb^T Cb`
//! - total `Pa + Pb`, spin `Pa - Pb`
//! - the Mulliken diatomic density is the total density with every
//!   intra-atom block zeroed, the atomic density is what was zeroed.
//!
//! No overlap weighting is applied to the Mulliken split.

use std::fmt;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};
use crate::linalg::{gram, Matrix};
use crate::partition::AtomPartition;

/// Kind of density surface a matrix describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityKind {
    Alpha,
    Beta,
    Total,
    Spin,
    MullikenDiatomic,
    MullikenAtomic,
}

impl DensityKind {
    /// Construction order of the computed densities
    pub const ALL: [DensityKind; 6] = [
        DensityKind::Alpha,
        DensityKind::Beta,
        DensityKind::Total,
        DensityKind::Spin,
        DensityKind::MullikenDiatomic,
        DensityKind::MullikenAtomic,
    ];

    /// Default display label
    pub fn label(&self) -> &'static str {
        match self {
            DensityKind::Alpha => "Alpha Density",
            DensityKind::Beta => "Beta Density",
            DensityKind::Total => "Total Density",
            DensityKind::Spin => "Spin Density",
            DensityKind::MullikenDiatomic => "Mulliken Diatomic Density",
            DensityKind::MullikenAtomic => "Mulliken Atomic Density",
        }
    }
}

impl fmt::Display for DensityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A labelled N x N density matrix
///
/// The matrix is only reachable through a shared reference, so a density
/// cannot change after it has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    kind: DensityKind,
    label: String,
    matrix: Matrix,
}

impl DensityMatrix {
    /// Wraps a square matrix. Fails when `matrix` is not square.
    pub fn new(kind: DensityKind, label: impl Into<String>, matrix: Matrix) -> Result<Self> {
        if matrix.nrows() != matrix.ncols() {
            return Err(DensityError::DimensionMismatch(format!(
                "density matrix must be square, found {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }

        Ok(Self {
            kind,
            label: label.into(),
            matrix,
        })
    }

    /// Uses the kind's default label
    pub fn with_default_label(kind: DensityKind, matrix: Matrix) -> Result<Self> {
        Self::new(kind, kind.label(), matrix)
    }

    pub fn kind(&self) -> DensityKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Number of basis functions
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Builds `C^T C` from an occupied coefficient block
///
/// Fails with [`DensityError::DimensionMismatch`] when `coefficients` does
/// not have `n_basis` columns.
pub fn density_from_occupied(coefficients: ArrayView2<f64>, n_basis: usize) -> Result<Matrix> {
    if coefficients.ncols() != n_basis {
        return Err(DensityError::DimensionMismatch(format!(
            "coefficient matrix has {} columns, expected {} basis functions",
            coefficients.ncols(),
            n_basis
        )));
    }

    Ok(gram(coefficients))
}

/// Splits a total density into its (diatomic, atomic) Mulliken parts
///
/// The diatomic part is `total` with each `block x block` square of the
/// partition zeroed; the atomic part is `total - diatomic`, i.e. exactly the
/// zeroed entries, so the two always add back to `total`.
pub fn mulliken_split(total: &Matrix, partition: &AtomPartition) -> Result<(Matrix, Matrix)> {
    let n = partition.n_basis();
    if total.dim() != (n, n) {
        return Err(DensityError::DimensionMismatch(format!(
            "density is {}x{}, partition covers {} basis functions",
            total.nrows(),
            total.ncols(),
            n
        )));
    }

    let mut diatomic = total.clone();
    for block in partition.blocks() {
        for i in block.clone() {
            for j in block.clone() {
                diatomic[[i, j]] = 0.0;
            }
        }
    }

    let atomic = total - &diatomic;

    Ok((diatomic, atomic))
}

/// Builds the six computed densities in catalog order
///
/// Returns Alpha, Beta, Total, Spin, MullikenDiatomic and MullikenAtomic.
/// `alpha` and `beta` hold only the occupied rows. Nothing is returned unless
/// every matrix could be built.
pub fn build_densities(
    alpha: ArrayView2<f64>,
    beta: ArrayView2<f64>,
    partition: &AtomPartition,
) -> Result<Vec<DensityMatrix>> {
    let n = partition.n_basis();

    let pa = density_from_occupied(alpha, n)?;
    let pb = density_from_occupied(beta, n)?;

    let total = &pa + &pb;
    let spin = &pa - &pb;
    let (diatomic, atomic) = mulliken_split(&total, partition)?;

    [pa, pb, total, spin, diatomic, atomic]
        .into_iter()
        .zip(DensityKind::ALL)
        .map(|(matrix, kind)| DensityMatrix::with_default_label(kind, matrix))
        .collect()
}
