//! Molecular-orbital data consumed by the density builders
//!
//! Coefficients, energies and atom offsets come from an external orbital
//! provider. This module only slices out the occupied orbitals and hands them
//! to the density and first-order density code.

use std::sync::Arc;

use ndarray::{s, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::FirstOrderDensityConfig;
use crate::density::{build_densities, DensityMatrix};
use crate::engine::{DensityTask, FirstOrderDensity};
use crate::error::{DensityError, Result};
use crate::grid::{select_spin, OrbitalGrid, Spin};
use crate::linalg::{Matrix, Vector};
use crate::partition::AtomPartition;
use crate::progress::ProgressReporter;

/// How the orbitals were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitalType {
    /// Eigenfunctions of the Fock operator
    Canonical,
    Localized,
    Natural,
}

/// Orbital set with per-spin coefficients and energies
///
/// Coefficient rows are orbitals in energy order and columns are basis
/// functions, so the first `n_alpha` rows of `alpha_coefficients` are the
/// occupied alpha orbitals.
#[derive(Debug, Clone)]
pub struct CanonicalOrbitals {
    pub orbital_type: OrbitalType,
    /// Number of basis functions
    pub n_basis: usize,
    pub n_alpha: usize,
    pub n_beta: usize,
    pub alpha_coefficients: Matrix,
    pub beta_coefficients: Matrix,
    pub alpha_energies: Vector,
    pub beta_energies: Vector,
    /// First basis function of each atom
    pub atom_offsets: Vec<usize>,
    /// Alpha and beta share spatial orbitals
    pub restricted: bool,
}

impl CanonicalOrbitals {
    /// Creates a restricted orbital set: beta orbitals equal alpha orbitals
    pub fn restricted(
        coefficients: Matrix,
        energies: Vector,
        n_alpha: usize,
        n_beta: usize,
        atom_offsets: Vec<usize>,
    ) -> Self {
        Self {
            orbital_type: OrbitalType::Canonical,
            n_basis: coefficients.ncols(),
            n_alpha,
            n_beta,
            alpha_coefficients: coefficients.clone(),
            beta_coefficients: coefficients,
            alpha_energies: energies.clone(),
            beta_energies: energies,
            atom_offsets,
            restricted: true,
        }
    }

    /// Creates an unrestricted orbital set with separate alpha and beta orbitals
    pub fn unrestricted(
        alpha: (Matrix, Vector),
        beta: (Matrix, Vector),
        n_alpha: usize,
        n_beta: usize,
        atom_offsets: Vec<usize>,
    ) -> Self {
        Self {
            orbital_type: OrbitalType::Canonical,
            n_basis: alpha.0.ncols(),
            n_alpha,
            n_beta,
            alpha_coefficients: alpha.0,
            beta_coefficients: beta.0,
            alpha_energies: alpha.1,
            beta_energies: beta.1,
            atom_offsets,
            restricted: false,
        }
    }

    pub fn with_orbital_type(mut self, orbital_type: OrbitalType) -> Self {
        self.orbital_type = orbital_type;
        self
    }

    pub fn alpha_orbital_energy(&self, index: usize) -> Option<f64> {
        self.alpha_energies.get(index).copied()
    }

    pub fn beta_orbital_energy(&self, index: usize) -> Option<f64> {
        self.beta_energies.get(index).copied()
    }

    pub fn orbital_energy(&self, index: usize, spin: Spin) -> Option<f64> {
        match spin {
            Spin::Alpha => self.alpha_orbital_energy(index),
            Spin::Beta => self.beta_orbital_energy(index),
        }
    }

    /// Number of occupied orbitals in `spin`
    pub fn occupied_count(&self, spin: Spin) -> usize {
        match spin {
            Spin::Alpha => self.n_alpha,
            Spin::Beta => self.n_beta,
        }
    }

    /// The occupied rows of the `spin` coefficient matrix
    pub fn occupied(&self, spin: Spin) -> Result<ArrayView2<'_, f64>> {
        let (coefficients, n_occ) = match spin {
            Spin::Alpha => (&self.alpha_coefficients, self.n_alpha),
            Spin::Beta => (&self.beta_coefficients, self.n_beta),
        };

        if n_occ > coefficients.nrows() {
            return Err(DensityError::DimensionMismatch(format!(
                "{} occupied {} orbitals but only {} coefficient rows",
                n_occ,
                spin,
                coefficients.nrows()
            )));
        }

        Ok(coefficients.slice(s![..n_occ, ..]))
    }

    /// Basis-function ranges of each atom
    pub fn partition(&self) -> Result<AtomPartition> {
        AtomPartition::from_offsets(&self.atom_offsets, self.n_basis)
    }

    /// Alpha, Beta, Total, Spin and the two Mulliken densities
    pub fn density_matrices(&self) -> Result<Vec<DensityMatrix>> {
        let partition = self.partition()?;
        build_densities(
            self.occupied(Spin::Alpha)?,
            self.occupied(Spin::Beta)?,
            &partition,
        )
    }

    /// Starts the first-order density histogram over the alpha grids
    ///
    /// Beta grids are ignored. Every alpha grid is handed to the engine, which
    /// requires one grid per occupied alpha orbital. Only restricted orbital
    /// sets are supported.
    pub fn first_order_density(
        &self,
        grids: &[Arc<OrbitalGrid>],
        config: FirstOrderDensityConfig,
        reporter: Option<Box<dyn ProgressReporter>>,
    ) -> Result<DensityTask> {
        if !self.restricted {
            let err = DensityError::UnsupportedConfiguration(
                "first-order density is only available for restricted orbitals".to_string(),
            );
            log::error!("{}", err);
            return Err(err);
        }

        let alpha = select_spin(grids, Spin::Alpha);
        FirstOrderDensity::new(config)?.start(alpha, self.n_alpha, reporter)
    }
}
