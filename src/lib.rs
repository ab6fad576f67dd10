//! # Orbital Density
//!
//! This library builds electron density matrices from precomputed
//! molecular-orbital coefficients and computes first-order density
//! histograms from per-orbital spatial grids on a background worker.
//!
//! ## Modules
//!
//! - `linalg`: Linear algebra utilities in functional style
//! - `partition`: Atom-indexed basis-function ranges
//! - `density`: Alpha/Beta/Total/Spin and Mulliken density matrices
//! - `catalog`: Ordered collection of available densities
//! - `orbitals`: Orbital coefficients, occupations and energies
//! - `grid`: Per-orbital grids and their sampling geometry
//! - `histogram`: Fixed-width bin accumulator
//! - `progress`: Progress counters and reporters
//! - `config`: First-order density settings
//! - `engine`: Cancellable first-order density computation

pub mod catalog;
pub mod config;
pub mod density;
pub mod engine;
pub mod error;
pub mod grid;
pub mod histogram;
pub mod linalg;
pub mod orbitals;
pub mod partition;
pub mod progress;

/// Re-export commonly used types
pub use catalog::DensityCatalog;
pub use config::{Combination, FirstOrderDensityConfig};
pub use density::{build_densities, DensityKind, DensityMatrix};
pub use engine::{CancelHandle, DensityTask, FirstOrderDensity, Outcome};
pub use error::{DensityError, Result};
pub use grid::{GridGeometry, OrbitalGrid, Spin};
pub use histogram::Histogram;
pub use linalg::{Matrix, Vector};
pub use orbitals::{CanonicalOrbitals, OrbitalType};
pub use partition::AtomPartition;
pub use progress::{ChannelReporter, Progress, ProgressReporter};
