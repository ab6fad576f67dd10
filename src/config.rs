//! Settings for the first-order density computation

use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};

fn default_bin_width() -> f64 {
    0.1
}

fn default_chunk_size() -> usize {
    4096
}

/// How the co-located values of all orbital grids are combined at one point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combination {
    /// Sum of squared orbital values, the orbital-product density
    #[default]
    SquaredSum,
    /// Product of all orbital values
    Product,
}

impl Combination {
    /// Combines the values of one sample point
    pub fn combine<I>(&self, values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        match self {
            Combination::SquaredSum => values.into_iter().map(|v| v * v).sum(),
            Combination::Product => values.into_iter().product(),
        }
    }
}

/// First-order density settings
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderDensityConfig {
    /// Histogram bin width
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,

    /// Sample points processed between cancellation checks and progress updates
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default)]
    pub combination: Combination,
}

impl Default for FirstOrderDensityConfig {
    fn default() -> Self {
        Self {
            bin_width: default_bin_width(),
            chunk_size: default_chunk_size(),
            combination: Combination::default(),
        }
    }
}

impl FirstOrderDensityConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_bin_width(mut self, bin_width: f64) -> Self {
        self.bin_width = bin_width;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_combination(mut self, combination: Combination) -> Self {
        self.combination = combination;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(DensityError::InvalidConfig(format!(
                "bin width must be positive, found {}",
                self.bin_width
            )));
        }
        if self.chunk_size == 0 {
            return Err(DensityError::InvalidConfig(
                "chunk size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
