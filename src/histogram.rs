//! Fixed-width histogram of accumulated sample contributions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};

/// Bins of width `bin_width`; bin `k` covers `[k * w, (k + 1) * w)`
///
/// Only visited bins are stored; every other bin reads as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bin_width: f64,
    bins: BTreeMap<i64, f64>,
}

impl Histogram {
    /// Fails with [`DensityError::InvalidConfig`] unless `bin_width` is a
    /// positive finite number.
    pub fn new(bin_width: f64) -> Result<Self> {
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(DensityError::InvalidConfig(format!(
                "bin width must be positive, found {}",
                bin_width
            )));
        }

        Ok(Self {
            bin_width,
            bins: BTreeMap::new(),
        })
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Index of the bin holding `value`: `floor(value / bin_width)`
    pub fn bin_index(&self, value: f64) -> i64 {
        (value / self.bin_width).floor() as i64
    }

    /// Adds `amount` to the bin selected by `value`
    pub fn accumulate(&mut self, value: f64, amount: f64) {
        let index = self.bin_index(value);
        *self.bins.entry(index).or_insert(0.0) += amount;
    }

    /// Adds `value` to its own bin
    pub fn add(&mut self, value: f64) {
        self.accumulate(value, value);
    }

    /// Accumulated value of bin `index`, zero if never visited
    pub fn get(&self, index: i64) -> f64 {
        self.bins.get(&index).copied().unwrap_or(0.0)
    }

    /// Visited bins as `(bin index, accumulated value)`, ascending
    pub fn bins(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.bins.iter().map(|(&k, &v)| (k, v))
    }

    /// Visited bins as `(lower bin edge, accumulated value)`, ascending
    pub fn rows(&self) -> Vec<(f64, f64)> {
        self.bins()
            .map(|(k, v)| (k as f64 * self.bin_width, v))
            .collect()
    }

    /// Sum over all bins
    pub fn total(&self) -> f64 {
        self.bins.values().sum()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
