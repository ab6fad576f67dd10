//! First-order density histogram computed on a background worker
//!
//! A run combines the values of all occupied alpha-orbital grids at every
//! shared sample point and bins the combined value by magnitude. The caller
//! gets a [`DensityTask`] back immediately: it can poll progress, request
//! cancellation, and collect the single terminal [`Outcome`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::FirstOrderDensityConfig;
use crate::error::{DensityError, Result};
use crate::grid::{common_geometry, OrbitalGrid};
use crate::histogram::Histogram;
use crate::progress::{Progress, ProgressReporter};

/// Terminal event of a first-order density run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Histogram),
    Cancelled,
    Failed(DensityError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn histogram(&self) -> Option<&Histogram> {
        match self {
            Outcome::Completed(h) => Some(h),
            _ => None,
        }
    }

    pub fn into_histogram(self) -> Option<Histogram> {
        match self {
            Outcome::Completed(h) => Some(h),
            _ => None,
        }
    }
}

/// Requests cancellation of a running task from any thread
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Starts first-order density runs with a fixed configuration
#[derive(Debug, Clone)]
pub struct FirstOrderDensity {
    config: FirstOrderDensityConfig,
}

impl FirstOrderDensity {
    pub fn new(config: FirstOrderDensityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FirstOrderDensityConfig {
        &self.config
    }

    /// Validates the grids and starts the background run
    ///
    /// `grids` must hold exactly `n_alpha` grids sharing one sampling
    /// geometry, one for each orbital `0..n_alpha`. On error nothing is
    /// spawned and `reporter` is dropped without receiving any call.
    pub fn start(
        &self,
        grids: Vec<Arc<OrbitalGrid>>,
        n_alpha: usize,
        reporter: Option<Box<dyn ProgressReporter>>,
    ) -> Result<DensityTask> {
        if grids.len() != n_alpha {
            log::error!(
                "Not all orbitals available: {} occupied alpha orbitals, {} grids",
                n_alpha,
                grids.len()
            );
            return Err(DensityError::InsufficientInputData {
                required: n_alpha,
                supplied: grids.len(),
            });
        }

        let geometry = common_geometry(&grids).map_err(|err| {
            log::error!("{}", err);
            err
        })?;
        check_orbital_coverage(&grids, n_alpha).map_err(|err| {
            log::error!("{}", err);
            err
        })?;
        let total = geometry.map(|g| g.len()).unwrap_or(0);

        let progress = Progress::new(total);
        let cancel = CancelHandle {
            flag: Arc::new(AtomicBool::new(false)),
        };
        let (sender, receiver) = mpsc::channel();

        let job = Job {
            grids,
            config: self.config.clone(),
            progress: progress.clone(),
            cancel: cancel.clone(),
        };

        log::info!(
            "Starting first-order density over {} grids, {} points",
            job.grids.len(),
            total
        );

        let worker = thread::Builder::new()
            .name("first-order-density".to_string())
            .spawn(move || {
                let mut reporter = reporter;
                let outcome = job.run(&mut reporter);
                // release the reporter before anyone can observe the outcome
                drop(reporter);
                drop(job);
                let _ = sender.send(outcome);
            })
            .map_err(|err| DensityError::WorkerFailed(err.to_string()))?;

        Ok(DensityTask {
            progress,
            cancel,
            receiver,
            outcome: None,
            worker: Some(worker),
        })
    }
}

/// Every orbital in `0..n_alpha` must appear exactly once
fn check_orbital_coverage(grids: &[Arc<OrbitalGrid>], n_alpha: usize) -> Result<()> {
    let mut seen = vec![false; n_alpha];
    for grid in grids {
        let orbital = grid.orbital();
        match seen.get_mut(orbital) {
            Some(true) => {
                return Err(DensityError::DimensionMismatch(format!(
                    "more than one grid for alpha orbital {}",
                    orbital
                )))
            }
            Some(slot) => *slot = true,
            None => {
                return Err(DensityError::DimensionMismatch(format!(
                    "grid for alpha orbital {} but only {} are occupied",
                    orbital, n_alpha
                )))
            }
        }
    }
    Ok(())
}

struct Job {
    grids: Vec<Arc<OrbitalGrid>>,
    config: FirstOrderDensityConfig,
    progress: Progress,
    cancel: CancelHandle,
}

impl Job {
    fn run(&self, reporter: &mut Option<Box<dyn ProgressReporter>>) -> Outcome {
        let total = self.progress.total();
        if let Some(r) = reporter.as_mut() {
            r.begin(total);
        }

        let mut histogram = match Histogram::new(self.config.bin_width) {
            Ok(h) => h,
            Err(err) => return Outcome::Failed(err),
        };

        let mut start = 0;
        while start < total {
            if self.cancel.is_cancelled() {
                log::warn!("First-order density cancelled at {} of {} points", start, total);
                return Outcome::Cancelled;
            }

            let end = (start + self.config.chunk_size).min(total);
            for point in start..end {
                let value = self
                    .config
                    .combination
                    .combine(self.grids.iter().map(|g| g.values()[point]));
                if !value.is_finite() {
                    let err = DensityError::NonFiniteSample { point, value };
                    log::error!("{}", err);
                    return Outcome::Failed(err);
                }
                histogram.add(value);
            }
            start = end;

            let value = self.progress.advance(end);
            if let Some(r) = reporter.as_mut() {
                r.update(value);
            }
        }

        if self.cancel.is_cancelled() {
            log::warn!("First-order density cancelled after the last chunk");
            return Outcome::Cancelled;
        }

        log::info!("First-order density finished: {} bins", histogram.len());
        for (edge, value) in histogram.rows() {
            log::debug!("{:>10.4}  {:.10e}", edge, value);
        }

        Outcome::Completed(histogram)
    }
}

/// Handle to a running first-order density computation
///
/// Dropping an unfinished task requests cancellation.
pub struct DensityTask {
    progress: Progress,
    cancel: CancelHandle,
    receiver: Receiver<Outcome>,
    outcome: Option<Outcome>,
    worker: Option<JoinHandle<()>>,
}

impl DensityTask {
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Asks the worker to stop; it notices within one chunk
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The outcome, if the worker has delivered it
    pub fn try_outcome(&mut self) -> Option<&Outcome> {
        if self.outcome.is_none() {
            match self.receiver.try_recv() {
                Ok(outcome) => self.settle(outcome),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.settle(worker_lost()),
            }
        }
        self.outcome.as_ref()
    }

    pub fn is_finished(&mut self) -> bool {
        self.try_outcome().is_some()
    }

    /// Waits up to `timeout` for the outcome
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<&Outcome> {
        if self.outcome.is_none() {
            match self.receiver.recv_timeout(timeout) {
                Ok(outcome) => self.settle(outcome),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.settle(worker_lost()),
            }
        }
        self.outcome.as_ref()
    }

    /// Blocks until the worker delivers its outcome
    pub fn wait(mut self) -> Outcome {
        if self.outcome.is_none() {
            let outcome = self.receiver.recv().unwrap_or_else(|_| worker_lost());
            self.settle(outcome);
        }
        self.outcome.take().unwrap_or_else(worker_lost)
    }

    /// Delivers the outcome to `callback` on a separate waiter thread
    ///
    /// Returns a handle that can still cancel the run.
    pub fn on_complete<F>(self, callback: F) -> Result<CancelHandle>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let handle = self.cancel_handle();
        thread::Builder::new()
            .name("first-order-density-waiter".to_string())
            .spawn(move || callback(self.wait()))
            .map_err(|err| DensityError::WorkerFailed(err.to_string()))?;
        Ok(handle)
    }

    fn settle(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        if let Some(worker) = self.worker.take() {
            // the worker sends as its last action
            if worker.join().is_err() {
                log::error!("first-order density worker panicked");
            }
        }
    }
}

impl Drop for DensityTask {
    fn drop(&mut self) {
        // the worker handle is only released once the outcome has arrived
        if self.worker.is_some() {
            self.cancel.cancel();
        }
    }
}

fn worker_lost() -> Outcome {
    let err = DensityError::WorkerFailed(
        "worker stopped without delivering an outcome".to_string(),
    );
    log::error!("{}", err);
    Outcome::Failed(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Combination;
    use crate::grid::{GridGeometry, Spin};
    use approx::assert_abs_diff_eq;

    fn line(n: usize) -> GridGeometry {
        GridGeometry::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [n, 1, 1])
    }

    fn grid(orbital: usize, values: Vec<f64>) -> Arc<OrbitalGrid> {
        let geometry = line(values.len());
        Arc::new(OrbitalGrid::new(orbital, Spin::Alpha, geometry, values).unwrap())
    }

    fn engine(bin_width: f64, chunk_size: usize) -> FirstOrderDensity {
        let config = FirstOrderDensityConfig::default()
            .with_bin_width(bin_width)
            .with_chunk_size(chunk_size);
        FirstOrderDensity::new(config).unwrap()
    }

    #[test]
    fn test_squared_sum_histogram() {
        let grids = vec![grid(0, vec![0.1, 0.5, 1.0]), grid(1, vec![0.2, 0.5, 0.0])];

        let outcome = engine(0.25, 2).start(grids, 2, None).unwrap().wait();
        let histogram = outcome.into_histogram().unwrap();

        // point values: 0.05, 0.5, 1.0
        assert_abs_diff_eq!(histogram.get(0), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(histogram.get(2), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(histogram.get(4), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(histogram.total(), 1.55, epsilon = 1e-12);
    }

    #[test]
    fn test_product_combination() {
        let grids = vec![grid(0, vec![1.0, -2.0]), grid(1, vec![0.5, 0.5])];
        let config = FirstOrderDensityConfig::default()
            .with_bin_width(1.0)
            .with_combination(Combination::Product);

        let outcome = FirstOrderDensity::new(config)
            .unwrap()
            .start(grids, 2, None)
            .unwrap()
            .wait();
        let histogram = outcome.histogram().unwrap();

        assert_abs_diff_eq!(histogram.get(0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(histogram.get(-1), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_count_mismatch_fails_synchronously() {
        let grids = vec![grid(0, vec![1.0])];
        let err = engine(0.1, 8).start(grids, 2, None).err().unwrap();
        assert_eq!(
            err,
            DensityError::InsufficientInputData {
                required: 2,
                supplied: 1
            }
        );
    }

    #[test]
    fn test_geometry_mismatch_fails_synchronously() {
        let grids = vec![grid(0, vec![1.0, 2.0]), grid(1, vec![1.0, 2.0, 3.0])];
        let err = engine(0.1, 8).start(grids, 2, None).err().unwrap();
        assert_eq!(err, DensityError::GeometryMismatch { index: 1 });
    }

    #[test]
    fn test_duplicate_orbital_is_rejected() {
        let grids = vec![grid(0, vec![1.0, 2.0]), grid(0, vec![3.0, 4.0])];
        let err = engine(0.1, 8).start(grids, 2, None).err().unwrap();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));
    }

    #[test]
    fn test_unoccupied_orbital_is_rejected() {
        let grids = vec![grid(0, vec![1.0]), grid(2, vec![1.0])];
        let err = engine(0.1, 8).start(grids, 2, None).err().unwrap();
        assert!(matches!(err, DensityError::DimensionMismatch(_)));
    }

    #[test]
    fn test_non_finite_sample_fails_run() {
        let grids = vec![grid(0, vec![0.5, f64::NAN, 1.0])];
        let outcome = engine(0.1, 8).start(grids, 1, None).unwrap().wait();
        assert!(matches!(
            outcome,
            Outcome::Failed(DensityError::NonFiniteSample { point: 1, .. })
        ));

        let grids = vec![grid(0, vec![f64::MAX]), grid(1, vec![f64::MAX])];
        let outcome = engine(0.1, 8).start(grids, 2, None).unwrap().wait();
        assert!(matches!(
            outcome,
            Outcome::Failed(DensityError::NonFiniteSample { point: 0, .. })
        ));
    }

    #[test]
    fn test_no_occupied_orbitals_gives_empty_histogram() {
        let mut task = engine(0.1, 8).start(Vec::new(), 0, None).unwrap();
        let outcome = task.wait_timeout(Duration::from_secs(10)).cloned().unwrap();
        assert!(outcome.histogram().unwrap().is_empty());
        assert_eq!(task.progress().total(), 0);
    }

    #[test]
    fn test_progress_reaches_total() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let task = engine(0.1, 7).start(vec![grid(0, values)], 1, None).unwrap();
        let progress = task.progress().clone();

        assert!(task.wait().is_completed());
        assert_eq!(progress.total(), 100);
        assert_eq!(progress.value(), 100);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FirstOrderDensityConfig::default().with_bin_width(-1.0);
        assert!(matches!(
            FirstOrderDensity::new(config),
            Err(DensityError::InvalidConfig(_))
        ));
    }
}
