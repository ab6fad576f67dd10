//! Progress reporting for background computations
//!
//! The worker publishes its latest step count into a shared [`Progress`]
//! counter that anyone holding the task can poll. A [`ProgressReporter`] can
//! additionally be handed to the task to be pushed updates; it lives on the
//! worker thread and is dropped there exactly once when the run ends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

/// Receives progress from a running computation
pub trait ProgressReporter: Send {
    /// Called once before the first update with the number of steps
    fn begin(&mut self, _total: usize) {}

    /// Latest completed step count; values never decrease
    fn update(&mut self, value: usize);
}

impl<F> ProgressReporter for F
where
    F: FnMut(usize) + Send,
{
    fn update(&mut self, value: usize) {
        self(value)
    }
}

/// Shared, monotonically increasing step counter
#[derive(Debug, Clone)]
pub struct Progress {
    current: Arc<AtomicUsize>,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            current: Arc::new(AtomicUsize::new(0)),
            total,
        }
    }

    pub fn value(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Completed fraction in `[0, 1]`; an empty run counts as complete
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.value() as f64 / self.total as f64
        }
    }

    /// Raises the counter to `value`, clamped to `total`. Lower values are
    /// ignored.
    pub(crate) fn advance(&self, value: usize) -> usize {
        let value = value.min(self.total);
        self.current.fetch_max(value, Ordering::AcqRel).max(value)
    }
}

/// Forwards updates into a bounded channel, dropping them when it is full
///
/// The receiving side sees at most the buffered values plus whatever arrived
/// after it last drained the channel.
pub struct ChannelReporter {
    sender: SyncSender<usize>,
}

impl ChannelReporter {
    /// Creates a reporter and the receiver holding at most `capacity`
    /// undelivered updates
    pub fn new(capacity: usize) -> (Self, Receiver<usize>) {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl ProgressReporter for ChannelReporter {
    fn update(&mut self, value: usize) {
        match self.sender.try_send(value) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("progress receiver dropped, discarding update {}", value);
            }
        }
    }
}

/// Latest value in `receiver`, draining everything buffered
pub fn latest(receiver: &Receiver<usize>) -> Option<usize> {
    receiver.try_iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let p = Progress::new(10);
        assert_eq!(p.value(), 0);
        assert_eq!(p.advance(4), 4);
        assert_eq!(p.advance(2), 4);
        assert_eq!(p.value(), 4);
        assert_eq!(p.advance(25), 10);
        assert_abs_diff_eq!(p.fraction(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_progress_is_complete() {
        assert_abs_diff_eq!(Progress::new(0).fraction(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_channel_reporter_is_lossy() {
        let (mut reporter, receiver) = ChannelReporter::new(1);
        reporter.update(1);
        reporter.update(2);
        reporter.update(3);
        assert_eq!(latest(&receiver), Some(1));

        reporter.update(7);
        assert_eq!(latest(&receiver), Some(7));
        assert_eq!(latest(&receiver), None);
    }

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        {
            let mut reporter = |v: usize| seen.push(v);
            reporter.begin(3);
            ProgressReporter::update(&mut reporter, 1);
            ProgressReporter::update(&mut reporter, 3);
        }
        assert_eq!(seen, vec![1, 3]);
    }
}
