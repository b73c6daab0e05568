//! Training and validation notifications.
//!
//! Observers are called synchronously, in subscription order, from inside
//! [`crate::Trainer::train`] and [`crate::Trainer::validate`]. A slow observer stalls
//! the run that called it.

use std::fmt;

/// Which run a completion event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Validation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Training => f.write_str("training"),
            Phase::Validation => f.write_str("validation"),
        }
    }
}

/// Receiver for the events a [`crate::Trainer`] emits.
///
/// Every method has an empty default so implementors only override what they need.
pub trait NetworkObserver {
    /// An epoch finished without meeting a stop condition.
    fn epoch_progress(&mut self, _epoch: usize, _error: f64, _target: f64) {}

    /// Per-neuron trace from the passes; only sent when tracing is enabled.
    fn debug(&mut self, _message: &str) {}

    /// One validated pattern. `pattern` counts processed patterns from 1.
    fn validation_result(&mut self, _pattern: usize, _target: &[f64], _output: &[f64]) {}

    /// A training or validation run ended.
    fn complete(&mut self, _phase: Phase, _completed: bool, _cancelled: bool) {}
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered observer registry.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Box<dyn NetworkObserver>)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn NetworkObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Remove an observer, handing it back. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn NetworkObserver>> {
        let pos = self.entries.iter().position(|(eid, _)| *eid == id)?;
        Some(self.entries.remove(pos).1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn epoch_progress(&mut self, epoch: usize, error: f64, target: f64) {
        for (_, o) in &mut self.entries {
            o.epoch_progress(epoch, error, target);
        }
    }

    pub(crate) fn debug(&mut self, message: &str) {
        for (_, o) in &mut self.entries {
            o.debug(message);
        }
    }

    pub(crate) fn validation_result(&mut self, pattern: usize, target: &[f64], output: &[f64]) {
        for (_, o) in &mut self.entries {
            o.validation_result(pattern, target, output);
        }
    }

    pub(crate) fn complete(&mut self, phase: Phase, completed: bool, cancelled: bool) {
        for (_, o) in &mut self.entries {
            o.complete(phase, completed, cancelled);
        }
    }
}

/// Forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl NetworkObserver for TracingObserver {
    fn epoch_progress(&mut self, epoch: usize, error: f64, target: f64) {
        tracing::debug!(epoch, error, target_error = target, "epoch finished");
    }

    fn debug(&mut self, message: &str) {
        tracing::trace!("{message}");
    }

    fn validation_result(&mut self, pattern: usize, target: &[f64], output: &[f64]) {
        tracing::debug!(pattern, expected = ?target, ?output, "validated pattern");
    }

    fn complete(&mut self, phase: Phase, completed: bool, cancelled: bool) {
        tracing::info!(%phase, completed, cancelled, "run complete");
    }
}
