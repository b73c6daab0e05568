//! Training loop and validation pass.
//!
//! Training is online: every pattern runs a forward pass followed immediately by a
//! backward pass that updates the weights. After each full epoch the stop
//! conditions are checked in this order:
//!
//! 1. the run's [`CancelToken`] was triggered: `Cancelled`
//! 2. the epoch error is below `target_mse`: `Converged`
//! 3. the epoch counter (starting at 1) exceeds `max_epochs`: `EpochLimitReached`
//!
//! Otherwise observers receive an epoch progress event and the next epoch starts.
//! Cancellation is only observed at epoch boundaries, so an epoch in flight always
//! finishes.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::shuffle_indices;
use crate::loss::pattern_error;
use crate::observer::{NetworkObserver, ObserverId, Observers, Phase};
use crate::{Dataset, Error, Network, Result, Sgd};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
/// Pattern order within each epoch.
pub enum Shuffle {
    /// Patterns in index order every epoch.
    #[default]
    None,
    /// Fisher–Yates reshuffle every epoch, reproducible from the seed.
    Seeded(u64),
    /// Fisher–Yates reshuffle every epoch, seeded from OS entropy.
    Random,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
/// Hyper-parameters of one training run.
pub struct TrainConfig {
    /// The run stops once the epoch counter exceeds this, so at most
    /// `max_epochs + 1` epochs are executed.
    pub max_epochs: usize,
    /// Converged once the epoch error drops below this.
    pub target_mse: f64,
    pub learning_rate: f64,
    pub momentum: f64,
    /// Accepted and validated but never applied to the weights.
    pub weight_decay: f64,
    pub shuffle: Shuffle,
    /// Send per-neuron trace messages to observers instead of the `trace` log
    /// level. [`crate::TracingObserver`] logs them back at that level.
    pub trace: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_epochs: 1000,
            target_mse: 0.01,
            learning_rate: 0.5,
            momentum: 0.9,
            weight_decay: 0.0,
            shuffle: Shuffle::None,
            trace: false,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.target_mse.is_finite() && self.target_mse >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "target_mse must be finite and >= 0, got {}",
                self.target_mse
            )));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "weight_decay must be finite and >= 0, got {}",
                self.weight_decay
            )));
        }
        self.sgd().map(|_| ())
    }

    /// Step parameters for the backward pass.
    pub fn sgd(&self) -> Result<Sgd> {
        Sgd::new(self.learning_rate, self.momentum)
    }

    /// Load a config from a JSON file. Missing fields take their default value.
    #[cfg(feature = "serde")]
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path.as_ref())?;
        let cfg: Self = serde_json::from_str(&s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Cooperative cancellation flag shared between a run and whoever may stop it.
///
/// Cloning shares the flag. Once set it stays set; use a fresh token per run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-call state of a training or validation run.
#[derive(Debug, Clone, Default)]
pub struct TrainContext {
    pub config: TrainConfig,
    pub cancel: CancelToken,
}

impl TrainContext {
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    Converged,
    EpochLimitReached,
    Cancelled,
}

/// Lifecycle of a [`Trainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainState {
    #[default]
    Idle,
    /// A run started and never finished: it unwound part-way, for example
    /// because an observer panicked.
    Running,
    Finished(TrainOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub outcome: TrainOutcome,
    /// Epochs executed, including the last one.
    pub epochs: usize,
    /// Error of the last epoch.
    pub final_error: f64,
}

impl TrainReport {
    #[inline]
    pub fn converged(&self) -> bool {
        self.outcome == TrainOutcome::Converged
    }

    #[inline]
    pub fn cancelled(&self) -> bool {
        self.outcome == TrainOutcome::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// 1-based count of processed patterns; skipped patterns are not counted.
    pub pattern: usize,
    pub target: Vec<f64>,
    pub output: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub completed: bool,
    pub cancelled: bool,
    pub results: Vec<ValidationResult>,
}

/// Drives training and validation runs and owns their observers.
///
/// Reusable: nothing from one run leaks into the next except the observers.
#[derive(Debug, Default)]
pub struct Trainer {
    observers: Observers,
    state: TrainState,
}

impl Trainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn NetworkObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn NetworkObserver>> {
        self.observers.unsubscribe(id)
    }

    /// State left by the most recent training run. `train` holds `&mut self`
    /// for the whole run, so callers only ever see it between runs.
    #[inline]
    pub fn state(&self) -> TrainState {
        self.state
    }

    /// Train `network` on `data` until a stop condition holds.
    ///
    /// Patterns whose input or target row is absent are skipped. Fails before
    /// touching the network if the config is invalid, the dataset is empty, or a
    /// present row does not fit the network.
    pub fn train(
        &mut self,
        network: &mut Network,
        data: &Dataset,
        ctx: &TrainContext,
    ) -> Result<TrainReport> {
        let config = &ctx.config;
        config.validate()?;
        let sgd = config.sgd()?;
        check_dataset(network, data, true)?;

        let mut rng = match config.shuffle {
            Shuffle::None => None,
            Shuffle::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            Shuffle::Random => Some(StdRng::from_entropy()),
        };
        if config.weight_decay != 0.0 {
            tracing::debug!(weight_decay = config.weight_decay, "weight decay is not applied");
        }

        tracing::info!(
            patterns = data.len(),
            max_epochs = config.max_epochs,
            target_mse = config.target_mse,
            "training started"
        );
        self.state = TrainState::Running;

        let mut order: Vec<usize> = (0..data.len()).collect();
        let mut epoch = 1usize;
        let (outcome, final_error) = loop {
            if let Some(rng) = rng.as_mut() {
                shuffle_indices(&mut order, rng);
            }

            let mut epoch_error = 0.0;
            for &idx in &order {
                let Some((input, target)) = data.pair(idx) else {
                    continue;
                };
                let mut sink = debug_sink(&mut self.observers, config.trace);
                network.forward_with(input, &mut sink);
                let deltas = network.backward_with(target, sgd, &mut sink);
                epoch_error += pattern_error(&deltas);
            }

            if ctx.cancel.is_cancelled() {
                break (TrainOutcome::Cancelled, epoch_error);
            }
            if epoch_error < config.target_mse {
                break (TrainOutcome::Converged, epoch_error);
            }
            if epoch > config.max_epochs {
                break (TrainOutcome::EpochLimitReached, epoch_error);
            }

            tracing::debug!(epoch, error = epoch_error, "epoch finished");
            self.observers
                .epoch_progress(epoch, epoch_error, config.target_mse);
            epoch += 1;
        };

        match outcome {
            TrainOutcome::Converged => {
                tracing::info!(epochs = epoch, error = final_error, "training converged")
            }
            TrainOutcome::EpochLimitReached => {
                tracing::warn!(epochs = epoch, error = final_error, "epoch limit reached")
            }
            TrainOutcome::Cancelled => {
                tracing::info!(epochs = epoch, error = final_error, "training cancelled")
            }
        }

        let converged = outcome == TrainOutcome::Converged;
        let cancelled = outcome == TrainOutcome::Cancelled;
        self.observers.complete(Phase::Training, converged, cancelled);
        self.state = TrainState::Finished(outcome);

        Ok(TrainReport {
            outcome,
            epochs: epoch,
            final_error,
        })
    }

    /// Run forward passes over `data` in index order without touching any weight.
    ///
    /// The cancel token is checked before every pattern. Patterns whose input or
    /// target row is absent are skipped and not counted.
    pub fn validate(
        &mut self,
        network: &mut Network,
        data: &Dataset,
        ctx: &TrainContext,
    ) -> Result<ValidationReport> {
        check_dataset(network, data, false)?;
        tracing::info!(patterns = data.len(), "validation started");

        let mut results = Vec::new();
        let mut counter = 1usize;
        for idx in 0..data.len() {
            let Some((input, target)) = data.pair(idx) else {
                continue;
            };
            if ctx.cancel.is_cancelled() {
                tracing::info!(validated = results.len(), "validation cancelled");
                self.observers.complete(Phase::Validation, false, true);
                return Ok(ValidationReport {
                    completed: false,
                    cancelled: true,
                    results,
                });
            }

            let output = {
                let mut sink = debug_sink(&mut self.observers, ctx.config.trace);
                network.forward_with(input, &mut sink)
            };
            self.observers.validation_result(counter, target, &output);
            results.push(ValidationResult {
                pattern: counter,
                target: target.to_vec(),
                output,
            });
            counter += 1;
        }

        tracing::info!(validated = results.len(), "validation complete");
        self.observers.complete(Phase::Validation, true, false);
        Ok(ValidationReport {
            completed: true,
            cancelled: false,
            results,
        })
    }
}

fn debug_sink(
    observers: &mut Observers,
    enabled: bool,
) -> impl FnMut(fmt::Arguments<'_>) + '_ {
    move |args: fmt::Arguments<'_>| {
        if enabled {
            observers.debug(&args.to_string());
        } else {
            tracing::trace!("{args}");
        }
    }
}

fn check_dataset(network: &Network, data: &Dataset, with_targets: bool) -> Result<()> {
    if data.is_empty() {
        return Err(Error::InvalidData("dataset must not be empty".to_owned()));
    }

    let input_count = network.input_count();
    let output_size = network.topology().output_size();
    for idx in 0..data.len() {
        let Some((input, target)) = data.pair(idx) else {
            continue;
        };
        if input.len() != input_count {
            return Err(Error::DimensionMismatch(format!(
                "input row {idx} has len {}, network takes {input_count}",
                input.len()
            )));
        }
        if with_targets && target.len() != output_size {
            return Err(Error::DimensionMismatch(format!(
                "target row {idx} has len {}, network has {output_size} outputs",
                target.len()
            )));
        }
    }
    Ok(())
}
