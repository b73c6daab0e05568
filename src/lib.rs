//! A feed-forward multilayer perceptron trained by online backpropagation.
//!
//! `rust-bpnn` models a network as a keyed collection of individual neurons rather
//! than dense weight matrices. Every neuron owns its weight vector, so a network can
//! be sparse (neurons removed), individual neurons can be switched into bias mode, and
//! a trained network can be persisted neuron by neuron.
//!
//! # Model
//!
//! - Layer 0 holds input neurons, the last layer output neurons, everything in
//!   between hidden neurons. All non-input neurons use the logistic sigmoid.
//! - [`Network::forward`] propagates one pattern and captures a snapshot of every
//!   neuron's weights.
//! - [`Network::backward`] walks the layers from the output down, updating each
//!   neuron as soon as its error is known. Hidden errors read the snapshot, never the
//!   weights the same sweep has already rewritten.
//! - [`Trainer::train`] runs epochs of forward/backward passes over a [`Dataset`] until
//!   the run is cancelled, converges below `target_mse`, or exceeds `max_epochs`.
//!
//! # Concurrency
//!
//! A [`Network`] is mutated in place by every pass and is meant to have a single
//! writer. The only value designed to cross threads is [`CancelToken`].
//!
//! # Scalars
//!
//! Everything is `f64`. NaN and infinities are not trapped by the passes.

//! # Quick start
//!
//! ```rust
//! use rust_bpnn::{Dataset, NetworkBuilder, Shuffle, TrainConfig, TrainContext, Trainer};
//!
//! # fn main() -> rust_bpnn::Result<()> {
//! let xs = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ];
//! let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
//! let data = Dataset::from_rows(&xs, &ys)?;
//!
//! let mut network = NetworkBuilder::new(&[2, 3, 1])?.build_with_seed(0);
//! let ctx = TrainContext::new(TrainConfig {
//!     max_epochs: 200,
//!     target_mse: 1e-4,
//!     learning_rate: 0.7,
//!     momentum: 0.9,
//!     shuffle: Shuffle::Seeded(0),
//!     ..TrainConfig::default()
//! });
//!
//! let mut trainer = Trainer::new();
//! let report = trainer.train(&mut network, &data, &ctx)?;
//! assert!(report.epochs <= 201);
//!
//! let validation = trainer.validate(&mut network, &data, &ctx)?;
//! assert_eq!(validation.results.len(), 4);
//! # Ok(())
//! # }
//! ```

//! # Driving the passes yourself
//!
//! ```rust
//! use rust_bpnn::{NetworkBuilder, Sgd};
//!
//! # fn main() -> rust_bpnn::Result<()> {
//! let mut network = NetworkBuilder::new(&[3, 4, 2])?.build_with_seed(1);
//! let sgd = Sgd::new(0.5, 0.9)?;
//!
//! let y = network.forward(&[0.1, -0.2, 0.3]);
//! assert_eq!(y.len(), 2);
//! let errors = network.backward(&[0.0, 1.0], sgd);
//! assert!(errors.iter().all(|&e| e >= 0.0));
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod backward;
pub mod builder;
pub mod data;
pub mod error;
pub mod forward;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod neuron;
pub mod observer;
pub mod optim;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use builder::NetworkBuilder;
pub use data::{Dataset, Rows, shuffle_indices};
pub use error::{Error, Result};
pub use forward::TraceSink;
pub use layer::{LayerRole, Topology};
pub use metrics::Metric;
pub use network::Network;
pub use neuron::{
    HiddenNeuron, InputNeuron, Neuron, NeuronId, NeuronKind, NeuronState, OutputNeuron,
};
pub use observer::{NetworkObserver, ObserverId, Observers, Phase, TracingObserver};
pub use optim::Sgd;
pub use train::{
    CancelToken, Shuffle, TrainConfig, TrainContext, TrainOutcome, TrainReport, TrainState,
    Trainer, ValidationReport, ValidationResult,
};

#[cfg(feature = "serde")]
pub use serde_model::{NETWORK_FORMAT_VERSION, SerializedNetwork, SerializedNeuron};
