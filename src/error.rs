use thiserror::Error;

use crate::NeuronId;

/// Errors surfaced at the crate's API boundary.
///
/// Identifier misses inside the forward/backward passes are not errors: sparse
/// networks are skipped over silently. NaN or overflow inside the sigmoid and the
/// error terms is not trapped either and simply propagates through the weights.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("no neuron {0} in network")]
    MissingNeuron(NeuronId),
    #[error("malformed persisted network: {0}")]
    MalformedPersistedState(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
