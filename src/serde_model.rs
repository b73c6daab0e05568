//! Network serialization/deserialization (feature: `serde`).
//!
//! The on-disk format is versioned and independent of the in-memory layout: the
//! layer sizes plus one `{ id, bias, weights }` record per present neuron, keyed by
//! the neuron's textual identifier (`a-1`, `b-2-1`, `c-1`). Transient state (inputs,
//! snapshots, cached outputs and errors) is not persisted.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Network, NetworkBuilder, NeuronId, Result, Topology};

pub const NETWORK_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNetwork {
    pub format_version: u32,
    /// Layer sizes, input layer first.
    pub size: Vec<usize>,
    /// Present neurons in identifier order.
    pub neurons: Vec<SerializedNeuron>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNeuron {
    pub id: String,
    pub bias: bool,
    pub weights: Vec<f64>,
}

impl SerializedNetwork {
    /// Check version, topology and identifiers without building anything.
    ///
    /// Weight counts are checked on import, against the rebuilt neurons.
    pub fn validate(&self) -> Result<()> {
        self.parse().map(|_| ())
    }

    fn parse(&self) -> Result<(Topology, Vec<NeuronId>)> {
        if self.format_version != NETWORK_FORMAT_VERSION {
            return Err(Error::MalformedPersistedState(format!(
                "unsupported format_version {}; expected {}",
                self.format_version, NETWORK_FORMAT_VERSION
            )));
        }
        let topology = Topology::new(&self.size)
            .map_err(|e| Error::MalformedPersistedState(format!("invalid size: {e}")))?;

        let mut seen = BTreeSet::new();
        let mut ids = Vec::with_capacity(self.neurons.len());
        for neuron in &self.neurons {
            let id: NeuronId = neuron.id.parse()?;
            if !topology.contains(id) {
                return Err(Error::MalformedPersistedState(format!(
                    "neuron {id} does not fit size {:?}",
                    self.size
                )));
            }
            if !seen.insert(id) {
                return Err(Error::MalformedPersistedState(format!(
                    "neuron {id} listed twice"
                )));
            }
            if neuron.weights.iter().any(|w| !w.is_finite()) {
                return Err(Error::MalformedPersistedState(format!(
                    "neuron {id} has non-finite weights"
                )));
            }
            ids.push(id);
        }
        Ok((topology, ids))
    }

    /// Rebuild the network, seeding the generator later bias toggles draw from.
    pub fn into_network_with_seed(self, seed: u64) -> Result<Network> {
        let (topology, ids) = self.parse()?;
        let network = NetworkBuilder::from_topology(topology).build_with_seed(seed);
        self.apply(network, &ids)
    }

    fn apply(self, mut network: Network, ids: &[NeuronId]) -> Result<Network> {
        for (&id, neuron) in ids.iter().zip(&self.neurons) {
            network.set_neuron(id, &neuron.weights, neuron.bias)?;
        }

        let listed: BTreeSet<NeuronId> = ids.iter().copied().collect();
        let absent: Vec<NeuronId> = network
            .iter()
            .map(|(id, _)| id)
            .filter(|id| !listed.contains(id))
            .collect();
        for id in absent {
            network.remove(id);
        }
        Ok(network)
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(network: &Network) -> Self {
        Self {
            format_version: NETWORK_FORMAT_VERSION,
            size: network.topology().sizes().to_vec(),
            neurons: network
                .iter()
                .map(|(id, n)| SerializedNeuron {
                    id: id.to_string(),
                    bias: n.is_bias(),
                    weights: n.weights().to_vec(),
                })
                .collect(),
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> std::result::Result<Self, Self::Error> {
        let (topology, ids) = value.parse()?;
        let network = NetworkBuilder::from_topology(topology).build();
        value.apply(network, &ids)
    }
}

impl Network {
    /// Serialize the network to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let ser = SerializedNetwork::from(self);
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Serialize the network to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let ser = SerializedNetwork::from(self);
        serde_json::to_string(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Parse a network from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNetwork = serde_json::from_str(s).map_err(|e| {
            Error::MalformedPersistedState(format!("failed to parse network json: {e}"))
        })?;
        ser.try_into()
    }

    /// Save the network to a JSON file (pretty-printed).
    ///
    /// The file is written next to `path` under a `.tmp` suffix and then renamed
    /// over it, so a failed save never leaves a truncated file at `path`.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        let mut tmp = p.as_os_str().to_owned();
        tmp.push(".tmp");

        if let Err(e) = std::fs::write(&tmp, s).and_then(|()| std::fs::rename(&tmp, p)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(path = %p.display(), "network saved");
        Ok(())
    }

    /// Load a network from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p).map_err(|e| {
            Error::MalformedPersistedState(format!("failed to read {}: {e}", p.display()))
        })?;
        Self::from_json_str(&s)
    }
}
