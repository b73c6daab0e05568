//! Network builder.
//!
//! `NetworkBuilder` turns an ordered layer-size sequence into a [`Network`]: one
//! input neuron per slot of layer 0, hidden neurons for every layer in between, and
//! output neurons for the last layer. Each neuron's fan-in is the size of the
//! previous layer (input neurons always have a single slot) and every weight is
//! drawn uniformly from `[-1, 1]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Network, Neuron, Result, Topology};

#[derive(Debug, Clone)]
/// Builder for a `Network`.
///
/// Example:
///
/// ```rust
/// use rust_bpnn::NetworkBuilder;
///
/// # fn main() -> rust_bpnn::Result<()> {
/// let network = NetworkBuilder::new(&[2, 2, 1])?.build_with_seed(0);
/// assert_eq!(network.len(), 5);
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    topology: Topology,
}

impl NetworkBuilder {
    /// Start building from a layer-size sequence.
    ///
    /// Fails with `InvalidTopology` for fewer than two layers or an empty layer.
    pub fn new(sizes: &[usize]) -> Result<Self> {
        Ok(Self {
            topology: Topology::new(sizes)?,
        })
    }

    pub fn from_topology(topology: Topology) -> Self {
        Self { topology }
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build with weights drawn from OS entropy.
    pub fn build(self) -> Network {
        let mut rng = StdRng::from_entropy();
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    ///
    /// The network keeps its own generator, seeded from `rng`, for the weights it
    /// redraws when a hidden neuron leaves bias mode.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Network {
        let topology = self.topology;
        let mut neurons = Vec::with_capacity(topology.total_neurons());
        for layer in 0..topology.num_layers() {
            let fan_in = topology.fan_in(layer);
            for id in topology.layer_ids(layer) {
                neurons.push((id, Neuron::new(id, fan_in, rng)));
            }
        }

        let own_rng = StdRng::seed_from_u64(rng.next_u64());
        Network::from_parts(topology, neurons, own_rng)
    }
}
