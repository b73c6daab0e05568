//! The keyed neuron collection.
//!
//! A [`Network`] maps [`NeuronId`]s to [`Neuron`]s for one [`Topology`]. Networks
//! may be sparse: any identifier can be absent (see [`Network::remove`]) and every
//! pass simply skips missing neurons.
//!
//! # Single writer
//!
//! Forward and backward passes mutate neurons in place, and the backward pass relies
//! on weight snapshots taken by the forward pass that preceded it. A network must
//! therefore be driven by one training or validation call at a time; `&mut self`
//! receivers enforce this for safe code, and there is no internal locking.

use std::collections::BTreeMap;

use rand::rngs::StdRng;

use crate::{Error, Neuron, NeuronId, NeuronKind, Result, Topology};

#[derive(Debug, Clone)]
pub struct Network {
    topology: Topology,
    neurons: BTreeMap<NeuronId, Neuron>,
    rng: StdRng,
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.topology == other.topology && self.neurons == other.neurons
    }
}

impl Network {
    pub(crate) fn from_parts(
        topology: Topology,
        neurons: impl IntoIterator<Item = (NeuronId, Neuron)>,
        rng: StdRng,
    ) -> Self {
        Self {
            topology,
            neurons: neurons.into_iter().collect(),
            rng,
        }
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Number of neurons present.
    #[inline]
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: NeuronId) -> bool {
        self.neurons.contains_key(&id)
    }

    #[inline]
    pub fn get(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NeuronId) -> Option<&mut Neuron> {
        self.neurons.get_mut(&id)
    }

    /// Drop a neuron, leaving a hole the passes will skip.
    pub fn remove(&mut self, id: NeuronId) -> Option<Neuron> {
        self.neurons.remove(&id)
    }

    /// Neurons in network order (inputs, hidden layers in order, outputs).
    pub fn iter(&self) -> impl Iterator<Item = (NeuronId, &Neuron)> {
        self.neurons.iter().map(|(&id, n)| (id, n))
    }

    /// Present, non-bias input neurons: the width an input vector should have.
    pub fn input_count(&self) -> usize {
        self.topology
            .layer_ids(0)
            .filter_map(|id| self.neurons.get(&id))
            .filter(|n| !n.is_bias())
            .count()
    }

    /// Present output neurons.
    pub fn output_count(&self) -> usize {
        let last = self.topology.output_layer();
        self.topology
            .layer_ids(last)
            .filter(|id| self.neurons.contains_key(id))
            .count()
    }

    /// Toggle bias mode of one neuron.
    ///
    /// A hidden neuron leaving bias mode redraws its weights from the network's
    /// generator. Output neurons ignore the request.
    pub fn set_bias(&mut self, id: NeuronId, bias: bool) -> Result<()> {
        let neuron = self.neurons.get_mut(&id).ok_or(Error::MissingNeuron(id))?;
        neuron.set_bias(bias, &mut self.rng);
        Ok(())
    }

    /// Replace one neuron's bias flag and full weight vector.
    ///
    /// The weight count is checked before anything is touched, so a
    /// `DimensionMismatch` leaves the neuron unchanged. The bias flag is applied
    /// first and the weights second, so explicit weights always win over the
    /// values bias mode would force.
    pub fn set_neuron(&mut self, id: NeuronId, weights: &[f64], bias: bool) -> Result<()> {
        let neuron = self.neurons.get_mut(&id).ok_or(Error::MissingNeuron(id))?;
        if weights.len() != neuron.fan_in() {
            return Err(Error::DimensionMismatch(format!(
                "neuron {id} has {} weights, got {}",
                neuron.fan_in(),
                weights.len()
            )));
        }

        neuron.set_bias(bias, &mut self.rng);
        for (i, &w) in weights.iter().enumerate() {
            neuron.set_weight(i, w)?;
        }
        Ok(())
    }

    /// Set every weight of every non-input neuron to `value`.
    ///
    /// Bias neurons keep their forced weights.
    pub fn fill_weights(&mut self, value: f64) {
        for neuron in self.neurons.values_mut() {
            if neuron.kind() == NeuronKind::Input || neuron.is_bias() {
                continue;
            }
            neuron.state_mut().fill_weights(value);
        }
    }

    /// Current weights of every present neuron, in network order.
    pub fn weights(&self) -> Vec<(NeuronId, Vec<f64>)> {
        self.neurons
            .iter()
            .map(|(&id, n)| (id, n.weights().to_vec()))
            .collect()
    }

    /// Split borrow used by the passes.
    #[inline]
    pub(crate) fn parts_mut(&mut self) -> (&Topology, &mut BTreeMap<NeuronId, Neuron>) {
        (&self.topology, &mut self.neurons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::NetworkBuilder;

    fn net() -> Network {
        NetworkBuilder::new(&[3, 2, 1]).unwrap().build_with_seed(5)
    }

    #[test]
    fn counts_skip_bias_inputs_and_missing_neurons() {
        let mut n = net();
        assert_eq!(n.input_count(), 3);
        assert_eq!(n.output_count(), 1);

        n.set_bias(NeuronId::input(1), true).unwrap();
        assert_eq!(n.input_count(), 2);

        n.remove(NeuronId::input(2));
        assert_eq!(n.input_count(), 1);

        n.remove(NeuronId::output(0));
        assert_eq!(n.output_count(), 0);
        assert_eq!(n.len(), 4);
    }

    #[test]
    fn set_neuron_rejects_wrong_length_without_side_effects() {
        let mut n = net();
        let id = NeuronId::hidden(1, 0);
        let before = n.get(id).unwrap().clone();

        let err = n.set_neuron(id, &[0.1, 0.2], true).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
        assert_eq!(n.get(id).unwrap(), &before);
    }

    #[test]
    fn set_neuron_applies_bias_then_weights() {
        let mut n = net();
        let id = NeuronId::hidden(1, 1);
        n.set_neuron(id, &[0.25, -0.5, 0.75], true).unwrap();

        let neuron = n.get(id).unwrap();
        assert!(neuron.is_bias());
        assert_eq!(neuron.weights(), &[0.25, -0.5, 0.75]);

        n.set_neuron(id, &[0.1, 0.2, 0.3], false).unwrap();
        let neuron = n.get(id).unwrap();
        assert!(!neuron.is_bias());
        assert_eq!(neuron.weights(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn explicit_calls_on_missing_neurons_fail() {
        let mut n = net();
        n.remove(NeuronId::hidden(1, 0));
        assert!(matches!(
            n.set_bias(NeuronId::hidden(1, 0), true),
            Err(Error::MissingNeuron(_))
        ));
        assert!(matches!(
            n.set_neuron(NeuronId::output(3), &[0.0, 0.0], false),
            Err(Error::MissingNeuron(_))
        ));
    }

    #[test]
    fn fill_weights_leaves_inputs_and_bias_alone() {
        let mut n = net();
        n.set_bias(NeuronId::hidden(1, 0), true).unwrap();
        n.fill_weights(0.0);

        assert_eq!(n.get(NeuronId::input(0)).unwrap().weights(), &[1.0]);
        assert_eq!(
            n.get(NeuronId::hidden(1, 0)).unwrap().weights(),
            &[1.0, 0.0, 0.0]
        );
        assert_eq!(
            n.get(NeuronId::hidden(1, 1)).unwrap().weights(),
            &[0.0, 0.0, 0.0]
        );
        assert_eq!(n.get(NeuronId::output(0)).unwrap().weights(), &[0.0, 0.0]);
    }

    #[test]
    fn fill_weights_covers_every_slot() {
        let mut n = net();
        n.fill_weights(0.25);
        for (id, neuron) in n.iter() {
            if id.kind() != NeuronKind::Input {
                assert!(neuron.weights().iter().all(|&w| w == 0.25), "{id}");
                assert_eq!(neuron.weights().len(), neuron.fan_in());
            }
        }
    }

    #[test]
    fn iteration_follows_network_order() {
        let ids: Vec<_> = net().iter().map(|(id, _)| id).collect();
        let expected: Vec<_> = net().topology().ids().collect();
        assert_eq!(ids, expected);
    }
}
