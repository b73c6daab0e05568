use crate::{Error, NeuronId, Result};

/// Role a layer plays inside a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Input,
    Hidden,
    Output,
}

/// Validated layer-size sequence.
///
/// Index 0 is the input layer, the last index the output layer, everything in
/// between is a hidden layer. There are always at least two layers and no layer is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topology {
    sizes: Vec<usize>,
}

impl Topology {
    pub fn new(sizes: &[usize]) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidTopology(format!(
                "need at least an input and an output layer, got {} layer(s)",
                sizes.len()
            )));
        }
        if let Some(layer) = sizes.iter().position(|&n| n == 0) {
            return Err(Error::InvalidTopology(format!("layer {layer} has no neurons")));
        }
        Ok(Self {
            sizes: sizes.to_vec(),
        })
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.sizes.len()
    }

    /// Number of neurons in `layer`.
    ///
    /// Panics if `layer >= num_layers()`.
    #[inline]
    pub fn layer_size(&self, layer: usize) -> usize {
        self.sizes[layer]
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    #[inline]
    pub fn output_layer(&self) -> usize {
        self.sizes.len() - 1
    }

    /// Total number of neurons across all layers.
    #[inline]
    pub fn total_neurons(&self) -> usize {
        self.sizes.iter().sum()
    }

    #[inline]
    pub fn role(&self, layer: usize) -> LayerRole {
        if layer == 0 {
            LayerRole::Input
        } else if layer == self.output_layer() {
            LayerRole::Output
        } else {
            LayerRole::Hidden
        }
    }

    /// Identifier of neuron `index` in `layer`.
    #[inline]
    pub fn id(&self, layer: usize, index: usize) -> NeuronId {
        match self.role(layer) {
            LayerRole::Input => NeuronId::input(index),
            LayerRole::Hidden => NeuronId::hidden(layer, index),
            LayerRole::Output => NeuronId::output(index),
        }
    }

    /// Identifiers of every neuron in `layer`, in index order.
    pub fn layer_ids(&self, layer: usize) -> impl Iterator<Item = NeuronId> + '_ {
        (0..self.sizes[layer]).map(move |index| self.id(layer, index))
    }

    /// Identifiers of every neuron, layer by layer.
    pub fn ids(&self) -> impl Iterator<Item = NeuronId> + '_ {
        (0..self.sizes.len()).flat_map(move |layer| self.layer_ids(layer))
    }

    /// Number of incoming connections of neurons in `layer`.
    ///
    /// Input neurons always have a single slot.
    #[inline]
    pub fn fan_in(&self, layer: usize) -> usize {
        if layer == 0 { 1 } else { self.sizes[layer - 1] }
    }

    /// Whether `id` names a neuron of this topology.
    pub fn contains(&self, id: NeuronId) -> bool {
        match id {
            NeuronId::Input { index } => index < self.input_size(),
            NeuronId::Output { index } => index < self.output_size(),
            NeuronId::Hidden { layer, index } => {
                layer > 0 && layer < self.output_layer() && index < self.sizes[layer]
            }
        }
    }

    /// Layer number of `id` in this topology.
    #[inline]
    pub fn layer_of(&self, id: NeuronId) -> usize {
        match id {
            NeuronId::Input { .. } => 0,
            NeuronId::Hidden { layer, .. } => layer,
            NeuronId::Output { .. } => self.output_layer(),
        }
    }
}
