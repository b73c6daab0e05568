//! Forward pass.
//!
//! Layers are visited in increasing order. Within a layer neurons are visited in
//! index order; the input layer consumes the input vector statefully, so this loop
//! is strictly sequential.

use std::fmt;

use crate::Network;

/// Debug trace sink for the passes.
pub type TraceSink<'a> = dyn FnMut(fmt::Arguments<'_>) + 'a;

impl Network {
    /// Propagate one input pattern and return the output-layer values in index
    /// order.
    ///
    /// Missing neurons are skipped; a missing output neuron reports `0.0`. A bias
    /// neuron is never fed and contributes `0.0` to every neuron of the next layer.
    ///
    /// Input neurons take values from `input` left to right: each non-bias input
    /// neuron receives the next value not yet consumed, while bias input neurons are
    /// fed a fixed `1.0` and consume nothing. Once `input` is exhausted the remaining
    /// input neurons keep whatever they held before.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        self.forward_with(input, &mut |args| tracing::trace!("{args}"))
    }

    /// [`Network::forward`] with a caller-supplied debug trace sink.
    pub fn forward_with(&mut self, input: &[f64], trace: &mut TraceSink<'_>) -> Vec<f64> {
        let (topology, neurons) = self.parts_mut();

        let mut values = input.iter().copied();
        for id in topology.layer_ids(0) {
            let Some(neuron) = neurons.get_mut(&id) else {
                continue;
            };
            let value = if neuron.is_bias() {
                1.0
            } else {
                match values.next() {
                    Some(v) => v,
                    None => continue,
                }
            };
            let state = neuron.state_mut();
            state.feed(0, value);
            state.capture_net_weights();
            let out = neuron.output();
            trace(format_args!("{id} <- {value} => {out}"));
        }

        for layer in 1..topology.num_layers() {
            // Bias sources feed 0.0; missing sources leave the input slot untouched.
            let sources: Vec<Option<f64>> = topology
                .layer_ids(layer - 1)
                .map(|src| {
                    neurons
                        .get(&src)
                        .map(|n| if n.is_bias() { 0.0 } else { n.final_output() })
                })
                .collect();

            for id in topology.layer_ids(layer) {
                let Some(neuron) = neurons.get_mut(&id) else {
                    continue;
                };
                if neuron.is_bias() {
                    continue;
                }

                let state = neuron.state_mut();
                for (i, source) in sources.iter().enumerate() {
                    if let Some(v) = *source {
                        state.feed(i, v);
                    }
                }
                state.capture_net_weights();
                let out = neuron.output();
                trace(format_args!("{id} => {out}"));
            }
        }

        let last = topology.output_layer();
        topology
            .layer_ids(last)
            .map(|id| neurons.get(&id).map_or(0.0, |n| n.final_output()))
            .collect()
    }
}
