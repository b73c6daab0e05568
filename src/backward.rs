//! Backward pass.
//!
//! Layers are visited from the output layer down to layer 1; input neurons carry no
//! trainable weights and are never touched. Every neuron is updated as soon as its
//! error is known, so by the time layer `L` is processed the live weights of layer
//! `L + 1` already hold this pattern's update. Layer `L` therefore reads the
//! `net_weights` snapshot the preceding forward pass captured, never the live
//! weights.

use crate::forward::TraceSink;
use crate::{Network, Sgd};

impl Network {
    /// Back-propagate one pattern's targets and update every weight in place.
    ///
    /// Must follow a [`Network::forward`] on the same pattern. Returns the error each
    /// output neuron reported (`0.5 * (target - output)^2`) in index order, `0.0`
    /// for missing neurons or missing targets.
    pub fn backward(&mut self, targets: &[f64], sgd: Sgd) -> Vec<f64> {
        self.backward_with(targets, sgd, &mut |args| tracing::trace!("{args}"))
    }

    /// [`Network::backward`] with a caller-supplied debug trace sink.
    pub fn backward_with(
        &mut self,
        targets: &[f64],
        sgd: Sgd,
        trace: &mut TraceSink<'_>,
    ) -> Vec<f64> {
        let (lr, momentum) = (sgd.learning_rate(), sgd.momentum());
        let (topology, neurons) = self.parts_mut();
        let last = topology.output_layer();

        trace(format_args!("backward start"));

        let mut deltas = vec![0.0; topology.output_size()];
        for (k, id) in topology.layer_ids(last).enumerate() {
            let Some(neuron) = neurons.get_mut(&id).and_then(|n| n.as_output_mut()) else {
                continue;
            };
            let Some(&target) = targets.get(k) else {
                continue;
            };
            deltas[k] = neuron.calculate_error(target);
            neuron.update_weights(target, lr, momentum);
            trace(format_args!("{id} error {}", deltas[k]));
        }

        for layer in (1..last).rev() {
            // Per downstream neuron: its pre-update weight row and cached output.
            // Bias and missing neurons contribute nothing.
            let rows: Vec<(Vec<f64>, f64)> = topology
                .layer_ids(layer + 1)
                .map(|id| match neurons.get(&id) {
                    Some(n) if !n.is_bias() => {
                        (n.state().net_weights().to_vec(), n.final_output())
                    }
                    _ => (Vec::new(), 0.0),
                })
                .collect();
            let outputs: Vec<f64> = rows.iter().map(|&(_, y)| y).collect();

            let mut weights = vec![0.0; rows.len()];
            for (j, id) in topology.layer_ids(layer).enumerate() {
                let Some(neuron) = neurons.get_mut(&id) else {
                    continue;
                };
                if neuron.is_bias() {
                    trace(format_args!("{id} is bias, skipping"));
                    continue;
                }
                let Some(hidden) = neuron.as_hidden_mut() else {
                    continue;
                };

                for (w, (row, _)) in weights.iter_mut().zip(&rows) {
                    *w = row.get(j).copied().unwrap_or(0.0);
                }
                let delta = hidden.calculate_error(targets, &weights, &outputs);
                hidden.update_weights(delta, lr, momentum);
                trace(format_args!("{id} error {delta}"));
            }
        }

        trace(format_args!("backward end"));
        deltas
    }
}

#[cfg(test)]
mod tests {
    use crate::activation::sigmoid;
    use crate::{Network, NetworkBuilder, NeuronId, Sgd};

    use approx::assert_abs_diff_eq;

    fn sgd() -> Sgd {
        Sgd::new(0.5, 0.9).unwrap()
    }

    fn chain(w_hidden: f64, w_out: f64) -> Network {
        let mut net = NetworkBuilder::new(&[1, 1, 1]).unwrap().build_with_seed(0);
        net.set_neuron(NeuronId::hidden(1, 0), &[w_hidden], false).unwrap();
        net.set_neuron(NeuronId::output(0), &[w_out], false).unwrap();
        net
    }

    #[test]
    fn hidden_delta_uses_pre_update_downstream_weight() {
        let mut net = chain(0.3, 0.8);
        let (x, t) = (1.0, 1.0);
        net.forward(&[x]);
        net.backward(&[t], sgd());

        let h = sigmoid(0.3 * x);
        let y = sigmoid(0.8 * h);
        let expected_delta = -(t - y) * y * (1.0 - y) * 0.8;
        let hidden = net.get(NeuronId::hidden(1, 0)).unwrap();
        assert_abs_diff_eq!(hidden.error(), expected_delta, epsilon = 1e-15);

        // The output weight moved during the same sweep, so a delta built from the
        // live weight would differ.
        let live = net.get(NeuronId::output(0)).unwrap().weights()[0];
        assert_ne!(live, 0.8);
        let live_delta = -(t - y) * y * (1.0 - y) * live;
        assert!((hidden.error() - live_delta).abs() > 1e-6);
    }

    #[test]
    fn updates_follow_the_delta_rules() {
        let mut net = chain(0.3, 0.8);
        net.forward(&[1.0]);
        net.backward(&[1.0], sgd());

        let h = sigmoid(0.3);
        let y = sigmoid(0.8 * h);
        let out_w = 0.8 - 0.5 * (0.9 * (-(1.0 - y) * (y * (1.0 - y) * h)));
        assert_abs_diff_eq!(
            net.get(NeuronId::output(0)).unwrap().weights()[0],
            out_w,
            epsilon = 1e-15
        );

        let delta = -(1.0 - y) * y * (1.0 - y) * 0.8;
        let hid_w = 0.3 - (0.5 * 0.9) * (delta * (h * (1.0 - h)) * 1.0);
        assert_abs_diff_eq!(
            net.get(NeuronId::hidden(1, 0)).unwrap().weights()[0],
            hid_w,
            epsilon = 1e-15
        );
    }

    #[test]
    fn returns_output_errors_in_index_order() {
        let mut net = NetworkBuilder::new(&[2, 2]).unwrap().build_with_seed(1);
        net.fill_weights(0.0);
        net.forward(&[1.0, 1.0]);
        let deltas = net.backward(&[1.0, 0.5], sgd());
        assert_eq!(deltas, vec![0.125, 0.0]);
    }

    #[test]
    fn input_layer_is_never_updated() {
        let mut net = NetworkBuilder::new(&[2, 3, 2, 1]).unwrap().build_with_seed(9);
        let before: Vec<_> = (0..2)
            .map(|i| net.get(NeuronId::input(i)).unwrap().clone())
            .collect();
        net.forward(&[0.2, 0.8]);
        let after_forward: Vec<_> = (0..2)
            .map(|i| net.get(NeuronId::input(i)).unwrap().clone())
            .collect();
        net.backward(&[1.0], sgd());

        for i in 0..2 {
            let n = net.get(NeuronId::input(i)).unwrap();
            assert_eq!(n, &after_forward[i]);
            assert_eq!(n.weights(), before[i].weights());
        }
    }

    #[test]
    fn every_hidden_layer_learns() {
        let mut net = NetworkBuilder::new(&[2, 3, 2, 1]).unwrap().build_with_seed(9);
        let before = net.clone();
        net.forward(&[0.2, 0.8]);
        net.backward(&[1.0], sgd());

        for id in [
            NeuronId::hidden(1, 0),
            NeuronId::hidden(2, 1),
            NeuronId::output(0),
        ] {
            assert_ne!(net.get(id).unwrap().weights(), before.get(id).unwrap().weights());
        }
    }

    #[test]
    fn bias_neurons_are_skipped() {
        let mut net = NetworkBuilder::new(&[2, 2, 2, 2]).unwrap().build_with_seed(4);
        net.set_bias(NeuronId::hidden(2, 1), true).unwrap();
        net.set_bias(NeuronId::hidden(1, 1), true).unwrap();
        net.forward(&[0.5, 0.5]);
        net.backward(&[1.0, 0.0], sgd());

        // Bias neurons keep their forced shape.
        assert_eq!(net.get(NeuronId::hidden(2, 1)).unwrap().weights(), &[1.0, 0.0]);
        assert_eq!(net.get(NeuronId::hidden(1, 1)).unwrap().weights(), &[1.0, 0.0]);
        assert_eq!(net.get(NeuronId::hidden(2, 1)).unwrap().error(), 0.0);

        // Layer 1 sees layer 2 through the non-bias neuron only.
        let down = net.get(NeuronId::hidden(2, 0)).unwrap();
        let y = down.final_output();
        let w = down.state().net_weights()[0];
        let expected = -(1.0 - y) * y * (1.0 - y) * w;
        assert_abs_diff_eq!(
            net.get(NeuronId::hidden(1, 0)).unwrap().error(),
            expected,
            epsilon = 1e-15
        );
    }

    // The hidden error pairs downstream neuron `k` with target `k`, so a downstream
    // layer wider than the target vector only contributes its first neurons.
    #[test]
    fn hidden_error_is_bounded_by_target_count() {
        let mut net = NetworkBuilder::new(&[1, 1, 3, 1]).unwrap().build_with_seed(6);
        net.forward(&[0.4]);
        net.backward(&[1.0], sgd());

        let first = net.get(NeuronId::hidden(2, 0)).unwrap();
        let y = first.final_output();
        let w = first.state().net_weights()[0];
        assert_abs_diff_eq!(
            net.get(NeuronId::hidden(1, 0)).unwrap().error(),
            -(1.0 - y) * y * (1.0 - y) * w,
            epsilon = 1e-15
        );
    }

    #[test]
    fn missing_neurons_are_tolerated() {
        let mut net = NetworkBuilder::new(&[2, 3, 2]).unwrap().build_with_seed(2);
        net.remove(NeuronId::hidden(1, 1));
        net.remove(NeuronId::output(1));
        net.forward(&[0.1, 0.9]);
        let deltas = net.backward(&[1.0, 0.0], sgd());
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[1], 0.0);
        assert!(deltas[0] > 0.0);
    }

    #[test]
    fn trace_sink_brackets_the_sweep() {
        let mut net = NetworkBuilder::new(&[1, 1, 1]).unwrap().build_with_seed(0);
        net.forward(&[1.0]);
        let mut lines = Vec::new();
        net.backward_with(&[0.0], sgd(), &mut |args| lines.push(args.to_string()));
        assert_eq!(lines.first().map(String::as_str), Some("backward start"));
        assert_eq!(lines.last().map(String::as_str), Some("backward end"));
        assert_eq!(lines.len(), 4);
    }
}
