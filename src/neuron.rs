//! Neurons.
//!
//! A network is a keyed collection of neurons. Each neuron owns its incoming
//! connections: one input slot and one weight per neuron in the previous layer
//! (input-layer neurons always have exactly one slot, fed from the input vector).
//!
//! There are exactly three kinds of neuron, modelled as the closed enum [`Neuron`]:
//!
//! - [`InputNeuron`]: passes its single input through unchanged.
//! - [`HiddenNeuron`]: sigmoid of the weighted input sum; learns from the error
//!   signal of the layer downstream of it.
//! - [`OutputNeuron`]: sigmoid of the weighted input sum; learns from the target.
//!
//! All three share the same [`NeuronState`].

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::activation::{sigmoid, sigmoid_grad_from_output};
use crate::loss::squared_error;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NeuronKind {
    Input,
    Hidden,
    Output,
}

/// Structured key of a neuron inside a network.
///
/// `index` is the 0-based position within the layer. Hidden neurons also carry
/// their layer number (`1..layers - 1`); input and output layers are unique so
/// they need none.
///
/// The derived ordering sorts input neurons first, then hidden neurons layer by
/// layer, then output neurons, i.e. network order.
///
/// The textual form (`Display` / `FromStr`) is 1-based: `a-1` is the first input
/// neuron, `b-2-1` the second neuron of hidden layer 1, `c-1` the first output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NeuronId {
    Input { index: usize },
    Hidden { layer: usize, index: usize },
    Output { index: usize },
}

impl NeuronId {
    #[inline]
    pub const fn input(index: usize) -> Self {
        NeuronId::Input { index }
    }

    #[inline]
    pub const fn hidden(layer: usize, index: usize) -> Self {
        NeuronId::Hidden { layer, index }
    }

    #[inline]
    pub const fn output(index: usize) -> Self {
        NeuronId::Output { index }
    }

    #[inline]
    pub fn kind(self) -> NeuronKind {
        match self {
            NeuronId::Input { .. } => NeuronKind::Input,
            NeuronId::Hidden { .. } => NeuronKind::Hidden,
            NeuronId::Output { .. } => NeuronKind::Output,
        }
    }

    /// Position of the neuron within its layer.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            NeuronId::Input { index }
            | NeuronId::Hidden { index, .. }
            | NeuronId::Output { index } => index,
        }
    }

    /// Layer number for hidden neurons, `None` otherwise.
    #[inline]
    pub fn layer(self) -> Option<usize> {
        match self {
            NeuronId::Hidden { layer, .. } => Some(layer),
            NeuronId::Input { .. } | NeuronId::Output { .. } => None,
        }
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NeuronId::Input { index } => write!(f, "a-{}", index + 1),
            NeuronId::Hidden { layer, index } => write!(f, "b-{}-{layer}", index + 1),
            NeuronId::Output { index } => write!(f, "c-{}", index + 1),
        }
    }
}

impl FromStr for NeuronId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedPersistedState(format!("bad neuron id {s:?}"));
        let parse_pos = |part: &str| -> Result<usize> {
            match part.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n - 1),
                _ => Err(malformed()),
            }
        };

        let mut parts = s.split('-');
        let kind = parts.next().ok_or_else(malformed)?;
        let number = parts.next().ok_or_else(malformed)?;
        let layer = parts.next();
        if parts.next().is_some() {
            return Err(malformed());
        }

        match (kind, layer) {
            ("a", None) => Ok(NeuronId::input(parse_pos(number)?)),
            ("c", None) => Ok(NeuronId::output(parse_pos(number)?)),
            ("b", Some(layer)) => {
                let layer = layer.parse::<usize>().map_err(|_| malformed())?;
                if layer == 0 {
                    return Err(malformed());
                }
                Ok(NeuronId::hidden(layer, parse_pos(number)?))
            }
            _ => Err(malformed()),
        }
    }
}

/// Per-neuron data shared by every kind of neuron.
///
/// All four vectors have length `fan_in`:
/// - `inputs`: raw values received from the previous layer (or the input vector).
/// - `weights`: live connection weights.
/// - `net_inputs`: net-input history slot, kept for parity with persisted state.
/// - `net_weights`: the weights as they stood at the most recent forward pass.
///
/// Backprop for layer `L` reads `net_weights` of layer `L + 1`, because by then
/// layer `L + 1` has already rewritten its live `weights` in the same sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronState {
    inputs: Vec<f64>,
    weights: Vec<f64>,
    net_inputs: Vec<f64>,
    net_weights: Vec<f64>,
    error: f64,
    output: f64,
    name: String,
    is_bias: bool,
}

impl NeuronState {
    fn with_random_weights<R: Rng + ?Sized>(fan_in: usize, name: String, rng: &mut R) -> Self {
        let weights = (0..fan_in).map(|_| rng.gen_range(-1.0..=1.0)).collect();
        Self {
            inputs: vec![0.0; fan_in],
            weights,
            net_inputs: vec![0.0; fan_in],
            net_weights: vec![0.0; fan_in],
            error: 0.0,
            output: 0.0,
            name,
            is_bias: false,
        }
    }

    #[inline]
    pub fn fan_in(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    #[inline]
    pub fn input(&self, i: usize) -> Option<f64> {
        self.inputs.get(i).copied()
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn net_inputs(&self) -> &[f64] {
        &self.net_inputs
    }

    #[inline]
    pub fn net_weights(&self) -> &[f64] {
        &self.net_weights
    }

    /// Error computed by the most recent `calculate_error` call.
    #[inline]
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Output cached by the most recent activation, without recomputing it.
    #[inline]
    pub fn final_output(&self) -> f64 {
        self.output
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_bias(&self) -> bool {
        self.is_bias
    }

    pub fn set_input(&mut self, i: usize, value: f64) -> Result<()> {
        let fan_in = self.fan_in();
        let slot = self.inputs.get_mut(i).ok_or_else(|| {
            Error::DimensionMismatch(format!("input {i} out of range for fan-in {fan_in}"))
        })?;
        *slot = value;
        Ok(())
    }

    pub fn set_weight(&mut self, i: usize, value: f64) -> Result<()> {
        let fan_in = self.fan_in();
        let slot = self.weights.get_mut(i).ok_or_else(|| {
            Error::DimensionMismatch(format!("weight {i} out of range for fan-in {fan_in}"))
        })?;
        *slot = value;
        Ok(())
    }

    #[inline]
    pub(crate) fn first_input(&self) -> f64 {
        self.inputs.first().copied().unwrap_or(0.0)
    }

    /// Unchecked input write for the forward pass (callers iterate `0..fan_in`).
    #[inline]
    pub(crate) fn feed(&mut self, i: usize, value: f64) {
        if let Some(slot) = self.inputs.get_mut(i) {
            *slot = value;
        }
    }

    #[inline]
    pub(crate) fn fill_weights(&mut self, value: f64) {
        self.weights.fill(value);
    }

    /// Remember the current weights as the pre-update snapshot.
    #[inline]
    pub(crate) fn capture_net_weights(&mut self) {
        self.net_weights.copy_from_slice(&self.weights);
    }

    #[inline]
    fn net_input(&self) -> f64 {
        self.inputs
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| x * w)
            .sum()
    }

    /// Recompute and cache the output. Bias neurons push their fixed first input.
    fn activate(&mut self) -> f64 {
        self.output = if self.is_bias {
            self.first_input()
        } else {
            sigmoid(self.net_input())
        };
        self.output
    }

    /// Turn into a bias neuron: slot 0 carries `1 * 1`, every other slot is zeroed.
    fn force_bias(&mut self) {
        for (i, (x, w)) in self.inputs.iter_mut().zip(&mut self.weights).enumerate() {
            let v = if i == 0 { 1.0 } else { 0.0 };
            *x = v;
            *w = v;
        }
        self.is_bias = true;
        self.output = self.first_input();
    }
}

/// Input-layer neuron: a single slot, no weighting, no activation.
#[derive(Debug, Clone, PartialEq)]
pub struct InputNeuron {
    state: NeuronState,
}

impl InputNeuron {
    pub(crate) fn new<R: Rng + ?Sized>(id: NeuronId, rng: &mut R) -> Self {
        let mut state = NeuronState::with_random_weights(1, id.to_string(), rng);
        state.weights[0] = 1.0;
        Self { state }
    }

    #[inline]
    pub fn state(&self) -> &NeuronState {
        &self.state
    }

    /// Returns `input(0)` unchanged.
    pub fn output(&mut self) -> f64 {
        self.state.output = self.state.first_input();
        self.state.output
    }

    pub fn set_bias(&mut self, bias: bool) {
        if bias {
            self.state.force_bias();
        } else {
            self.state.is_bias = false;
        }
    }
}

/// Hidden-layer neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenNeuron {
    state: NeuronState,
}

impl HiddenNeuron {
    pub(crate) fn new<R: Rng + ?Sized>(id: NeuronId, fan_in: usize, rng: &mut R) -> Self {
        Self {
            state: NeuronState::with_random_weights(fan_in, id.to_string(), rng),
        }
    }

    #[inline]
    pub fn state(&self) -> &NeuronState {
        &self.state
    }

    /// `sigmoid(sum(input[i] * weight[i]))`, cached.
    pub fn output(&mut self) -> f64 {
        self.state.activate()
    }

    /// Back-propagated error signal of this neuron.
    ///
    /// `targets`, `weights` and `outputs` are read position by position (the
    /// shortest slice bounds the sum); `weights[k]` is the pre-update weight that
    /// downstream neuron `k` applies to this neuron, and `outputs[k]` its cached
    /// output:
    ///
    /// `delta = sum_k(-(targets[k] - outputs[k]) * outputs[k] * (1 - outputs[k]) * weights[k])`
    ///
    /// The result is stored as this neuron's error and returned.
    pub fn calculate_error(&mut self, targets: &[f64], weights: &[f64], outputs: &[f64]) -> f64 {
        let delta = targets
            .iter()
            .zip(weights)
            .zip(outputs)
            .map(|((&t, &w), &y)| -(t - y) * sigmoid_grad_from_output(y) * w)
            .sum();
        self.state.error = delta;
        delta
    }

    /// `weight[i] -= learning_rate * momentum * gradient * out * (1 - out) * input[i]`.
    pub fn update_weights(&mut self, gradient: f64, learning_rate: f64, momentum: f64) {
        let y = self.output();
        let d_out = sigmoid_grad_from_output(y);
        let state = &mut self.state;
        for (w, &x) in state.weights.iter_mut().zip(&state.inputs) {
            let delta = gradient * d_out * x;
            *w -= (learning_rate * momentum) * delta;
        }
    }

    /// Leaving bias mode draws fresh weights in `[-1, 1]` before clearing the flag.
    pub fn set_bias<R: Rng + ?Sized>(&mut self, bias: bool, rng: &mut R) {
        if bias {
            self.state.force_bias();
        } else {
            for w in &mut self.state.weights {
                *w = rng.gen_range(-1.0..=1.0);
            }
            self.state.is_bias = false;
        }
    }
}

/// Output-layer neuron. Never a bias neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputNeuron {
    state: NeuronState,
}

impl OutputNeuron {
    pub(crate) fn new<R: Rng + ?Sized>(id: NeuronId, fan_in: usize, rng: &mut R) -> Self {
        Self {
            state: NeuronState::with_random_weights(fan_in, id.to_string(), rng),
        }
    }

    #[inline]
    pub fn state(&self) -> &NeuronState {
        &self.state
    }

    /// `sigmoid(sum(input[i] * weight[i]))`, cached.
    pub fn output(&mut self) -> f64 {
        self.state.activate()
    }

    /// Reporting metric `0.5 * (target - output)^2`, stored as this neuron's error.
    pub fn calculate_error(&mut self, target: f64) -> f64 {
        let y = self.output();
        self.state.error = squared_error(target, y);
        self.state.error
    }

    /// Delta rule: `weight[i] -= learning_rate * (momentum * -(target - out) * out * (1 - out) * input[i])`.
    pub fn update_weights(&mut self, target: f64, learning_rate: f64, momentum: f64) {
        let y = self.output();
        let d_out = sigmoid_grad_from_output(y);
        let state = &mut self.state;
        for (w, &x) in state.weights.iter_mut().zip(&state.inputs) {
            let delta = -(target - y) * (d_out * x);
            *w -= learning_rate * (momentum * delta);
        }
    }
}

/// A neuron of one of the three kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Neuron {
    Input(InputNeuron),
    Hidden(HiddenNeuron),
    Output(OutputNeuron),
}

impl Neuron {
    /// Create the neuron `id` with `fan_in` uniformly random weights in `[-1, 1]`.
    ///
    /// Input neurons ignore `fan_in` and always get a single slot of weight 1.
    pub fn new<R: Rng + ?Sized>(id: NeuronId, fan_in: usize, rng: &mut R) -> Self {
        match id.kind() {
            NeuronKind::Input => Neuron::Input(InputNeuron::new(id, rng)),
            NeuronKind::Hidden => Neuron::Hidden(HiddenNeuron::new(id, fan_in, rng)),
            NeuronKind::Output => Neuron::Output(OutputNeuron::new(id, fan_in, rng)),
        }
    }

    #[inline]
    pub fn kind(&self) -> NeuronKind {
        match self {
            Neuron::Input(_) => NeuronKind::Input,
            Neuron::Hidden(_) => NeuronKind::Hidden,
            Neuron::Output(_) => NeuronKind::Output,
        }
    }

    #[inline]
    pub fn state(&self) -> &NeuronState {
        match self {
            Neuron::Input(n) => &n.state,
            Neuron::Hidden(n) => &n.state,
            Neuron::Output(n) => &n.state,
        }
    }

    #[inline]
    pub(crate) fn state_mut(&mut self) -> &mut NeuronState {
        match self {
            Neuron::Input(n) => &mut n.state,
            Neuron::Hidden(n) => &mut n.state,
            Neuron::Output(n) => &mut n.state,
        }
    }

    /// Recompute and cache the output.
    pub fn output(&mut self) -> f64 {
        match self {
            Neuron::Input(n) => n.output(),
            Neuron::Hidden(n) => n.output(),
            Neuron::Output(n) => n.output(),
        }
    }

    #[inline]
    pub fn final_output(&self) -> f64 {
        self.state().final_output()
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        self.state().weights()
    }

    pub fn set_weight(&mut self, i: usize, value: f64) -> Result<()> {
        self.state_mut().set_weight(i, value)
    }

    #[inline]
    pub fn input(&self, i: usize) -> Option<f64> {
        self.state().input(i)
    }

    pub fn set_input(&mut self, i: usize, value: f64) -> Result<()> {
        self.state_mut().set_input(i, value)
    }

    #[inline]
    pub fn error(&self) -> f64 {
        self.state().error()
    }

    #[inline]
    pub fn fan_in(&self) -> usize {
        self.state().fan_in()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.state().name()
    }

    #[inline]
    pub fn is_bias(&self) -> bool {
        self.state().is_bias()
    }

    /// Toggle bias mode. Ignored for output neurons.
    ///
    /// `rng` is only drawn from when a hidden neuron leaves bias mode.
    pub fn set_bias<R: Rng + ?Sized>(&mut self, bias: bool, rng: &mut R) {
        match self {
            Neuron::Input(n) => n.set_bias(bias),
            Neuron::Hidden(n) => n.set_bias(bias, rng),
            Neuron::Output(_) => {}
        }
    }

    #[inline]
    pub fn as_hidden_mut(&mut self) -> Option<&mut HiddenNeuron> {
        match self {
            Neuron::Hidden(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_output_mut(&mut self) -> Option<&mut OutputNeuron> {
        match self {
            Neuron::Output(n) => Some(n),
            _ => None,
        }
    }
}
