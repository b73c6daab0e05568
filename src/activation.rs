//! Activation function.
//!
//! Every non-input neuron computes a net input `z = sum(input[i] * weight[i])` and
//! then squashes it with the logistic sigmoid. Only the post-activation output is
//! cached on the neuron; the derivative is recovered from that cached value during
//! backprop, so no separate `z` buffer is needed.

/// Logistic sigmoid `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Derivative of the sigmoid, expressed in terms of its output `y`.
#[inline]
pub fn sigmoid_grad_from_output(y: f64) -> f64 {
    y * (1.0 - y)
}
