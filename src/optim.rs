//! Step parameters for online gradient descent.
//!
//! Weights are updated in place by the backward pass, one pattern at a time. There is
//! no optimizer state: momentum here is a plain multiplier on every step, not a
//! velocity buffer.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Learning rate and momentum applied by [`crate::Network::backward`].
pub struct Sgd {
    learning_rate: f64,
    momentum: f64,
}

impl Sgd {
    /// Construct a step configuration.
    ///
    /// Returns an error if `learning_rate` is not finite or `<= 0`, or if `momentum`
    /// is not finite or negative.
    pub fn new(learning_rate: f64, momentum: f64) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }
        if !(momentum.is_finite() && momentum >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "momentum must be finite and >= 0, got {momentum}"
            )));
        }
        Ok(Self {
            learning_rate,
            momentum,
        })
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    #[inline]
    pub fn momentum(&self) -> f64 {
        self.momentum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgd_requires_positive_finite_lr() {
        assert!(Sgd::new(0.0, 0.9).is_err());
        assert!(Sgd::new(-1.0, 0.9).is_err());
        assert!(Sgd::new(f64::NAN, 0.9).is_err());
        assert!(Sgd::new(f64::INFINITY, 0.9).is_err());
    }

    #[test]
    fn sgd_rejects_bad_momentum() {
        assert!(Sgd::new(0.1, -0.1).is_err());
        assert!(Sgd::new(0.1, f64::NAN).is_err());

        let sgd = Sgd::new(0.25, 0.0).unwrap();
        assert_eq!(sgd.learning_rate(), 0.25);
        assert_eq!(sgd.momentum(), 0.0);
    }
}
