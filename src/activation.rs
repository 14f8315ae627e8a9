//! Activation functions.
//!
//! A layer computes a pre-activation value `z = W a + b` and then applies an
//! activation function element-wise: `a' = activation(z)`.
//!
//! Derivatives are expressed in terms of the *activated* value so backprop can
//! reuse the cached activations instead of recomputing `activation(z)`.

use crate::strategy::{Strategy, strategy_impls};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Element-wise activation function.
pub enum Activation {
    #[default]
    Sigmoid,
    Tanh,
    ReLU,
    Identity,
}

impl Strategy for Activation {
    const FAMILY: &'static str = "activation";
    const ALL: &'static [Self] = &[
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::ReLU,
        Activation::Identity,
    ];

    fn key(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::ReLU => "relu",
            Activation::Identity => "identity",
        }
    }
}

strategy_impls!(Activation);

impl Activation {
    #[inline]
    pub fn value(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(z),
            Activation::Tanh => z.tanh(),
            Activation::ReLU => z.max(0.0),
            Activation::Identity => z,
        }
    }

    /// Derivative with respect to `z`, given the activated value `a = value(z)`.
    #[inline]
    pub fn derivative(self, a: f64) -> f64 {
        match self {
            Activation::Sigmoid => a * (1.0 - a),
            Activation::Tanh => 1.0 - a * a,
            Activation::ReLU => {
                if a > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Identity => 1.0,
        }
    }

    pub(crate) fn apply(self, zs: &[f64], out: &mut [f64]) {
        debug_assert_eq!(zs.len(), out.len());
        for (o, &z) in out.iter_mut().zip(zs) {
            *o = self.value(z);
        }
    }
}

#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
