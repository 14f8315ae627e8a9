//! Cost functions.
//!
//! A cost compares the network output `a` with a target `y` for a single
//! example. Training only needs the output-layer error; evaluation needs the
//! value.

use crate::strategy::{Strategy, strategy_impls};
use crate::{Activation, Error, Result};

/// Smallest probability fed to `ln` by the cross-entropy cost.
const LOG_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Supported cost functions.
pub enum Cost {
    /// `0.5 * ||a - y||^2`.
    #[default]
    Quadratic,
    /// `-sum(y ln a + (1 - y) ln(1 - a))`.
    ///
    /// Only valid on top of a sigmoid output: the sigmoid derivative cancels
    /// and the output error reduces to `a - y`.
    CrossEntropy,
}

impl Strategy for Cost {
    const FAMILY: &'static str = "cost";
    const ALL: &'static [Self] = &[Cost::Quadratic, Cost::CrossEntropy];

    fn key(self) -> &'static str {
        match self {
            Cost::Quadratic => "quadratic",
            Cost::CrossEntropy => "cross-entropy",
        }
    }
}

strategy_impls!(Cost);

impl Cost {
    /// Check that this cost can be paired with `activation`.
    pub fn validate_with(self, activation: Activation) -> Result<()> {
        match (self, activation) {
            (Cost::CrossEntropy, Activation::Sigmoid) | (Cost::Quadratic, _) => Ok(()),
            (Cost::CrossEntropy, other) => Err(Error::IncompatibleCostActivation {
                cost: self.key(),
                activation: other.key(),
            }),
        }
    }

    /// Cost of a single example.
    ///
    /// Shape contract: `a.len() == y.len()`.
    pub fn value(self, a: &[f64], y: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), y.len());
        match self {
            Cost::Quadratic => {
                let mut sum_sq = 0.0;
                for (&ai, &yi) in a.iter().zip(y) {
                    let diff = ai - yi;
                    sum_sq = diff.mul_add(diff, sum_sq);
                }
                0.5 * sum_sq
            }
            Cost::CrossEntropy => {
                let mut sum = 0.0;
                for (&ai, &yi) in a.iter().zip(y) {
                    // 0 * ln(0) is taken as 0.
                    if yi != 0.0 {
                        sum -= yi * ai.max(LOG_FLOOR).ln();
                    }
                    if yi != 1.0 {
                        sum -= (1.0 - yi) * (1.0 - ai).max(LOG_FLOOR).ln();
                    }
                }
                sum
            }
        }
    }

    /// Derivative of the cost with respect to the output activation, `a - y`
    /// for both supported costs.
    pub fn derivative(self, a: &[f64], y: &[f64], out: &mut [f64]) {
        debug_assert_eq!(a.len(), y.len());
        debug_assert_eq!(a.len(), out.len());
        for ((o, &ai), &yi) in out.iter_mut().zip(a).zip(y) {
            *o = ai - yi;
        }
    }

    /// Output-layer error `dC/dz` for a layer activated by `activation`.
    ///
    /// Cross-entropy skips the activation derivative (it cancels against the
    /// sigmoid); every other cost multiplies it in.
    pub fn output_delta(self, activation: Activation, a: &[f64], y: &[f64], delta: &mut [f64]) {
        self.derivative(a, y, delta);
        if self != Cost::CrossEntropy {
            for (d, &ai) in delta.iter_mut().zip(a) {
                *d *= activation.derivative(ai);
            }
        }
    }
}
