//! Weight regularization penalties.
//!
//! `lambda` is the regularization strength and `n` the size of the dataset the
//! penalty is scaled against (the training set during updates). Biases are
//! never regularized.

use crate::strategy::{Strategy, strategy_impls};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Regularization {
    #[default]
    None,
    /// Lasso: `(lambda / n) * sum(|w|)`.
    L1,
    /// Weight decay: `(lambda / 2n) * sum(w^2)`.
    L2,
}

impl Strategy for Regularization {
    const FAMILY: &'static str = "regularization";
    const ALL: &'static [Self] = &[Regularization::None, Regularization::L1, Regularization::L2];

    fn key(self) -> &'static str {
        match self {
            Regularization::None => "none",
            Regularization::L1 => "L1",
            Regularization::L2 => "L2",
        }
    }
}

strategy_impls!(Regularization);

impl Regularization {
    /// Penalty contributed by one weight matrix.
    pub fn penalty(self, weights: &[f64], lambda: f64, n: usize) -> f64 {
        let n = n as f64;
        match self {
            Regularization::None => 0.0,
            Regularization::L1 => lambda / n * weights.iter().map(|w| w.abs()).sum::<f64>(),
            Regularization::L2 => {
                0.5 * lambda / n * weights.iter().map(|w| w * w).sum::<f64>()
            }
        }
    }

    /// Derivative of the penalty with respect to a single weight.
    #[inline]
    pub fn derivative(self, w: f64, lambda: f64, n: usize) -> f64 {
        match self {
            Regularization::None => 0.0,
            Regularization::L1 => {
                if w == 0.0 {
                    0.0
                } else {
                    lambda / n as f64 * w.signum()
                }
            }
            Regularization::L2 => lambda / n as f64 * w,
        }
    }
}
