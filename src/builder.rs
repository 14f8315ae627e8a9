//! Network builder.
//!
//! `NetworkBuilder` is the recommended way to define a network. Strategies are
//! selected by key, the same keys a saved model stores:
//!
//! - activation: `sigmoid` (default), `tanh`, `relu`, `identity`
//! - cost: `quadratic` (default), `cross-entropy` (sigmoid only)
//! - regularization: `none` (default), `L1`, `L2`
//!
//! Cost/activation compatibility is checked in `build_*`, so the setters can be
//! called in any order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::network::Hyperparameters;
use crate::strategy::Strategy;
use crate::{Activation, Cost, Error, Layer, Network, Regularization, Result};

#[derive(Debug, Clone)]
/// Builder for a `Network`.
///
/// Example:
///
/// ```rust
/// use nn_lvq::NetworkBuilder;
///
/// # fn main() -> nn_lvq::Result<()> {
/// let net = NetworkBuilder::new(&[2, 3, 1])?
///     .cost("cross-entropy")?
///     .regularization("L2")?
///     .learning_rate(0.5)?
///     .build_with_seed(0)?;
/// assert_eq!(net.sizes(), &[2, 3, 1]);
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    sizes: Vec<usize>,
    hyper: Hyperparameters,
}

impl NetworkBuilder {
    /// Start from a list of layer sizes, input first and output last.
    ///
    /// `[2, 3, 1]` is a network with 2 inputs, one hidden layer of 3 units and
    /// a single output.
    pub fn new(sizes: &[usize]) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidConfig(
                "sizes must include input and output dims".to_owned(),
            ));
        }
        if sizes.contains(&0) {
            return Err(Error::InvalidConfig(
                "all layer sizes must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            sizes: sizes.to_vec(),
            hyper: Hyperparameters::default(),
        })
    }

    pub fn activation(mut self, key: &str) -> Result<Self> {
        self.hyper.activation = Activation::from_key(key)?;
        Ok(self)
    }

    pub fn cost(mut self, key: &str) -> Result<Self> {
        self.hyper.cost = Cost::from_key(key)?;
        Ok(self)
    }

    pub fn regularization(mut self, key: &str) -> Result<Self> {
        self.hyper.regularization = Regularization::from_key(key)?;
        Ok(self)
    }

    pub fn learning_rate(mut self, eta: f64) -> Result<Self> {
        if !(eta.is_finite() && eta > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {eta}"
            )));
        }
        self.hyper.learning_rate = eta;
        Ok(self)
    }

    pub fn lambda(mut self, lambda: f64) -> Result<Self> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lambda must be finite and >= 0, got {lambda}"
            )));
        }
        self.hyper.lambda = lambda;
        Ok(self)
    }

    /// Replace every strategy and hyperparameter at once.
    pub fn hyperparameters(mut self, hyper: Hyperparameters) -> Self {
        self.hyper = hyper;
        self
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        self.hyper.validate()?;

        let mut layers = Vec::with_capacity(self.sizes.len() - 1);
        for w in self.sizes.windows(2) {
            layers.push(Layer::new_with_rng(w[0], w[1], rng)?);
        }
        Network::from_layers(layers, self.hyper)
    }
}
