use std::fmt;

use crate::data::argmax;
use crate::eval::Classifier;
use crate::strategy::Strategy;
use crate::{Activation, Cost, Dataset, Error, Layer, ModelState, Regularization, Result};

/// Strategy choices and hyperparameters of a `Network`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Hyperparameters {
    pub activation: Activation,
    pub cost: Cost,
    pub regularization: Regularization,
    /// SGD step size `eta`.
    pub learning_rate: f64,
    /// Regularization strength.
    pub lambda: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            activation: Activation::Sigmoid,
            cost: Cost::Quadratic,
            regularization: Regularization::None,
            learning_rate: 3.0,
            lambda: 0.1,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<()> {
        self.cost.validate_with(self.activation)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lambda must be finite and >= 0, got {}",
                self.lambda
            )));
        }
        Ok(())
    }
}

/// A fully-connected feed-forward network with a single activation function.
///
/// The network itself holds no per-call state: `feed_forward_cached` returns
/// the intermediate values as a `ForwardCache`, which `backpropagate` consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    sizes: Vec<usize>,
    layers: Vec<Layer>,
    hyper: Hyperparameters,
    state: ModelState,
}

/// Intermediate values of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardCache {
    /// Pre-activations, one per layer transition.
    zs: Vec<Vec<f64>>,
    /// Activations, starting with the input itself.
    activations: Vec<Vec<f64>>,
}

/// Cost gradients with respect to every weight and bias, shaped like the
/// network parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    d_weights: Vec<Vec<f64>>,
    d_biases: Vec<Vec<f64>>,
}

impl Network {
    /// Assemble a network from existing layers.
    ///
    /// Layers must chain (`layers[i].out_dim() == layers[i + 1].in_dim()`).
    pub fn from_layers(layers: Vec<Layer>, hyper: Hyperparameters) -> Result<Self> {
        hyper.validate()?;
        if layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        }

        let mut sizes = Vec::with_capacity(layers.len() + 1);
        sizes.push(layers[0].in_dim());
        for (i, layer) in layers.iter().enumerate() {
            let prev_out = sizes[i];
            if layer.in_dim() != prev_out {
                return Err(Error::dims(
                    format!("layer {i} in_dim"),
                    prev_out,
                    layer.in_dim(),
                ));
            }
            sizes.push(layer.out_dim());
        }

        Ok(Self {
            sizes,
            layers,
            hyper,
            state: ModelState::Initialized,
        })
    }

    /// Layer sizes, input first.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    /// Number of layer transitions (`sizes().len() - 1`).
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.hyper.activation
    }

    #[inline]
    pub fn cost(&self) -> Cost {
        self.hyper.cost
    }

    #[inline]
    pub fn regularization(&self) -> Regularization {
        self.hyper.regularization
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.hyper.learning_rate
    }

    #[inline]
    pub fn lambda(&self) -> f64 {
        self.hyper.lambda
    }

    #[inline]
    pub fn state(&self) -> ModelState {
        self.state
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub(crate) fn mark_trained(&mut self) {
        self.state = ModelState::Trained;
    }

    fn check_input(&self, x: &[f64]) -> Result<()> {
        if !self.state.is_initialized() {
            return Err(Error::ModelNotInitialized);
        }
        if x.len() != self.input_size() {
            return Err(Error::dims("input", self.input_size(), x.len()));
        }
        Ok(())
    }

    /// Forward pass for a single sample, keeping every `z` and activation.
    pub fn feed_forward_cached(&self, x: &[f64]) -> Result<ForwardCache> {
        self.check_input(x)?;

        let mut zs = Vec::with_capacity(self.layers.len());
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.to_vec());

        for layer in &self.layers {
            let mut z = vec![0.0; layer.out_dim()];
            let mut a = vec![0.0; layer.out_dim()];
            let prev = &activations[activations.len() - 1];
            layer.forward(self.hyper.activation, prev, &mut z, &mut a);
            zs.push(z);
            activations.push(a);
        }

        Ok(ForwardCache { zs, activations })
    }

    /// Propagate `x` through the network and return the output activation.
    pub fn feedforward(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut cache = self.feed_forward_cached(x)?;
        Ok(cache.activations.pop().unwrap_or_default())
    }

    /// Gradients of the cost for one sample, given the forward pass of that
    /// sample and its target vector `y`.
    ///
    /// The output error is `a - y` for cross-entropy and
    /// `(a - y) * activation'(z)` otherwise; hidden errors follow
    /// `delta_l = (W_{l+1}^T delta_{l+1}) * activation'(z_l)`. Per layer,
    /// `d_bias = delta_l` and `d_weight = delta_l * a_{l-1}^T`.
    pub fn backpropagate(&self, cache: &ForwardCache, y: &[f64]) -> Result<Gradients> {
        if cache.zs.len() != self.layers.len() {
            return Err(Error::dims(
                "forward cache layers",
                self.layers.len(),
                cache.zs.len(),
            ));
        }
        if cache.activations.len() != self.sizes.len() {
            return Err(Error::dims(
                "forward cache activations",
                self.sizes.len(),
                cache.activations.len(),
            ));
        }
        for (idx, a) in cache.activations.iter().enumerate() {
            if a.len() != self.sizes[idx] {
                return Err(Error::dims(
                    format!("forward cache activation {idx}"),
                    self.sizes[idx],
                    a.len(),
                ));
            }
        }
        for (idx, z) in cache.zs.iter().enumerate() {
            if z.len() != self.sizes[idx + 1] {
                return Err(Error::dims(
                    format!("forward cache z {idx}"),
                    self.sizes[idx + 1],
                    z.len(),
                ));
            }
        }
        if y.len() != self.output_size() {
            return Err(Error::dims("target", self.output_size(), y.len()));
        }

        let mut grads = Gradients::zeros(self);
        let act = self.hyper.activation;
        let last = self.layers.len() - 1;

        let mut delta = vec![0.0; self.output_size()];
        self.hyper
            .cost
            .output_delta(act, cache.output(), y, &mut delta);

        for idx in (0..=last).rev() {
            let layer = &self.layers[idx];
            layer.param_gradients(
                &delta,
                &cache.activations[idx],
                &mut grads.d_weights[idx],
                &mut grads.d_biases[idx],
            );

            if idx > 0 {
                let mut prev_delta = vec![0.0; layer.in_dim()];
                layer.propagate(&delta, &mut prev_delta);
                for (d, &a) in prev_delta.iter_mut().zip(&cache.activations[idx]) {
                    *d *= act.derivative(a);
                }
                delta = prev_delta;
            }
        }

        Ok(grads)
    }

    /// Run a forward pass on `x` and back-propagate the error against `y`.
    pub fn backpropagation(&self, x: &[f64], y: &[f64]) -> Result<Gradients> {
        let cache = self.feed_forward_cached(x)?;
        self.backpropagate(&cache, y)
    }

    /// Zero-initialized gradient accumulators shaped like the parameters.
    pub fn gradients(&self) -> Gradients {
        Gradients::zeros(self)
    }

    /// Mean cost over `data` plus the regularization penalty (scaled by
    /// `data.len()`).
    pub fn eval_cost(&self, data: &Dataset) -> Result<f64> {
        data.check_dims("dataset", self.input_size(), self.output_size())?;

        let mut total = 0.0;
        for idx in 0..data.len() {
            let a = self.feedforward(data.input(idx))?;
            total += self.hyper.cost.value(&a, data.target(idx));
        }
        let mean = total / data.len() as f64;

        let penalty: f64 = self
            .layers
            .iter()
            .map(|l| {
                self.hyper
                    .regularization
                    .penalty(l.weights(), self.hyper.lambda, data.len())
            })
            .sum();

        Ok(mean + penalty)
    }
}

impl Classifier for Network {
    fn num_classes(&self) -> usize {
        self.output_size()
    }

    fn predict_class(&self, x: &[f64]) -> Result<usize> {
        let out = self.feedforward(x)?;
        argmax(&out).ok_or(Error::ModelNotInitialized)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Neural Network      : {:?}", self.sizes)?;
        writeln!(f, "Activation function : {}", self.hyper.activation.key())?;
        writeln!(f, "Cost function       : {}", self.hyper.cost.key())?;
        writeln!(f, "Regularization      : {}", self.hyper.regularization.key())?;

        let widest = self.sizes.iter().copied().max().unwrap_or(0);
        if widest <= 35 {
            writeln!(f)?;
            let idx_width = self.sizes.len().to_string().len();
            let row_width = 2 * widest;
            for (idx, &units) in self.sizes.iter().enumerate() {
                writeln!(
                    f,
                    "L{idx:0>idx_width$} {:^row_width$}",
                    "* ".repeat(units)
                )?;
            }
        }
        Ok(())
    }
}

impl ForwardCache {
    /// Output activation of the last layer.
    #[inline]
    pub fn output(&self) -> &[f64] {
        self.activations
            .last()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[inline]
    pub fn zs(&self) -> &[Vec<f64>] {
        &self.zs
    }

    #[inline]
    pub fn activations(&self) -> &[Vec<f64>] {
        &self.activations
    }
}

impl Gradients {
    pub fn zeros(network: &Network) -> Self {
        let mut d_weights = Vec::with_capacity(network.num_layers());
        let mut d_biases = Vec::with_capacity(network.num_layers());
        for layer in network.layers() {
            d_weights.push(vec![0.0; layer.in_dim() * layer.out_dim()]);
            d_biases.push(vec![0.0; layer.out_dim()]);
        }
        Self {
            d_weights,
            d_biases,
        }
    }

    /// Row-major `(out_dim, in_dim)` weight gradient of layer `layer_idx`.
    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &[f64] {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &[f64] {
        &self.d_biases[layer_idx]
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.d_weights.len()
    }

    /// Element-wise `self += other`.
    ///
    /// Panics if the two gradients have different shapes.
    pub fn accumulate(&mut self, other: &Gradients) {
        assert_eq!(
            self.d_weights.len(),
            other.d_weights.len(),
            "gradient layer counts differ"
        );
        for (acc, g) in self.d_weights.iter_mut().zip(&other.d_weights) {
            assert_eq!(acc.len(), g.len(), "weight gradient shapes differ");
            for (a, &v) in acc.iter_mut().zip(g) {
                *a += v;
            }
        }
        for (acc, g) in self.d_biases.iter_mut().zip(&other.d_biases) {
            assert_eq!(acc.len(), g.len(), "bias gradient shapes differ");
            for (a, &v) in acc.iter_mut().zip(g) {
                *a += v;
            }
        }
    }

    /// Reset every entry to zero, keeping the allocation.
    pub fn clear(&mut self) {
        for v in self.d_weights.iter_mut().chain(self.d_biases.iter_mut()) {
            v.fill(0.0);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.d_weights
            .iter()
            .chain(&self.d_biases)
            .all(|v| v.iter().all(|x| x.is_finite()))
    }
}
