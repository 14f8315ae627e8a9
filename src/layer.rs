use rand::Rng;
use rand_distr::StandardNormal;

use crate::matmul::gemm_f64;
use crate::{Activation, Error, Regularization, Result};

/// One layer transition: weights `(out_dim, in_dim)` and biases `(out_dim,)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Layer {
    /// Random initialization: weights `N(0, 1) / sqrt(in_dim)`, biases `N(0, 1)`.
    pub fn new_with_rng<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, rng: &mut R) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }

        let scale = 1.0 / (in_dim as f64).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| rng.sample::<f64, _>(StandardNormal) * scale)
            .collect();
        let biases = (0..out_dim)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();

        Ok(Self {
            in_dim,
            out_dim,
            weights,
            biases,
        })
    }

    /// Build a layer from explicit parameters, validating shapes and values.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        let expected_w = in_dim
            .checked_mul(out_dim)
            .ok_or_else(|| Error::InvalidConfig("layer weight shape overflow".to_owned()))?;
        if weights.len() != expected_w {
            return Err(Error::dims("weights", expected_w, weights.len()));
        }
        if biases.len() != out_dim {
            return Err(Error::dims("biases", out_dim, biases.len()));
        }
        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "layer parameters must be finite".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            weights,
            biases,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Weight `w[row][col]`.
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.in_dim + col]
    }

    /// Forward pass for a single sample.
    ///
    /// Computes `z = W * inputs + b` and `outputs = activation(z)`.
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `zs.len() == outputs.len() == self.out_dim`
    pub(crate) fn forward(
        &self,
        activation: Activation,
        inputs: &[f64],
        zs: &mut [f64],
        outputs: &mut [f64],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(zs.len(), self.out_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        zs.copy_from_slice(&self.biases);
        gemm_f64(
            self.out_dim,
            1,
            self.in_dim,
            1.0,
            &self.weights,
            self.in_dim,
            1,
            inputs,
            1,
            1,
            1.0,
            zs,
            1,
            1,
        );
        activation.apply(zs, outputs);
    }

    /// Parameter gradients for a single sample.
    ///
    /// Overwrite semantics:
    /// - `d_biases = delta`
    /// - `d_weights = delta * inputs^T`
    ///
    /// Shape contract:
    /// - `delta.len() == self.out_dim`
    /// - `inputs.len() == self.in_dim`
    /// - `d_weights.len() == self.weights.len()`, `d_biases.len() == self.out_dim`
    pub(crate) fn param_gradients(
        &self,
        delta: &[f64],
        inputs: &[f64],
        d_weights: &mut [f64],
        d_biases: &mut [f64],
    ) {
        debug_assert_eq!(delta.len(), self.out_dim);
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        d_biases.copy_from_slice(delta);
        gemm_f64(
            self.out_dim,
            self.in_dim,
            1,
            1.0,
            delta,
            1,
            1,
            inputs,
            1,
            1,
            0.0,
            d_weights,
            self.in_dim,
            1,
        );
    }

    /// Back-propagate an error through the weights: `d_inputs = W^T * delta`.
    ///
    /// The caller still has to multiply by the previous layer's activation
    /// derivative.
    pub(crate) fn propagate(&self, delta: &[f64], d_inputs: &mut [f64]) {
        debug_assert_eq!(delta.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);

        gemm_f64(
            self.in_dim,
            1,
            self.out_dim,
            1.0,
            &self.weights,
            1,
            self.in_dim,
            delta,
            1,
            1,
            0.0,
            d_inputs,
            1,
            1,
        );
    }

    /// Gradient-descent update:
    /// - `b -= eta * d_biases`
    /// - `w -= eta * (d_weights + reg'(w))`
    pub(crate) fn sgd_step(
        &mut self,
        d_weights: &[f64],
        d_biases: &[f64],
        eta: f64,
        regularization: Regularization,
        lambda: f64,
        n: usize,
    ) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.biases.len());

        for (w, &g) in self.weights.iter_mut().zip(d_weights) {
            *w -= eta * (g + regularization.derivative(*w, lambda, n));
        }
        for (b, &g) in self.biases.iter_mut().zip(d_biases) {
            *b -= eta * g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn layer_2x3() -> Layer {
        // W = [[1, 2, 3], [4, 5, 6]], b = [0.5, -0.5]
        Layer::from_parts(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0.5, -0.5]).unwrap()
    }

    #[test]
    fn forward_computes_affine_then_activation() {
        let layer = layer_2x3();
        let mut zs = [0.0; 2];
        let mut out = [0.0; 2];
        layer.forward(Activation::Identity, &[1.0, 0.0, -1.0], &mut zs, &mut out);
        assert_eq!(zs, [-1.5, -2.5]);
        assert_eq!(out, zs);
    }

    #[test]
    fn gradients_are_outer_product_and_transpose() {
        let layer = layer_2x3();
        let delta = [1.0, -1.0];
        let inputs = [1.0, 2.0, 3.0];

        let mut dw = [0.0; 6];
        let mut db = [0.0; 2];
        layer.param_gradients(&delta, &inputs, &mut dw, &mut db);
        assert_eq!(db, delta);
        assert_eq!(dw, [1.0, 2.0, 3.0, -1.0, -2.0, -3.0]);

        let mut d_in = [0.0; 3];
        layer.propagate(&delta, &mut d_in);
        assert_eq!(d_in, [-3.0, -3.0, -3.0]);
    }

    #[test]
    fn sgd_step_applies_weight_decay_to_weights_only() {
        let mut layer = Layer::from_parts(1, 1, vec![2.0], vec![1.0]).unwrap();
        layer.sgd_step(&[0.5], &[0.5], 0.1, Regularization::L2, 1.0, 10);
        // w = 2 - 0.1 * (0.5 + 0.1 * 2)
        assert!((layer.weights()[0] - 1.93).abs() < 1e-12);
        assert!((layer.biases()[0] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn random_init_has_expected_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = Layer::new_with_rng(4, 3, &mut rng).unwrap();
        assert_eq!(layer.weights().len(), 12);
        assert_eq!(layer.biases().len(), 3);
        assert!(layer.weights().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn from_parts_rejects_bad_shapes() {
        assert!(Layer::from_parts(2, 2, vec![0.0; 3], vec![0.0; 2]).is_err());
        assert!(Layer::from_parts(2, 2, vec![0.0; 4], vec![0.0; 1]).is_err());
        assert!(Layer::from_parts(1, 1, vec![f64::NAN], vec![0.0]).is_err());
        assert!(matches!(
            Layer::from_parts(usize::MAX, 2, vec![0.0], vec![0.0; 2]),
            Err(Error::InvalidConfig(_))
        ));
    }
}
