use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::eval::Classifier;
use crate::{Dataset, Error, Gradients, Monitoring, Network, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainConfig {
    pub epochs: usize,
    /// Samples per mini-batch. Samples left over after the last full batch
    /// of an epoch are skipped for that epoch.
    pub batch_size: usize,
    pub monitoring: Monitoring,
    /// Stop once the validation error rate has not improved for this many
    /// consecutive epochs. Requires a validation set.
    pub early_stop_patience: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 10,
            monitoring: Monitoring::default(),
            early_stop_patience: None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if self.early_stop_patience == Some(0) {
            return Err(Error::InvalidConfig(
                "early_stop_patience must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// How a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// Every requested epoch ran.
    Completed { epochs: usize },
    /// The stopping criterion fired after `epoch` epochs (1-based).
    StoppedEarly { epoch: usize },
}

impl TrainOutcome {
    /// Number of epochs that ran.
    pub fn epochs_run(self) -> usize {
        match self {
            TrainOutcome::Completed { epochs } => epochs,
            TrainOutcome::StoppedEarly { epoch } => epoch,
        }
    }

    pub fn stopped_early(self) -> bool {
        matches!(self, TrainOutcome::StoppedEarly { .. })
    }
}

/// Per-epoch metric values. A series stays empty when its metric is not
/// monitored (or, for validation series, when no validation set is given).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricHistory {
    pub train_accuracy: Vec<f64>,
    pub train_error: Vec<f64>,
    pub train_cost: Vec<f64>,
    pub validation_accuracy: Vec<f64>,
    pub validation_error: Vec<f64>,
    pub validation_cost: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history: MetricHistory,
    pub outcome: TrainOutcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct EpochMetrics {
    accuracy: Option<f64>,
    error: Option<f64>,
    cost: Option<f64>,
}

impl Network {
    /// Train with mini-batch stochastic gradient descent.
    ///
    /// Each epoch shuffles the sample order, cuts it into consecutive batches
    /// of `batch_size` (dropping the remainder), and for each batch applies
    ///
    /// - `b -= eta * sum(d_b)`
    /// - `w -= eta * (sum(d_w) + reg'(w, lambda, n))`
    ///
    /// where the sums run over the batch and `n = train.len()`. Gradients are
    /// summed, not averaged, so the effective per-sample step is
    /// `eta / batch_size`.
    ///
    /// Every dataset shape is checked before the first update, so a shape
    /// error leaves the parameters untouched.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        train: &Dataset,
        validation: Option<&Dataset>,
        cfg: &TrainConfig,
        rng: &mut R,
    ) -> Result<TrainReport> {
        cfg.validate()?;
        train.check_dims("train", self.input_size(), self.output_size())?;
        if let Some(va) = validation {
            va.check_dims("validation", self.input_size(), self.output_size())?;
        }
        if cfg.early_stop_patience.is_some() && validation.is_none() {
            return Err(Error::InvalidConfig(
                "early stopping requires a validation set".to_owned(),
            ));
        }

        let n = train.len();
        if cfg.batch_size > n {
            warn!(
                batch_size = cfg.batch_size,
                train_len = n,
                "batch size exceeds training set; no updates will be applied"
            );
        }

        let started = Instant::now();
        let mut history = MetricHistory::default();
        let mut outcome = TrainOutcome::Completed { epochs: cfg.epochs };
        let mut order: Vec<usize> = (0..n).collect();
        let mut acc = self.gradients();
        let mut best_validation_error = f64::INFINITY;
        let mut stale_epochs = 0;

        for epoch in 0..cfg.epochs {
            order.shuffle(rng);

            for (batch_idx, batch) in order.chunks_exact(cfg.batch_size).enumerate() {
                acc.clear();
                for &idx in batch {
                    let grads = self.backpropagation(train.input(idx), train.target(idx))?;
                    acc.accumulate(&grads);
                }
                if !acc.is_finite() {
                    return Err(Error::NumericalDivergence(format!(
                        "non-finite gradient in epoch {epoch}, batch {batch_idx}"
                    )));
                }
                self.sgd_step(&acc, n);
            }

            let tr = self.epoch_metrics(train, &cfg.monitoring)?;
            push_metrics(
                tr,
                &mut history.train_accuracy,
                &mut history.train_error,
                &mut history.train_cost,
            );

            let mut va = EpochMetrics::default();
            if let Some(va_data) = validation {
                va = self.epoch_metrics(va_data, &cfg.monitoring)?;
                push_metrics(
                    va,
                    &mut history.validation_accuracy,
                    &mut history.validation_error,
                    &mut history.validation_cost,
                );
            }

            info!(
                epoch = epoch + 1,
                train_accuracy = tr.accuracy,
                train_error = tr.error,
                train_cost = tr.cost,
                validation_accuracy = va.accuracy,
                validation_error = va.error,
                validation_cost = va.cost,
                "epoch done"
            );

            if let (Some(patience), Some(va_data)) = (cfg.early_stop_patience, validation) {
                let err = match va.error {
                    Some(e) => e,
                    None => self.eval_error_rate(va_data)?,
                };
                if err < best_validation_error {
                    best_validation_error = err;
                    stale_epochs = 0;
                } else {
                    stale_epochs += 1;
                    debug!(epoch = epoch + 1, stale_epochs, "validation error did not improve");
                }
                if stale_epochs >= patience {
                    info!(epoch = epoch + 1, "stopping early");
                    outcome = TrainOutcome::StoppedEarly { epoch: epoch + 1 };
                    break;
                }
            }
        }

        Ok(TrainReport {
            history,
            outcome,
            elapsed: started.elapsed(),
        })
    }

    /// Apply one gradient-descent update from (summed) gradients.
    ///
    /// `train_len` is the size of the training set the regularization term is
    /// scaled against.
    pub fn sgd_step(&mut self, grads: &Gradients, train_len: usize) {
        assert_eq!(
            grads.num_layers(),
            self.num_layers(),
            "grads has {} layers, network has {}",
            grads.num_layers(),
            self.num_layers()
        );

        let hyper = *self.hyperparameters();
        for (idx, layer) in self.layers_mut().iter_mut().enumerate() {
            layer.sgd_step(
                grads.d_weights(idx),
                grads.d_biases(idx),
                hyper.learning_rate,
                hyper.regularization,
                hyper.lambda,
                train_len,
            );
        }
        self.mark_trained();
    }

    fn epoch_metrics(&self, data: &Dataset, monitoring: &Monitoring) -> Result<EpochMetrics> {
        let mut out = EpochMetrics::default();
        if monitoring.accuracy || monitoring.error {
            let accuracy = self.eval_accuracy(data)? as f64 / data.len() as f64;
            if monitoring.accuracy {
                out.accuracy = Some(accuracy);
            }
            if monitoring.error {
                out.error = Some(1.0 - accuracy);
            }
        }
        if monitoring.cost {
            out.cost = Some(self.eval_cost(data)?);
        }
        Ok(out)
    }
}

fn push_metrics(m: EpochMetrics, acc: &mut Vec<f64>, err: &mut Vec<f64>, cost: &mut Vec<f64>) {
    acc.extend(m.accuracy);
    err.extend(m.error);
    cost.extend(m.cost);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, Hyperparameters, Layer, ModelState, NetworkBuilder};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn xor_like() -> Dataset {
        Dataset::from_class_rows(
            &[vec![0.0, 0.0], vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            &[0, 0, 1, 1],
            2,
        )
        .unwrap()
    }

    fn net(sizes: &[usize]) -> Network {
        NetworkBuilder::new(sizes)
            .and_then(|b| b.build_with_seed(3))
            .unwrap()
    }

    #[test]
    fn config_validation() {
        let mut cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
        cfg = TrainConfig {
            epochs: 0,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shape_errors_leave_parameters_untouched() {
        let mut network = net(&[3, 2]);
        let before = network.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let err = network
            .train(&xor_like(), None, &TrainConfig::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert_eq!(network, before);
    }

    #[test]
    fn one_batch_applies_summed_gradients() {
        let mut network = net(&[2, 2]);
        let data = xor_like();

        let mut expected = network.clone();
        let mut sum = expected.gradients();
        for idx in 0..data.len() {
            sum.accumulate(&expected.backpropagation(data.input(idx), data.target(idx)).unwrap());
        }
        expected.sgd_step(&sum, data.len());

        // A single full-size batch makes the shuffle irrelevant.
        let cfg = TrainConfig {
            epochs: 1,
            batch_size: 4,
            monitoring: Monitoring::none(),
            early_stop_patience: None,
        };
        let mut rng = StdRng::seed_from_u64(11);
        network.train(&data, None, &cfg, &mut rng).unwrap();

        for (a, b) in network.layers().iter().zip(expected.layers()) {
            for (x, y) in a.weights().iter().zip(b.weights()) {
                assert!((x - y).abs() < 1e-12);
            }
            for (x, y) in a.biases().iter().zip(b.biases()) {
                assert!((x - y).abs() < 1e-12);
            }
        }
        assert_eq!(network.state(), ModelState::Trained);
    }

    #[test]
    fn oversized_batch_applies_no_update() {
        let mut network = net(&[2, 2]);
        let before = network.clone();
        let cfg = TrainConfig {
            epochs: 2,
            batch_size: 5,
            ..TrainConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let report = network.train(&xor_like(), None, &cfg, &mut rng).unwrap();
        assert_eq!(network.layers(), before.layers());
        assert_eq!(network.state(), ModelState::Initialized);
        assert_eq!(report.history.train_error.len(), 2);
    }

    #[test]
    fn early_stop_requires_validation() {
        let mut network = net(&[2, 2]);
        let cfg = TrainConfig {
            early_stop_patience: Some(2),
            ..TrainConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            network.train(&xor_like(), None, &cfg, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn diverging_training_fails_before_applying_the_batch() {
        let layer = Layer::from_parts(2, 2, vec![1.0; 4], vec![0.0; 2]).unwrap();
        let hyper = Hyperparameters {
            activation: Activation::Identity,
            ..Hyperparameters::default()
        };
        let mut network = Network::from_layers(vec![layer], hyper).unwrap();
        // z = 2e308 overflows to infinity.
        let data = Dataset::from_class_rows(&[vec![1e308, 1e308]], &[0], 2).unwrap();
        let before = network.clone();
        let cfg = TrainConfig {
            epochs: 1,
            batch_size: 1,
            ..TrainConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = network.train(&data, None, &cfg, &mut rng).unwrap_err();
        assert!(matches!(err, Error::NumericalDivergence(_)));
        assert_eq!(network, before);
    }
}
