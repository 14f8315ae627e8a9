//! Learning Vector Quantization.
//!
//! An `Lvq` keeps `prototypes_per_class` prototype vectors for every class and
//! labels an input with the class of its nearest prototype (the best matching
//! unit, BMU). Prototypes are stored as a flat row-major buffer where row
//! `slot * output_size + class` belongs to `class`, so `row % output_size`
//! recovers the class.

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::eval::Classifier;
use crate::{Dataset, Distance, Error, ModelState, PrototypeInit, Result, TrainOutcome};

/// Validation error rate below which early stopping ends training.
const EARLY_STOP_ERROR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LvqConfig {
    pub input_size: usize,
    pub output_size: usize,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub prototypes_per_class: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub distance: Distance,
    #[cfg_attr(feature = "serde", serde(default))]
    pub init: PrototypeInit,
}

#[cfg(feature = "serde")]
fn one() -> usize {
    1
}

impl LvqConfig {
    /// One prototype per class, euclidean distance, average initialization.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            output_size,
            prototypes_per_class: 1,
            distance: Distance::default(),
            init: PrototypeInit::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.output_size == 0 {
            return Err(Error::InvalidConfig(
                "input_size and output_size must be > 0".to_owned(),
            ));
        }
        if self.prototypes_per_class == 0 {
            return Err(Error::InvalidConfig(
                "prototypes_per_class must be > 0".to_owned(),
            ));
        }
        self.output_size
            .checked_mul(self.prototypes_per_class)
            .and_then(|rows| rows.checked_mul(self.input_size))
            .ok_or_else(|| Error::InvalidConfig("prototype buffer size overflow".to_owned()))?;
        Ok(())
    }

    /// Only meaningful for a config that passed `validate`.
    #[inline]
    pub fn num_prototypes(&self) -> usize {
        self.output_size * self.prototypes_per_class
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LvqTrainConfig {
    pub eta: f64,
    pub epochs: usize,
    /// Adapt eta after every epoch (see `Lvq::train`).
    pub eta_decay: bool,
    /// Stop once the validation error rate drops below 1%.
    pub early_stop: bool,
}

impl Default for LvqTrainConfig {
    fn default() -> Self {
        Self {
            eta: 0.1,
            epochs: 20,
            eta_decay: false,
            early_stop: true,
        }
    }
}

impl LvqTrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "eta must be finite and > 0, got {}",
                self.eta
            )));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LvqReport {
    /// Training error rate after each epoch.
    pub train_error: Vec<f64>,
    /// Validation error rate after each epoch; empty without a validation set.
    pub validation_error: Vec<f64>,
    pub outcome: TrainOutcome,
    /// Learning rate after the last epoch's decay step.
    pub final_eta: f64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lvq {
    config: LvqConfig,
    /// Row-major (num_prototypes, input_size). Empty until initialized.
    prototypes: Vec<f64>,
    state: ModelState,
}

impl Lvq {
    /// An uninitialized model. Prototypes are created by the first `train`
    /// call (or `initialize`).
    pub fn new(config: LvqConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            prototypes: Vec::new(),
            state: ModelState::Uninitialized,
        })
    }

    /// A model with explicit prototypes, one row per prototype in storage
    /// order (`slot * output_size + class`).
    pub fn from_prototypes(config: LvqConfig, rows: &[Vec<f64>]) -> Result<Self> {
        config.validate()?;
        if rows.len() != config.num_prototypes() {
            return Err(Error::dims("prototype rows", config.num_prototypes(), rows.len()));
        }
        let mut prototypes = Vec::with_capacity(rows.len() * config.input_size);
        for row in rows {
            if row.len() != config.input_size {
                return Err(Error::dims("prototype length", config.input_size, row.len()));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidData("prototypes must be finite".to_owned()));
            }
            prototypes.extend_from_slice(row);
        }
        Ok(Self {
            config,
            prototypes,
            state: ModelState::Initialized,
        })
    }

    #[inline]
    pub fn config(&self) -> &LvqConfig {
        &self.config
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.config.input_size
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.config.output_size
    }

    #[inline]
    pub fn prototypes_per_class(&self) -> usize {
        self.config.prototypes_per_class
    }

    #[inline]
    pub fn distance(&self) -> Distance {
        self.config.distance
    }

    #[inline]
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Flat prototype buffer; empty while uninitialized.
    #[inline]
    pub fn prototypes(&self) -> &[f64] {
        &self.prototypes
    }

    /// Prototype `slot` of `class`, if initialized and in range.
    pub fn prototype(&self, class: usize, slot: usize) -> Option<&[f64]> {
        if class >= self.output_size() || slot >= self.prototypes_per_class() {
            return None;
        }
        let dim = self.input_size();
        let row = slot * self.output_size() + class;
        self.prototypes.get(row * dim..(row + 1) * dim)
    }

    /// Prototypes as nested rows, in storage order.
    pub fn prototype_rows(&self) -> Vec<Vec<f64>> {
        self.prototypes
            .chunks(self.input_size())
            .map(<[f64]>::to_vec)
            .collect()
    }

    /// (Re)create the prototypes from `data` with the configured
    /// initialization strategy.
    pub fn initialize<R: Rng + ?Sized>(&mut self, data: &Dataset, rng: &mut R) -> Result<()> {
        data.check_dims("train", self.input_size(), self.output_size())?;
        self.prototypes = self
            .config
            .init
            .initialize(data, self.prototypes_per_class(), rng);
        self.state = ModelState::Initialized;
        debug!(
            init = %self.config.init,
            prototypes = self.config.num_prototypes(),
            "initialized prototypes"
        );
        Ok(())
    }

    /// Index of the prototype nearest to `x`. The first minimum wins ties.
    pub fn best_matching_unit(&self, x: &[f64]) -> Result<usize> {
        if !self.state.is_initialized() {
            return Err(Error::ModelNotInitialized);
        }
        if x.len() != self.input_size() {
            return Err(Error::dims("input length", self.input_size(), x.len()));
        }
        Ok(self.bmu(x))
    }

    /// Class of the prototype nearest to `x`.
    pub fn classify(&self, x: &[f64]) -> Result<usize> {
        Ok(self.best_matching_unit(x)? % self.output_size())
    }

    /// Train with the LVQ1 competitive rule.
    ///
    /// An uninitialized model is first initialized from `train`. Each epoch
    /// visits the training examples in dataset order; the BMU of each example
    /// moves by `s * eta * (x - w)` with `s = +1` when its class matches the
    /// label and `s = -1` otherwise.
    ///
    /// With `eta_decay`, after each epoch eta becomes `eta / (1 + s * eta)`
    /// while `eta < 1` (and `1` otherwise), where `s` is the sign of the
    /// epoch's last update.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        train: &Dataset,
        validation: Option<&Dataset>,
        cfg: &LvqTrainConfig,
        rng: &mut R,
    ) -> Result<LvqReport> {
        cfg.validate()?;
        train.check_dims("train", self.input_size(), self.output_size())?;
        if let Some(va) = validation {
            va.check_dims("validation", self.input_size(), self.output_size())?;
        }
        if !self.state.is_initialized() {
            self.initialize(train, rng)?;
        }

        let started = Instant::now();
        let dim = self.input_size();
        let out = self.output_size();
        let mut eta = cfg.eta;
        let mut train_error = Vec::with_capacity(cfg.epochs);
        let mut validation_error = Vec::new();
        let mut outcome = TrainOutcome::Completed { epochs: cfg.epochs };

        for epoch in 0..cfg.epochs {
            let mut sign = 1.0;
            for (x, y) in train.iter() {
                let bmu = self.bmu(x);
                sign = if bmu % out == y { 1.0 } else { -1.0 };
                let step = sign * eta;
                let w = &mut self.prototypes[bmu * dim..(bmu + 1) * dim];
                for (wi, &xi) in w.iter_mut().zip(x) {
                    *wi += step * (xi - *wi);
                }
            }
            self.state = ModelState::Trained;

            if cfg.eta_decay {
                // Only the last update's sign is taken into account.
                eta = if eta < 1.0 { eta / (1.0 + sign * eta) } else { 1.0 };
                debug!(epoch = epoch + 1, eta, "decayed learning rate");
            }

            let tr = self.eval_error_rate(train)?;
            train_error.push(tr);

            let mut va = None;
            if let Some(va_data) = validation {
                let err = self.eval_error_rate(va_data)?;
                validation_error.push(err);
                va = Some(err);
            }

            info!(
                epoch = epoch + 1,
                train_error = tr,
                validation_error = va,
                "epoch done"
            );

            if cfg.early_stop && va.is_some_and(|err| err < EARLY_STOP_ERROR) {
                info!(epoch = epoch + 1, "validation error below threshold, stopping early");
                outcome = TrainOutcome::StoppedEarly { epoch: epoch + 1 };
                break;
            }
        }

        Ok(LvqReport {
            train_error,
            validation_error,
            outcome,
            final_eta: eta,
            elapsed: started.elapsed(),
        })
    }

    fn bmu(&self, x: &[f64]) -> usize {
        let distance = self.distance();
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, w) in self.prototypes.chunks_exact(self.input_size()).enumerate() {
            let d = distance.value(x, w);
            if d < best_dist {
                best = idx;
                best_dist = d;
            }
        }
        best
    }
}

impl Classifier for Lvq {
    fn num_classes(&self) -> usize {
        self.output_size()
    }

    fn predict_class(&self, x: &[f64]) -> Result<usize> {
        self.classify(x)
    }
}

impl fmt::Display for Lvq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Learning Vector Quantizer")?;
        writeln!(f, "initialized          : {}", self.state.is_initialized())?;
        writeln!(f, "inputs               : {}", self.input_size())?;
        writeln!(f, "outputs              : {}", self.output_size())?;
        writeln!(f, "prototypes per class : {}", self.prototypes_per_class())?;
        writeln!(f, "distance             : {}", self.distance())?;
        write!(f, "initialization       : {}", self.config.init)
    }
}
