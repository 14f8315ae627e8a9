//! Metrics recorded while training.
//!
//! Metrics are evaluation helpers (they do not participate in backprop). The
//! network training loop records each enabled metric once per epoch, for the
//! training set and, when given, the validation set.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-epoch training metrics.
pub enum Metric {
    /// Fraction of correctly classified samples.
    Accuracy,
    /// `1 - accuracy`.
    ErrorRate,
    /// Mean cost plus regularization penalty.
    Cost,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Accuracy, Metric::ErrorRate, Metric::Cost];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::ErrorRate => "error",
            Metric::Cost => "cost",
        }
    }

    /// Parse a metric name (`"accuracy"`, `"error"`, `"cost"`).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "accuracy" | "acc" => Ok(Metric::Accuracy),
            "error" | "error-rate" | "error_rate" => Ok(Metric::ErrorRate),
            "cost" | "loss" => Ok(Metric::Cost),
            _ => Err(Error::InvalidConfig(format!("unknown metric {name:?}"))),
        }
    }
}

/// Which metrics the training loop records each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Monitoring {
    pub accuracy: bool,
    pub error: bool,
    pub cost: bool,
}

impl Default for Monitoring {
    fn default() -> Self {
        Self::all()
    }
}

impl Monitoring {
    pub const fn all() -> Self {
        Self {
            accuracy: true,
            error: true,
            cost: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            accuracy: false,
            error: false,
            cost: false,
        }
    }

    /// Build from `(metric name, enabled)` pairs. Metrics not mentioned are
    /// disabled.
    pub fn from_flags<'a, I>(flags: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut monitoring = Self::none();
        for (name, enabled) in flags {
            monitoring.set(Metric::from_name(name)?, enabled);
        }
        Ok(monitoring)
    }

    pub fn set(&mut self, metric: Metric, enabled: bool) {
        match metric {
            Metric::Accuracy => self.accuracy = enabled,
            Metric::ErrorRate => self.error = enabled,
            Metric::Cost => self.cost = enabled,
        }
    }

    pub fn is_enabled(&self, metric: Metric) -> bool {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::ErrorRate => self.error,
            Metric::Cost => self.cost,
        }
    }

    pub fn any(&self) -> bool {
        self.accuracy || self.error || self.cost
    }
}
