//! Labeled datasets.
//!
//! Samples are stored contiguously in row-major layout. Every row keeps both
//! forms of its label: the class index (used for accuracy, confusion and LVQ)
//! and a target vector of length `num_classes` (used by the network cost).

use crate::{Error, Result};

/// A class label, either as an index or as a (one-hot) target vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Class(usize),
    OneHot(Vec<f64>),
}

impl Label {
    /// Class index of this label.
    ///
    /// For vectors this is the position of the maximum value (first one on
    /// ties). Returns `None` for an empty vector.
    pub fn class_index(&self) -> Option<usize> {
        match self {
            Label::Class(c) => Some(*c),
            Label::OneHot(v) => argmax(v),
        }
    }
}

impl From<usize> for Label {
    fn from(class: usize) -> Self {
        Label::Class(class)
    }
}

impl From<Vec<f64>> for Label {
    fn from(target: Vec<f64>) -> Self {
        Label::OneHot(target)
    }
}

/// Index of the largest value; the first maximum wins. NaN entries are
/// skipped, so an all-NaN slice has no maximum.
pub fn argmax(xs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        if x.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

/// A supervised classification dataset.
///
/// Stored as contiguous buffers:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * num_classes`
/// - `classes.len() == len`
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<f64>,
    targets: Vec<f64>,
    classes: Vec<usize>,
    input_dim: usize,
    num_classes: usize,
}

impl Dataset {
    /// Build a dataset from `(features, label)` pairs.
    ///
    /// Index labels must be `< num_classes`; vector labels must have length
    /// `num_classes` and are kept verbatim as targets.
    pub fn from_samples(samples: &[(Vec<f64>, Label)], num_classes: usize) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if num_classes == 0 {
            return Err(Error::InvalidData("num_classes must be > 0".to_owned()));
        }

        let input_dim = samples[0].0.len();
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }

        let len = samples.len();
        let mut inputs = Vec::with_capacity(len * input_dim);
        let mut targets = Vec::with_capacity(len * num_classes);
        let mut classes = Vec::with_capacity(len);

        for (i, (x, label)) in samples.iter().enumerate() {
            if x.len() != input_dim {
                return Err(Error::dims(format!("input row {i}"), input_dim, x.len()));
            }
            if x.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidData(format!(
                    "input row {i} contains non-finite values"
                )));
            }
            inputs.extend_from_slice(x);

            match label {
                Label::Class(c) => {
                    if *c >= num_classes {
                        return Err(Error::InvalidData(format!(
                            "label of row {i} is class {c}, but num_classes is {num_classes}"
                        )));
                    }
                    let start = targets.len();
                    targets.resize(start + num_classes, 0.0);
                    targets[start + c] = 1.0;
                    classes.push(*c);
                }
                Label::OneHot(t) => {
                    if t.len() != num_classes {
                        return Err(Error::dims(
                            format!("label vector of row {i}"),
                            num_classes,
                            t.len(),
                        ));
                    }
                    if t.iter().any(|v| !v.is_finite()) {
                        return Err(Error::InvalidData(format!(
                            "label vector of row {i} contains non-finite values"
                        )));
                    }
                    // Length is > 0 and every entry is finite, so argmax finds a class.
                    let c = argmax(t).unwrap_or(0);
                    targets.extend_from_slice(t);
                    classes.push(c);
                }
            }
        }

        Ok(Self {
            inputs,
            targets,
            classes,
            input_dim,
            num_classes,
        })
    }

    /// Build a dataset from feature rows and one-hot target rows.
    ///
    /// `num_classes` is taken from the first target row.
    pub fn from_one_hot_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }
        let num_classes = targets.first().map(|t| t.len()).unwrap_or(0);
        let samples: Vec<(Vec<f64>, Label)> = inputs
            .iter()
            .zip(targets)
            .map(|(x, t)| (x.clone(), Label::OneHot(t.clone())))
            .collect();
        Self::from_samples(&samples, num_classes)
    }

    /// Build a dataset from feature rows and class indices.
    pub fn from_class_rows(
        inputs: &[Vec<f64>],
        classes: &[usize],
        num_classes: usize,
    ) -> Result<Self> {
        if inputs.len() != classes.len() {
            return Err(Error::InvalidData(format!(
                "inputs/classes length mismatch: {} vs {}",
                inputs.len(),
                classes.len()
            )));
        }
        let samples: Vec<(Vec<f64>, Label)> = inputs
            .iter()
            .zip(classes)
            .map(|(x, &c)| (x.clone(), Label::Class(c)))
            .collect();
        Self::from_samples(&samples, num_classes)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    /// Returns the `idx`-th input row.
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th target row (length `num_classes`).
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f64] {
        let start = idx * self.num_classes;
        &self.targets[start..start + self.num_classes]
    }

    #[inline]
    /// Returns the class index of the `idx`-th sample.
    ///
    /// Panics if `idx >= len`.
    pub fn class(&self, idx: usize) -> usize {
        self.classes[idx]
    }

    /// Iterate `(input, class)` pairs in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], usize)> + '_ {
        self.inputs
            .chunks_exact(self.input_dim)
            .zip(self.classes.iter().copied())
    }

    /// Number of samples of each class.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for &c in &self.classes {
            counts[c] += 1;
        }
        counts
    }

    /// Check that the dataset fits a model with the given input/output sizes.
    pub(crate) fn check_dims(&self, what: &str, input_dim: usize, num_classes: usize) -> Result<()> {
        if self.input_dim != input_dim {
            return Err(Error::dims(
                format!("{what} input_dim"),
                input_dim,
                self.input_dim,
            ));
        }
        if self.num_classes != num_classes {
            return Err(Error::dims(
                format!("{what} num_classes"),
                num_classes,
                self.num_classes,
            ));
        }
        Ok(())
    }
}
