//! Evaluation shared by every classifier: accuracy, error rate and the
//! confusion matrix over a labeled dataset.

use std::fmt;

use crate::{Dataset, Error, Result};

/// A model that maps a feature vector to a class index.
pub trait Classifier {
    /// Number of classes the model predicts.
    fn num_classes(&self) -> usize;

    /// Predicted class of a single feature vector.
    fn predict_class(&self, x: &[f64]) -> Result<usize>;

    /// Number of correctly classified samples in `data`.
    fn eval_accuracy(&self, data: &Dataset) -> Result<usize> {
        check_classes(self.num_classes(), data)?;
        let mut count = 0;
        for (x, y) in data.iter() {
            if self.predict_class(x)? == y {
                count += 1;
            }
        }
        Ok(count)
    }

    /// `1 - correct / len` over `data`.
    fn eval_error_rate(&self, data: &Dataset) -> Result<f64> {
        let correct = self.eval_accuracy(data)?;
        Ok(1.0 - correct as f64 / data.len() as f64)
    }

    /// Confusion matrix over `data`: row = true class, column = prediction.
    fn confusion(&self, data: &Dataset) -> Result<ConfusionMatrix> {
        check_classes(self.num_classes(), data)?;
        let mut matrix = ConfusionMatrix::new(self.num_classes());
        for (x, y) in data.iter() {
            let predicted = self.predict_class(x)?;
            matrix.record(y, predicted);
        }
        Ok(matrix)
    }
}

fn check_classes(num_classes: usize, data: &Dataset) -> Result<()> {
    if data.num_classes() != num_classes {
        return Err(Error::dims(
            "dataset num_classes",
            num_classes,
            data.num_classes(),
        ));
    }
    Ok(())
}

/// Square matrix of prediction counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    n: usize,
    /// Row-major (n, n).
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            n: num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.n
    }

    /// Count one sample of class `truth` predicted as `predicted`.
    ///
    /// Panics if either index is out of range.
    pub fn record(&mut self, truth: usize, predicted: usize) {
        assert!(
            truth < self.n && predicted < self.n,
            "class ({truth}, {predicted}) out of range for {} classes",
            self.n
        );
        self.counts[truth * self.n + predicted] += 1;
    }

    #[inline]
    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth * self.n + predicted]
    }

    /// Samples whose true class is `truth`.
    pub fn row_sum(&self, truth: usize) -> usize {
        self.counts[truth * self.n..(truth + 1) * self.n].iter().sum()
    }

    /// Correct predictions.
    pub fn trace(&self) -> usize {
        (0..self.n).map(|i| self.get(i, i)).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `trace / total`, or 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.trace() as f64 / total as f64
        }
    }

    /// Nested rows, for reporting.
    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        self.counts.chunks(self.n.max(1)).map(<[usize]>::to_vec).collect()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .max()
            .map(|m| m.to_string().len())
            .unwrap_or(1);
        for row in self.counts.chunks(self.n.max(1)) {
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts class 0 for negative first features, class 1 otherwise.
    struct SignClassifier;

    impl Classifier for SignClassifier {
        fn num_classes(&self) -> usize {
            2
        }

        fn predict_class(&self, x: &[f64]) -> Result<usize> {
            Ok(usize::from(x[0] >= 0.0))
        }
    }

    fn data() -> Dataset {
        Dataset::from_class_rows(
            &[vec![-1.0], vec![-2.0], vec![3.0], vec![-0.5], vec![1.0]],
            &[0, 0, 1, 1, 0],
            2,
        )
        .unwrap()
    }

    #[test]
    fn accuracy_and_error_rate() {
        let data = data();
        assert_eq!(SignClassifier.eval_accuracy(&data).unwrap(), 3);
        assert!((SignClassifier.eval_error_rate(&data).unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn confusion_rows_sum_to_class_counts_and_trace_matches_accuracy() {
        let data = data();
        let m = SignClassifier.confusion(&data).unwrap();
        let counts = data.class_counts();
        for c in 0..2 {
            assert_eq!(m.row_sum(c), counts[c]);
        }
        assert_eq!(m.to_rows(), vec![vec![2, 1], vec![1, 1]]);
        let acc = SignClassifier.eval_accuracy(&data).unwrap() as f64 / data.len() as f64;
        assert!((m.accuracy() - acc).abs() < 1e-12);
    }

    #[test]
    fn rejects_dataset_with_other_class_count() {
        let data = Dataset::from_class_rows(&[vec![1.0]], &[0], 3).unwrap();
        assert!(SignClassifier.eval_accuracy(&data).is_err());
    }
}
