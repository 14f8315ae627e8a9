//! Distance metrics between a feature vector and an LVQ prototype.

use crate::strategy::{Strategy, strategy_impls};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distance {
    #[default]
    Euclidean,
    Manhattan,
}

impl Strategy for Distance {
    const FAMILY: &'static str = "distance";
    const ALL: &'static [Self] = &[Distance::Euclidean, Distance::Manhattan];

    fn key(self) -> &'static str {
        match self {
            Distance::Euclidean => "euclidean",
            Distance::Manhattan => "manhattan",
        }
    }
}

strategy_impls!(Distance);

impl Distance {
    /// Shape contract: `x.len() == w.len()`.
    #[inline]
    pub fn value(self, x: &[f64], w: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), w.len());
        match self {
            Distance::Euclidean => {
                let mut sum_sq = 0.0;
                for (&xi, &wi) in x.iter().zip(w) {
                    let diff = xi - wi;
                    sum_sq = diff.mul_add(diff, sum_sq);
                }
                sum_sq.sqrt()
            }
            Distance::Manhattan => x.iter().zip(w).map(|(xi, wi)| (xi - wi).abs()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_three_four_five() {
        assert!((Distance::Euclidean.value(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn manhattan_sums_abs_diffs() {
        assert_eq!(Distance::Manhattan.value(&[1.0, -1.0], &[0.0, 1.0]), 3.0);
    }
}
