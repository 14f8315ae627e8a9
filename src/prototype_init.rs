//! LVQ prototype initialization.

use rand::Rng;
use tracing::debug;

use crate::Dataset;
use crate::strategy::{Strategy, strategy_impls};

/// Half-width of the uniform noise added to every prototype slot past the first.
const PERTURBATION: f64 = 1e-2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrototypeInit {
    /// Seed every prototype of a class from that class's mean.
    ///
    /// Slot 0 is the exact mean; further slots are the mean plus uniform noise
    /// in `[-0.01, 0.01)`. A class without training examples falls back to the
    /// mean of the whole training set.
    #[default]
    Average,
}

impl Strategy for PrototypeInit {
    const FAMILY: &'static str = "prototype initialization";
    const ALL: &'static [Self] = &[PrototypeInit::Average];

    fn key(self) -> &'static str {
        match self {
            PrototypeInit::Average => "average",
        }
    }
}

strategy_impls!(PrototypeInit);

impl PrototypeInit {
    /// Build `num_classes * per_class` prototypes from `data`.
    ///
    /// Returns a flat row-major buffer where row `slot * num_classes + class`
    /// belongs to `class`.
    pub fn initialize<R: Rng + ?Sized>(
        self,
        data: &Dataset,
        per_class: usize,
        rng: &mut R,
    ) -> Vec<f64> {
        match self {
            PrototypeInit::Average => average(data, per_class, rng),
        }
    }
}

fn average<R: Rng + ?Sized>(data: &Dataset, per_class: usize, rng: &mut R) -> Vec<f64> {
    let dim = data.input_dim();
    let num_classes = data.num_classes();

    let mut sums = vec![0.0; num_classes * dim];
    let mut overall = vec![0.0; dim];
    for (x, c) in data.iter() {
        let row = &mut sums[c * dim..(c + 1) * dim];
        for i in 0..dim {
            row[i] += x[i];
            overall[i] += x[i];
        }
    }
    let n = data.len().max(1) as f64;
    for v in &mut overall {
        *v /= n;
    }

    let counts = data.class_counts();
    let mut means = vec![0.0; num_classes * dim];
    for c in 0..num_classes {
        let mean = &mut means[c * dim..(c + 1) * dim];
        if counts[c] == 0 {
            debug!(class = c, "class has no training examples, seeding from overall mean");
            mean.copy_from_slice(&overall);
        } else {
            let inv = 1.0 / counts[c] as f64;
            for i in 0..dim {
                mean[i] = sums[c * dim + i] * inv;
            }
        }
    }

    let mut prototypes = Vec::with_capacity(per_class * num_classes * dim);
    for slot in 0..per_class {
        for c in 0..num_classes {
            let mean = &means[c * dim..(c + 1) * dim];
            if slot == 0 {
                prototypes.extend_from_slice(mean);
            } else {
                prototypes.extend(
                    mean.iter()
                        .map(|&m| m + rng.gen_range(-PERTURBATION..PERTURBATION)),
                );
            }
        }
    }
    prototypes
}
