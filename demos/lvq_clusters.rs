use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use nn_lvq::{Classifier, Dataset, Lvq, LvqConfig, LvqTrainConfig};

fn blobs(rng: &mut StdRng, n_per_class: usize) -> nn_lvq::Result<Dataset> {
    let centers = [[-1.0, -1.0], [1.0, -1.0], [0.0, 1.0]];
    let mut xs = Vec::with_capacity(3 * n_per_class);
    let mut ys = Vec::with_capacity(3 * n_per_class);

    for (class, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            xs.push(vec![
                center[0] + rng.gen_range(-0.6..0.6),
                center[1] + rng.gen_range(-0.6..0.6),
            ]);
            ys.push(class);
        }
    }
    Dataset::from_class_rows(&xs, &ys, 3)
}

fn main() -> nn_lvq::Result<()> {
    tracing_subscriber::fmt::init();

    let mut rng = StdRng::seed_from_u64(0);
    let train = blobs(&mut rng, 128)?;
    let validation = blobs(&mut rng, 32)?;

    let mut lvq = Lvq::new(LvqConfig {
        prototypes_per_class: 2,
        ..LvqConfig::new(2, 3)
    })?;

    let report = lvq.train(
        &train,
        Some(&validation),
        &LvqTrainConfig {
            eta: 0.05,
            epochs: 30,
            eta_decay: true,
            early_stop: true,
        },
        &mut rng,
    )?;
    println!("{lvq}");
    println!(
        "outcome={:?} final_eta={:.4} train_error={:?}",
        report.outcome,
        report.final_eta,
        report.train_error.last()
    );

    let confusion = lvq.confusion(&validation)?;
    println!("validation accuracy={:.3}", confusion.accuracy());
    println!("{confusion}");

    Ok(())
}
