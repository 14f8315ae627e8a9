use nn_lvq::{Classifier, Dataset, Monitoring, NetworkBuilder, TrainConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> nn_lvq::Result<()> {
    tracing_subscriber::fmt::init();

    // Classic XOR dataset, one-hot over two classes.
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let train = Dataset::from_class_rows(&xs, &[0, 1, 1, 0], 2)?;

    // 2 -> 4 -> 2 sigmoid network with the cross-entropy cost.
    let mut net = NetworkBuilder::new(&[2, 4, 2])?
        .cost("cross-entropy")?
        .learning_rate(2.0)?
        .build_with_seed(0)?;
    println!("{net}");

    let mut rng = StdRng::seed_from_u64(0);
    let report = net.train(
        &train,
        None,
        &TrainConfig {
            epochs: 2_000,
            batch_size: 2,
            monitoring: Monitoring::from_flags([("cost", true)])?,
            early_stop_patience: None,
        },
        &mut rng,
    )?;

    let final_cost = report.history.train_cost.last().copied().unwrap_or(f64::NAN);
    println!(
        "epochs={} final_cost={final_cost:.5} elapsed={:?}",
        report.outcome.epochs_run(),
        report.elapsed
    );

    for x in &xs {
        let out = net.feedforward(x)?;
        println!("x={x:?} y={out:.3?} class={}", net.predict_class(x)?);
    }
    println!("{}", net.confusion(&train)?);

    Ok(())
}
