#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load --features serde");
}

#[cfg(feature = "serde")]
fn main() -> nn_lvq::Result<()> {
    use nn_lvq::{Dataset, Network, NetworkBuilder, TrainConfig};
    use rand::SeedableRng;

    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let train = Dataset::from_class_rows(&xs, &[0, 1, 1, 0], 2)?;

    let mut net = NetworkBuilder::new(&[2, 3, 2])?
        .regularization("L2")?
        .build_with_seed(0)?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    net.train(
        &train,
        None,
        &TrainConfig {
            epochs: 200,
            batch_size: 4,
            ..TrainConfig::default()
        },
        &mut rng,
    )?;

    // YAML by default; a `.json` extension switches to JSON.
    for path in ["target/tmp_network.yaml", "target/tmp_network.json"] {
        net.save(path)?;
        let loaded = Network::load(path)?;
        assert_eq!(loaded.feedforward(&xs[1])?, net.feedforward(&xs[1])?);
        println!("saved and loaded model: {path}");
    }
    Ok(())
}
