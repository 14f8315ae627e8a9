use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use nn_lvq::{Dataset, Lvq, LvqConfig, LvqTrainConfig, Monitoring, NetworkBuilder, TrainConfig};

fn network_feedforward_bench(c: &mut Criterion) {
    let net = NetworkBuilder::new(&[128, 256, 256, 10])
        .and_then(|b| b.build_with_seed(0))
        .unwrap();
    let input = vec![0.1; net.input_size()];

    c.bench_function("network_feedforward_128_256_256_10", |b| {
        b.iter(|| {
            let out = net.feedforward(black_box(&input)).unwrap();
            black_box(out);
        })
    });
}

fn network_backpropagation_bench(c: &mut Criterion) {
    let net = NetworkBuilder::new(&[128, 256, 256, 10])
        .and_then(|b| b.build_with_seed(0))
        .unwrap();
    let input = vec![0.1; net.input_size()];
    let target = vec![0.0; net.output_size()];

    c.bench_function("network_backpropagation_128_256_256_10", |b| {
        b.iter(|| {
            let grads = net
                .backpropagation(black_box(&input), black_box(&target))
                .unwrap();
            black_box(grads);
        })
    });
}

fn network_epoch_bench(c: &mut Criterion) {
    let xs: Vec<Vec<f64>> = (0..256)
        .map(|i| vec![(i % 16) as f64 / 16.0, (i / 16) as f64 / 16.0])
        .collect();
    let ys: Vec<usize> = (0..256).map(|i| usize::from((i % 16) < (i / 16))).collect();
    let train = Dataset::from_class_rows(&xs, &ys, 2).unwrap();
    let mut net = NetworkBuilder::new(&[2, 16, 2])
        .and_then(|b| b.build_with_seed(0))
        .unwrap();
    let cfg = TrainConfig {
        epochs: 1,
        batch_size: 16,
        monitoring: Monitoring::none(),
        early_stop_patience: None,
    };
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("network_epoch_256x2_16_2", |b| {
        b.iter(|| {
            let report = net.train(&train, None, &cfg, &mut rng).unwrap();
            black_box(report);
        })
    });
}

fn lvq_epoch_bench(c: &mut Criterion) {
    let xs: Vec<Vec<f64>> = (0..512).map(|i| vec![(i % 32) as f64, (i / 32) as f64]).collect();
    let ys: Vec<usize> = (0..512).map(|i| (i % 32) / 8).collect();
    let train = Dataset::from_class_rows(&xs, &ys, 4).unwrap();
    let mut lvq = Lvq::new(LvqConfig {
        prototypes_per_class: 4,
        ..LvqConfig::new(2, 4)
    })
    .unwrap();
    let cfg = LvqTrainConfig {
        epochs: 1,
        early_stop: false,
        ..LvqTrainConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("lvq_epoch_512x2_4x4", |b| {
        b.iter(|| {
            let report = lvq.train(&train, None, &cfg, &mut rng).unwrap();
            black_box(report);
        })
    });
}

criterion_group!(
    benches,
    network_feedforward_bench,
    network_backpropagation_bench,
    network_epoch_bench,
    lvq_epoch_bench
);
criterion_main!(benches);
