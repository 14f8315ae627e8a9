use nn_lvq::{
    Classifier, Dataset, Distance, Lvq, LvqConfig, LvqTrainConfig, ModelState, TrainOutcome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Three well-separated clusters in the plane.
fn clusters(n_per_class: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers = [[0.0, 0.0], [5.0, 0.0], [0.0, 5.0]];
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (class, c) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            xs.push(vec![
                c[0] + rng.gen_range(-0.5..0.5),
                c[1] + rng.gen_range(-0.5..0.5),
            ]);
            ys.push(class);
        }
    }
    Dataset::from_class_rows(&xs, &ys, 3).unwrap()
}

#[test]
fn early_stop_ends_on_first_epoch_below_threshold() {
    let train = clusters(20, 1);
    let validation = clusters(10, 2);
    let mut lvq = Lvq::new(LvqConfig::new(2, 3)).unwrap();
    let cfg = LvqTrainConfig {
        eta: 0.1,
        epochs: 25,
        eta_decay: false,
        early_stop: true,
    };
    let mut rng = StdRng::seed_from_u64(0);
    let report = lvq.train(&train, Some(&validation), &cfg, &mut rng).unwrap();

    // Class means already separate the clusters, so the first epoch is enough.
    assert_eq!(report.outcome, TrainOutcome::StoppedEarly { epoch: 1 });
    assert_eq!(report.train_error.len(), 1);
    assert_eq!(report.validation_error.len(), 1);
    assert!(report.validation_error[0] < 0.01);
    assert_eq!(lvq.state(), ModelState::Trained);
}

#[test]
fn early_stop_waits_for_validation_error_to_drop() {
    // One-dimensional: class 0 sits at 0, class 1 trains toward 2 from a far
    // start, so its prototype walks 3.0 -> 2.9 -> 2.81 -> 2.729.
    let train = Dataset::from_class_rows(&[vec![0.0], vec![2.0]], &[0, 1], 2).unwrap();
    // 1.4 is closer to class 0's prototype until class 1's drops below 2.8.
    let validation = Dataset::from_class_rows(&[vec![0.0], vec![1.4]], &[0, 1], 2).unwrap();
    let mut lvq = Lvq::from_prototypes(LvqConfig::new(1, 2), &[vec![0.0], vec![3.0]]).unwrap();
    let cfg = LvqTrainConfig {
        eta: 0.1,
        epochs: 10,
        eta_decay: false,
        early_stop: true,
    };
    let mut rng = StdRng::seed_from_u64(0);
    let report = lvq.train(&train, Some(&validation), &cfg, &mut rng).unwrap();

    assert_eq!(report.outcome, TrainOutcome::StoppedEarly { epoch: 3 });
    assert_eq!(report.train_error.len(), 3);
    assert_eq!(report.validation_error.len(), 3);
    assert!(report.validation_error[..2].iter().all(|&e| e >= 0.01));
    assert!(report.validation_error[2] < 0.01);
    assert!((lvq.prototype(1, 0).unwrap()[0] - 2.729).abs() < 1e-12);
}

#[test]
fn without_early_stop_all_epochs_run() {
    let train = clusters(10, 3);
    let validation = clusters(5, 4);
    let mut lvq = Lvq::new(LvqConfig {
        prototypes_per_class: 2,
        distance: Distance::Manhattan,
        ..LvqConfig::new(2, 3)
    })
    .unwrap();
    let cfg = LvqTrainConfig {
        eta: 0.05,
        epochs: 6,
        eta_decay: true,
        early_stop: false,
    };
    let mut rng = StdRng::seed_from_u64(1);
    let report = lvq.train(&train, Some(&validation), &cfg, &mut rng).unwrap();

    assert_eq!(report.outcome, TrainOutcome::Completed { epochs: 6 });
    assert_eq!(report.train_error.len(), 6);
    assert_eq!(report.validation_error.len(), 6);
    assert_eq!(lvq.prototypes().len(), 3 * 2 * 2);
    assert!(lvq.eval_error_rate(&validation).unwrap() < 0.2);
}

#[test]
fn classification_is_deterministic() {
    let train = clusters(10, 5);
    let mut lvq = Lvq::new(LvqConfig::new(2, 3)).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    lvq.train(&train, None, &LvqTrainConfig::default(), &mut rng)
        .unwrap();

    for (x, _) in train.iter() {
        assert_eq!(lvq.classify(x).unwrap(), lvq.classify(x).unwrap());
    }
}

#[test]
fn same_seed_same_prototypes() {
    let train = clusters(10, 6);
    let config = LvqConfig {
        prototypes_per_class: 3,
        ..LvqConfig::new(2, 3)
    };
    let cfg = LvqTrainConfig::default();

    let mut a = Lvq::new(config).unwrap();
    let mut b = Lvq::new(config).unwrap();
    a.train(&train, None, &cfg, &mut StdRng::seed_from_u64(8)).unwrap();
    b.train(&train, None, &cfg, &mut StdRng::seed_from_u64(8)).unwrap();
    assert_eq!(a.prototypes(), b.prototypes());
}

#[test]
fn confusion_matches_dataset() {
    let data = clusters(8, 7);
    let mut lvq = Lvq::new(LvqConfig::new(2, 3)).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    lvq.train(&data, None, &LvqTrainConfig::default(), &mut rng)
        .unwrap();

    let m = lvq.confusion(&data).unwrap();
    for (class, count) in data.class_counts().into_iter().enumerate() {
        assert_eq!(m.row_sum(class), count);
    }
    let accuracy = lvq.eval_accuracy(&data).unwrap() as f64 / data.len() as f64;
    assert!((m.trace() as f64 / data.len() as f64 - accuracy).abs() < 1e-12);
}

#[test]
fn dimension_errors_leave_model_uninitialized() {
    let data = clusters(4, 9);
    let mut lvq = Lvq::new(LvqConfig::new(3, 3)).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(
        lvq.train(&data, None, &LvqTrainConfig::default(), &mut rng)
            .is_err()
    );
    assert_eq!(lvq.state(), ModelState::Uninitialized);
    assert!(lvq.prototypes().is_empty());
}
