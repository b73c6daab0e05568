use rust_bpnn::{
    Dataset, Network, NetworkBuilder, Shuffle, TrainConfig, TrainContext, TrainOutcome,
    TrainReport, Trainer,
};

fn xor() -> Dataset {
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    Dataset::from_rows(&xs, &ys).unwrap()
}

fn run(seed: u64, shuffle: Shuffle) -> (TrainReport, Network) {
    let mut network = NetworkBuilder::new(&[2, 2, 1]).unwrap().build_with_seed(seed);
    let ctx = TrainContext::new(TrainConfig {
        max_epochs: 500,
        target_mse: 1e-3,
        learning_rate: 0.7,
        momentum: 0.9,
        shuffle,
        ..TrainConfig::default()
    });
    let report = Trainer::new().train(&mut network, &xor(), &ctx).unwrap();
    (report, network)
}

#[test]
fn xor_training_is_reproducible_for_a_seed() {
    for shuffle in [Shuffle::None, Shuffle::Seeded(3)] {
        let (a, net_a) = run(42, shuffle);
        let (b, net_b) = run(42, shuffle);
        assert_eq!(a, b);
        assert_eq!(net_a, net_b);

        assert!(matches!(
            a.outcome,
            TrainOutcome::Converged | TrainOutcome::EpochLimitReached
        ));
        assert!(a.epochs <= 501);
        if a.converged() {
            assert!(a.final_error < 1e-3);
        } else {
            assert_eq!(a.epochs, 501);
        }
    }
}

#[test]
fn different_weight_seeds_train_differently() {
    let (_, a) = run(1, Shuffle::None);
    let (_, b) = run(2, Shuffle::None);
    assert_ne!(a.weights(), b.weights());
}

#[test]
fn training_changes_weights_and_validation_does_not() {
    let mut network = NetworkBuilder::new(&[2, 2, 1]).unwrap().build_with_seed(7);
    let initial = network.weights();
    let data = xor();
    let ctx = TrainContext::new(TrainConfig {
        max_epochs: 10,
        target_mse: 0.0,
        ..TrainConfig::default()
    });

    let mut trainer = Trainer::new();
    let report = trainer.train(&mut network, &data, &ctx).unwrap();
    assert_eq!(report.outcome, TrainOutcome::EpochLimitReached);
    assert_eq!(report.epochs, 11);
    let trained = network.weights();
    assert_ne!(trained, initial);

    let validation = trainer.validate(&mut network, &data, &ctx).unwrap();
    assert_eq!(validation.results.len(), 4);
    assert_eq!(network.weights(), trained);
    for r in &validation.results {
        assert_eq!(r.output.len(), 1);
        assert!(r.output[0] > 0.0 && r.output[0] < 1.0);
    }
}

#[test]
fn trainer_is_reusable_across_runs() {
    let data = xor();
    let ctx = TrainContext::new(TrainConfig {
        max_epochs: 5,
        target_mse: 0.0,
        ..TrainConfig::default()
    });

    let mut trainer = Trainer::new();
    let mut first = NetworkBuilder::new(&[2, 2, 1]).unwrap().build_with_seed(9);
    let mut second = first.clone();
    let a = trainer.train(&mut first, &data, &ctx).unwrap();
    let b = trainer.train(&mut second, &data, &ctx).unwrap();
    assert_eq!(a, b);
    assert_eq!(first, second);
}
