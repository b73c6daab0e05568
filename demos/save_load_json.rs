#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> rust_bpnn::Result<()> {
    use rust_bpnn::{Network, NetworkBuilder, NeuronId, Shuffle, TrainConfig, TrainContext, Trainer};

    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let train = rust_bpnn::Dataset::from_rows(&xs, &ys)?;

    let mut network = NetworkBuilder::new(&[2, 3, 1])?.build_with_seed(0);
    network.set_bias(NeuronId::hidden(1, 2), true)?;

    let ctx = TrainContext::new(TrainConfig {
        max_epochs: 200,
        target_mse: 1e-3,
        shuffle: Shuffle::Seeded(0),
        ..TrainConfig::default()
    });
    Trainer::new().train(&mut network, &train, &ctx)?;

    let path = "target/tmp_network.json";
    network.save_json(path)?;

    let loaded = Network::load_json(path)?;
    assert_eq!(loaded.weights(), network.weights());
    println!("saved and loaded network: {path}");
    Ok(())
}
