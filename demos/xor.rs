use rust_bpnn::{
    Dataset, Metric, NetworkBuilder, NetworkObserver, Shuffle, TrainConfig, TrainContext, Trainer,
};

/// Prints every hundredth epoch.
struct Progress;

impl NetworkObserver for Progress {
    fn epoch_progress(&mut self, epoch: usize, error: f64, target: f64) {
        if epoch % 100 == 0 {
            println!("epoch {epoch:>5}: error {error:.6} (target {target})");
        }
    }
}

fn main() -> rust_bpnn::Result<()> {
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let data = Dataset::from_rows(&xs, &ys)?;

    let mut network = NetworkBuilder::new(&[2, 3, 1])?.build_with_seed(0);
    let ctx = TrainContext::new(TrainConfig {
        max_epochs: 5000,
        target_mse: 1e-4,
        learning_rate: 0.7,
        momentum: 0.9,
        shuffle: Shuffle::Seeded(0),
        ..TrainConfig::default()
    });

    let mut trainer = Trainer::new();
    trainer.subscribe(Box::new(Progress));
    let report = trainer.train(&mut network, &data, &ctx)?;
    println!(
        "{:?} after {} epochs, error {:.6}",
        report.outcome, report.epochs, report.final_error
    );

    let validation = trainer.validate(&mut network, &data, &ctx)?;
    for r in &validation.results {
        println!("pattern {}: target {:?} output {:.4}", r.pattern, r.target, r.output[0]);
    }
    if let Some(acc) = Metric::BinaryAccuracy.evaluate(&validation.results) {
        println!("accuracy: {acc:.2}");
    }
    Ok(())
}
