//! Conservative reduced basis experiment on the SPE10 channel problem.

use clap::Parser;
use conservative_rb::{config::ExperimentConfig, experiment::run_experiment};

use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Args {
  /// Uniform refinements of the 100x20 base grid.
  #[arg(long, default_value_t = 1)]
  refinements: usize,

  /// Uniform refinements of the reference grid.
  #[arg(long, default_value_t = 3)]
  reference_refinements: usize,

  #[arg(long, default_value_t = 100)]
  training_set_size: usize,

  #[arg(long, default_value_t = 1)]
  max_extensions: usize,

  #[arg(long)]
  greedy_atol: Option<f64>,

  #[arg(long, default_value_t = 3)]
  num_test_parameters: usize,

  /// SPE10 model 1 permeability file; the identity tensor is used if omitted.
  #[arg(long, value_name = "FILE")]
  permeability: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let config = ExperimentConfig {
    refinements: args.refinements,
    reference_refinements: args.reference_refinements,
    training_set_size: args.training_set_size,
    max_extensions: args.max_extensions,
    greedy_atol: args.greedy_atol,
    num_test_parameters: args.num_test_parameters,
    permeability_file: args.permeability,
    ..Default::default()
  };

  let report = run_experiment(&config)?;

  println!("{:>12} {:>12} {:>12} {:>12}", "mu", "eta", "error", "efficiency");
  for test in &report.tests {
    println!(
      "{:>12} {:>12.4e} {:>12.4e} {:>12.4}",
      test.mu.to_string(),
      test.estimate.eta,
      test.error,
      test.efficiency
    );
  }
  Ok(())
}
