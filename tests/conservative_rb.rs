//! The full experiment pipeline on a coarsened channel problem.

use conservative_rb::{
  config::ExperimentConfig,
  experiment::{run_experiment_on, ExperimentReport},
  function::DiffusionTensor,
  problems::spe10,
};

fn coarse_run(mu_bar: f64) -> ExperimentReport {
  let mut problem = spe10::problem(DiffusionTensor::default()).unwrap();
  problem.num_elements = [50, 10];
  let config = ExperimentConfig {
    refinements: 0,
    reference_refinements: 1,
    training_set_size: 5,
    max_extensions: 1,
    num_test_parameters: 3,
    mu_bar,
    ..Default::default()
  };
  run_experiment_on(&problem, &config).unwrap()
}

fn assert_conservative(report: &ExperimentReport) {
  assert_eq!(report.tests.len(), 3);
  for test in &report.tests {
    println!(
      "mu = {}: eta = {:.3e}, error = {:.3e}, efficiency = {:.2}, conservation {:.3e} -> {:.3e}",
      test.mu,
      test.estimate.eta,
      test.error,
      test.efficiency,
      test.conservation_error_t_rb,
      test.conservation_error_t_rb_f
    );
    assert!(test.conservation_error_t_rb_f < 1e-6, "mu = {}", test.mu);
    assert!(test.estimate.eta > 0.0);
    assert!(test.error > 0.0);
    assert!(test.efficiency > 1.0, "mu = {}", test.mu);
    assert!(test.relative_flux_error.is_finite());
  }

  // away from the snapshot the reconstructed flux violates conservation until projected
  let last = &report.tests[2];
  assert!((last.mu.get(spe10::PARAMETER).unwrap() - 1.0).abs() < 1e-12);
  assert!(last.conservation_error_t_rb > 1e3 * last.conservation_error_t_rb_f);
}

#[test]
fn snapshot_at_energy_parameter_leaves_flux_basis_empty() {
  let report = coarse_run(0.1);
  assert_eq!(report.num_elements, 2 * 50 * 10);
  assert_eq!(report.num_dofs, 3 * report.num_elements);
  assert_eq!(report.reference_num_elements, 4 * report.num_elements);
  assert_eq!(report.pressure_basis_size, 1);
  assert_eq!(report.greedy_mus, vec![spe10::parameter(0.1)]);
  // the only flux snapshot coincides with the affine shift
  assert_eq!(report.flux_basis_size, 0);

  let table4 = &report.table4_estimate;
  assert!(table4.eta.is_finite() && table4.eta > 0.0);
  assert!(table4.eta_r.abs() < 1e-6);

  assert_conservative(&report);

  // the snapshot parameter is reproduced exactly
  let first = &report.tests[0];
  assert_eq!(first.mu, spe10::parameter(0.1));
  assert!(first.relative_flux_error < 1e-6);
}

#[test]
fn locally_conservative_reduced_fluxes() {
  let report = coarse_run(0.325);
  assert_eq!(report.pressure_basis_size, 1);
  assert_eq!(report.greedy_mus, vec![spe10::parameter(0.1)]);
  assert_eq!(report.flux_basis_size, 1);

  assert_conservative(&report);

  let first = &report.tests[0];
  assert_eq!(first.mu, spe10::parameter(0.1));
  assert!(first.relative_flux_error < 1e-6);
}
