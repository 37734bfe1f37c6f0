//! The conservative reduced basis experiment on the SPE10 channel problem.
//!
//! A pressure reduced basis is built by a greedy search with few extensions. Fluxes
//! reconstructed from reduced pressures are projected onto a reduced basis of divergence
//! free fluxes shifted by a particular solution, which restores local conservation.
//! The reduced solutions are then certified with the guaranteed estimator and compared
//! against a solution on a finer reference grid.

use crate::{
  assemble::{assemble_energy_semi_product_matrix, assemble_hdiv_product_matrix, assemble_swipdg_matrix},
  config::ExperimentConfig,
  error::Result,
  estimate::{compute_estimate, AffineConstants, Estimate, EstimatorDiffusions},
  flux::{compute_flux_reconstruction, compute_local_conservation_error},
  greedy::greedy,
  linalg::{gram_schmidt, GramSchmidtOptions},
  model::{discretize, Discretization},
  operator::MatrixOperator,
  parameter::{Parameter, ParameterFunctional},
  problems::{spe10, AffineDiffusionProblem},
  reductor::CoerciveRbReductor,
  space::{prolong, RtSpace},
};

use tracing::info;

/// Flux snapshots below this fraction of the flux norm are discarded.
pub const FLUX_SNAPSHOT_RTOL: f64 = 1e-10;

/// Outcome for a single test parameter.
#[derive(Debug, Clone)]
pub struct TestResult {
  pub mu: Parameter,
  pub estimate: Estimate,
  /// Energy error at $bar(mu)$ against the reference solution.
  pub error: f64,
  pub efficiency: f64,
  /// Of the flux reconstructed from the reduced pressure.
  pub conservation_error_t_rb: f64,
  /// Of the flux after projection onto the shifted reduced flux space.
  pub conservation_error_t_rb_f: f64,
  /// $H(div)$ distance to the flux of the full order solution, relative.
  pub relative_flux_error: f64,
}

#[derive(Debug, Clone)]
pub struct ExperimentReport {
  pub num_elements: usize,
  pub num_dofs: usize,
  pub reference_num_elements: usize,
  pub reference_num_dofs: usize,
  /// Estimate of the full order solution at the largest parameter.
  pub table4_estimate: Estimate,
  pub greedy_max_errs: Vec<f64>,
  pub greedy_mus: Vec<Parameter>,
  pub pressure_basis_size: usize,
  pub flux_basis_size: usize,
  pub tests: Vec<TestResult>,
}

pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentReport> {
  config.validate()?;
  let problem = spe10::problem(config.diffusion_tensor()?)?;
  run_experiment_on(&problem, config)
}

/// Runs the experiment for a variant of the SPE10 channel problem, e.g. on a coarser base grid.
pub fn run_experiment_on(problem: &AffineDiffusionProblem, config: &ExperimentConfig) -> Result<ExperimentReport> {
  config.validate()?;
  let penalty = config.penalty;
  let mu_bar = spe10::parameter(config.mu_bar);
  let mu_hat = spe10::parameter(config.mu_hat);

  info!("discretizing ...");
  let Discretization {
    grid,
    dg_space,
    dg_product,
    fom,
  } = discretize(problem, &mu_bar, penalty, config.refinements)?;
  info!(
    "grid has {} elements, mesh width {:.3e}",
    grid.num_elements(),
    dg_space.mesh().mesh_width()
  );
  info!("space has {} DoFs", dg_space.num_dofs());
  info!("");

  info!("computing reference discretization ...");
  let reference = discretize(problem, &mu_bar, penalty, config.reference_refinements)?;
  let reference_energy_product = {
    let diffusion_bar = problem.diffusion(reference.dg_space.mesh(), &mu_bar)?;
    MatrixOperator::new(assemble_energy_semi_product_matrix(
      &reference.dg_space,
      &diffusion_bar,
    ))
  };
  info!(
    "reference grid has {} elements, space has {} DoFs",
    reference.grid.num_elements(),
    reference.dg_space.num_dofs()
  );
  info!("");

  info!("assembling Hdiv product ...");
  let rt_space = RtSpace::new(grid.triangulation().clone());
  let rt_product = MatrixOperator::new(assemble_hdiv_product_matrix(&rt_space));
  info!("");

  let mesh = dg_space.mesh();
  let diffusion_bar = problem.diffusion(mesh, &mu_bar)?;
  let diffusion_hat = problem.diffusion(mesh, &mu_hat)?;

  info!("computing affine shift pressure and flux ...");
  let u_h_f = MatrixOperator::new(assemble_swipdg_matrix(&dg_space, &diffusion_bar, penalty))
    .apply_inverse(fom.rhs())?;
  let t_h_f = compute_flux_reconstruction(&dg_space, &rt_space, &diffusion_bar, penalty, &u_h_f)?;
  info!("");

  info!("computing [OS2015, table 4] estimates ...");
  let table4_estimate = {
    let diffusion_max = problem.diffusion(mesh, &spe10::parameter(spe10::PARAMETER_RANGE.1))?;
    let u_h = MatrixOperator::new(assemble_swipdg_matrix(&dg_space, &diffusion_max, penalty))
      .apply_inverse(fom.rhs())?;
    let t_h = compute_flux_reconstruction(&dg_space, &rt_space, &diffusion_max, penalty, &u_h)?;
    let diffusions = EstimatorDiffusions {
      mu: &diffusion_max,
      bar: &diffusion_max,
      hat: &diffusion_max,
    };
    compute_estimate(
      &dg_space,
      &rt_space,
      &u_h,
      &t_h,
      &problem.force,
      diffusions,
      AffineConstants::unit(),
    )?
  };
  info!(
    "    are {:e}, {:e}, {:e}",
    table4_estimate.eta_nc, table4_estimate.eta_r, table4_estimate.eta_df
  );
  info!("");

  info!(
    "building pressure RB (simulating intermediate greedy step by max_extensions={}) ...",
    config.max_extensions
  );
  let mut reductor = CoerciveRbReductor::new(
    &fom,
    dg_product,
    ParameterFunctional::projection(spe10::PARAMETER),
  )?;
  let training_set = fom.parameter_space().sample_uniformly(config.training_set_size);
  let greedy_data = greedy(
    &fom,
    &mut reductor,
    &training_set,
    Some(config.max_extensions),
    config.greedy_atol,
  )?;
  let rom = &greedy_data.rom;
  info!("");

  info!("building Hdiv_0 RB ...");
  let mut flux_snapshots = Vec::new();
  for mu in &greedy_data.max_err_mus {
    let u_h = fom.solve(mu)?;
    let diffusion_mu = problem.diffusion(mesh, mu)?;
    let t_h = compute_flux_reconstruction(&dg_space, &rt_space, &diffusion_mu, penalty, &u_h)?;
    let snapshot = &t_h - &t_h_f;
    // at mu_bar the snapshot is rounding noise, which is not divergence free
    let snapshot_norm = rt_product.induced_norm(&snapshot)?;
    let flux_norm = rt_product.induced_norm(&t_h)?;
    if snapshot_norm <= FLUX_SNAPSHOT_RTOL * flux_norm {
      info!("  dropping flux snapshot for mu = {mu} (relative norm {:.3e})", snapshot_norm / flux_norm);
      continue;
    }
    flux_snapshots.push(snapshot);
  }
  let flux_basis = if flux_snapshots.is_empty() {
    na::DMatrix::zeros(rt_space.num_dofs(), 0)
  } else {
    gram_schmidt(
      &na::DMatrix::from_columns(&flux_snapshots),
      Some(&rt_product),
      GramSchmidtOptions::default(),
    )?
  };
  info!("Hdiv_0 RB has size {}", flux_basis.ncols());
  info!("");

  info!("testing for some parameters ...");
  let mut tests = Vec::new();
  for mu in fom.parameter_space().sample_uniformly(config.num_test_parameters) {
    info!("  mu = {mu}");
    let u_rb = reductor.reconstruct(&rom.solve(&mu)?)?;
    let diffusion_mu = problem.diffusion(mesh, &mu)?;
    let t_rb = compute_flux_reconstruction(&dg_space, &rt_space, &diffusion_mu, penalty, &u_rb)?;
    let conservation_error_t_rb = compute_local_conservation_error(&rt_space, &t_rb, &problem.force)?;
    info!("    conservation_error(t_RB):   {conservation_error_t_rb:e}");

    // the flux basis is orthonormal in the Hdiv product
    let t_rb_f = if flux_basis.ncols() == 0 {
      t_h_f.clone()
    } else {
      let coefficients = flux_basis.transpose() * rt_product.apply(&(&t_rb - &t_h_f))?;
      &flux_basis * coefficients + &t_h_f
    };
    let conservation_error_t_rb_f = compute_local_conservation_error(&rt_space, &t_rb_f, &problem.force)?;
    info!("    conservation_error(t_RB_f): {conservation_error_t_rb_f:e}");

    let relative_flux_error = {
      let u_h = fom.solve(&mu)?;
      let t_h = compute_flux_reconstruction(&dg_space, &rt_space, &diffusion_mu, penalty, &u_h)?;
      rt_product.induced_norm(&(&t_h - &t_rb_f))? / rt_product.induced_norm(&t_h)?
    };
    info!("    relative flux reconstruction error: {relative_flux_error:e}");

    info!("    estimating error ...");
    let diffusions = EstimatorDiffusions {
      mu: &diffusion_mu,
      bar: &diffusion_bar,
      hat: &diffusion_hat,
    };
    let constants = AffineConstants {
      alpha_mu_mubar: problem.alpha(&mu, &mu_bar)?,
      alpha_mu_muhat: problem.alpha(&mu, &mu_hat)?,
      gamma_mu_mubar: problem.gamma(&mu, &mu_bar)?,
    };
    let estimate = compute_estimate(
      &dg_space,
      &rt_space,
      &u_rb,
      &t_rb_f,
      &problem.force,
      diffusions,
      constants,
    )?;
    info!("      eta_NC = {:e}", estimate.eta_nc);
    info!("      eta_R  = {:e}", estimate.eta_r);
    info!("      eta_DF = {:e}", estimate.eta_df);
    info!("      eta    = {:e}", estimate.eta);

    info!("    computing error by reference solution ...");
    let u_rb_on_reference = prolong(&grid, &dg_space, &u_rb, &reference.dg_space)?;
    let u_h_reference = reference.fom.solve(&mu)?;
    let error = reference_energy_product.induced_norm(&(u_h_reference - u_rb_on_reference))?;
    let efficiency = estimate.eta / error;
    info!("      error  = {error:e}");
    info!("   => efficiency = {efficiency}");

    tests.push(TestResult {
      mu,
      estimate,
      error,
      efficiency,
      conservation_error_t_rb,
      conservation_error_t_rb_f,
      relative_flux_error,
    });
  }

  Ok(ExperimentReport {
    num_elements: grid.num_elements(),
    num_dofs: dg_space.num_dofs(),
    reference_num_elements: reference.grid.num_elements(),
    reference_num_dofs: reference.dg_space.num_dofs(),
    table4_estimate,
    greedy_max_errs: greedy_data.max_errs.clone(),
    greedy_mus: greedy_data.max_err_mus.clone(),
    pressure_basis_size: reductor.basis_size(),
    flux_basis_size: flux_basis.ncols(),
    tests,
  })
}
