use crate::{
  error::{Error, Result},
  fe::DEFAULT_PENALTY,
  function::{DiffusionTensor, Spe10Model1},
  problems::spe10,
};

use std::path::PathBuf;

/// Settings of the conservative reduced basis experiment.
///
/// The defaults reproduce the published setup.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
  /// Uniform red refinements of the `100 x 20` base grid.
  ///
  /// One red refinement halves the mesh width, as do two conforming bisection refinements,
  /// so the default of 1 corresponds to the 2 bisection refinements of the published runs.
  pub refinements: usize,
  /// Uniform red refinements of the reference grid, must exceed `refinements`.
  ///
  /// The default of 3 corresponds to the `2 + 2 * 2` bisection refinements of the published runs.
  pub reference_refinements: usize,
  /// Interior penalty parameter.
  pub penalty: f64,
  pub training_set_size: usize,
  pub max_extensions: usize,
  /// Greedy stops early once the maximum estimated error falls below.
  pub greedy_atol: Option<f64>,
  pub num_test_parameters: usize,
  /// $bar(mu)$, defining the energy norm.
  pub mu_bar: f64,
  /// $hat(mu)$, weighting the flux estimators.
  pub mu_hat: f64,
  /// SPE10 model 1 permeability; constant identity tensor if absent.
  pub permeability_file: Option<PathBuf>,
  pub permeability_bounds: (f64, f64),
}

impl Default for ExperimentConfig {
  fn default() -> Self {
    Self {
      refinements: 1,
      reference_refinements: 3,
      penalty: DEFAULT_PENALTY,
      training_set_size: 100,
      max_extensions: 1,
      greedy_atol: None,
      num_test_parameters: 3,
      mu_bar: 0.1,
      mu_hat: 0.1,
      permeability_file: None,
      permeability_bounds: (1e-3, 998.915),
    }
  }
}

/// Every refinement multiplies the number of cells by 4.
pub const MAX_REFINEMENTS: usize = 8;

impl ExperimentConfig {
  pub fn validate(&self) -> Result<()> {
    if self.reference_refinements > MAX_REFINEMENTS {
      return Err(Error::Config(format!(
        "at most {MAX_REFINEMENTS} refinements are supported, got {}",
        self.reference_refinements
      )));
    }
    if self.reference_refinements <= self.refinements {
      return Err(Error::Config(format!(
        "reference grid ({} refinements) must be finer than the grid ({} refinements)",
        self.reference_refinements, self.refinements
      )));
    }
    if !(self.penalty > 0.0) {
      return Err(Error::Config(format!("penalty must be positive, got {}", self.penalty)));
    }
    if self.training_set_size == 0 {
      return Err(Error::Config("training set must not be empty".to_string()));
    }
    if self.num_test_parameters == 0 {
      return Err(Error::Config("at least one test parameter is required".to_string()));
    }
    if let Some(atol) = self.greedy_atol {
      if !(atol >= 0.0) {
        return Err(Error::Config(format!("greedy tolerance must be non-negative, got {atol}")));
      }
    }
    let (min, max) = spe10::PARAMETER_RANGE;
    for (name, value) in [("mu_bar", self.mu_bar), ("mu_hat", self.mu_hat)] {
      if !(min <= value && value <= max) {
        return Err(Error::Config(format!("{name} = {value} lies outside of [{min}, {max}]")));
      }
    }
    Ok(())
  }

  pub fn diffusion_tensor(&self) -> Result<DiffusionTensor> {
    match &self.permeability_file {
      Some(path) => {
        let (min, max) = self.permeability_bounds;
        Ok(DiffusionTensor::Spe10Model1(Spe10Model1::from_file(path, min, max)?))
      }
      None => Ok(DiffusionTensor::default()),
    }
  }
}
