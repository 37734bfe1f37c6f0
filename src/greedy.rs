//! Weak greedy basis generation driven by the reduced error estimator.

use crate::{
  error::{Error, Result},
  model::StationaryModel,
  parameter::Parameter,
  reductor::{CoerciveRbReductor, ReducedModel},
};

use rayon::prelude::*;
use std::time::Instant;

pub struct GreedyData {
  pub rom: ReducedModel,
  /// Maximum estimated error over the training set, per iteration.
  pub max_errs: Vec<f64>,
  /// Where the maxima were attained.
  pub max_err_mus: Vec<Parameter>,
  pub extensions: usize,
}

/// Iteratively extends the basis of `reductor` by the full order solution at the training
/// parameter of largest estimated error.
///
/// Stops once the maximum error drops below `atol`, when an extension fails or after
/// `max_extensions` extensions.
pub fn greedy(
  fom: &StationaryModel,
  reductor: &mut CoerciveRbReductor,
  training_set: &[Parameter],
  max_extensions: Option<usize>,
  atol: Option<f64>,
) -> Result<GreedyData> {
  if training_set.is_empty() {
    return Err(Error::Config("greedy needs a non-empty training set".to_string()));
  }
  tracing::info!("started greedy search on training set of size {}", training_set.len());
  let timer = Instant::now();

  let mut max_errs = Vec::new();
  let mut max_err_mus = Vec::new();
  let mut extensions = 0;

  let rom = loop {
    tracing::info!("reducing ...");
    let rom = reductor.reduce()?;

    tracing::info!("estimating errors ...");
    let errors = training_set
      .par_iter()
      .map(|mu| rom.estimate(mu))
      .collect::<Result<Vec<f64>>>()?;
    let (imax, max_err) = errors
      .iter()
      .copied()
      .enumerate()
      .max_by(|(_, a), (_, b)| a.total_cmp(b))
      .expect("Training set is not empty.");
    let max_err_mu = training_set[imax].clone();
    tracing::info!("maximum error after {extensions} extensions: {max_err:.5e} (mu = {max_err_mu})");
    max_errs.push(max_err);
    max_err_mus.push(max_err_mu.clone());

    if let Some(atol) = atol {
      if max_err <= atol {
        tracing::info!("absolute error tolerance ({atol:.3e}) reached, stopping extension loop");
        break rom;
      }
    }

    tracing::info!("computing solution snapshot for mu = {max_err_mu} ...");
    let snapshot = fom.solve(&max_err_mu)?;
    tracing::info!("extending basis with solution snapshot ...");
    match reductor.extend_basis(&snapshot) {
      Ok(()) => {}
      Err(Error::Extension(reason)) => {
        tracing::info!("extension failed ({reason}), stopping now");
        break rom;
      }
      Err(e) => return Err(e),
    }
    extensions += 1;

    if let Some(max_extensions) = max_extensions {
      if extensions >= max_extensions {
        tracing::info!("maximum number of {max_extensions} extensions reached");
        tracing::info!("reducing once more ...");
        break reductor.reduce()?;
      }
    }
  };

  tracing::info!("greedy search took {:.2?}", timer.elapsed());
  Ok(GreedyData {
    rom,
    max_errs,
    max_err_mus,
    extensions,
  })
}

#[cfg(test)]
mod test {
  use super::greedy;
  use crate::{
    fe::DEFAULT_PENALTY,
    function::DiffusionTensor,
    model::{discretize, Discretization},
    parameter::ParameterFunctional,
    problems::spe10,
    reductor::CoerciveRbReductor,
  };

  fn small_discretization() -> Discretization {
    let mut problem = spe10::problem(DiffusionTensor::default()).unwrap();
    problem.num_elements = [25, 5];
    discretize(&problem, &spe10::parameter(0.1), DEFAULT_PENALTY, 0).unwrap()
  }

  #[test]
  fn single_extension_picks_smallest_parameter() {
    let discretization = small_discretization();
    let fom = &discretization.fom;
    let mut reductor = CoerciveRbReductor::new(
      fom,
      discretization.dg_product.clone(),
      ParameterFunctional::projection(spe10::PARAMETER),
    )
    .unwrap();
    let training_set = fom.parameter_space().sample_uniformly(10);

    let data = greedy(fom, &mut reductor, &training_set, Some(1), None).unwrap();
    assert_eq!(data.extensions, 1);
    assert_eq!(data.max_errs.len(), 1);
    assert_eq!(data.max_err_mus.len(), 1);
    assert_eq!(data.rom.dim(), 1);
    // empty basis: estimate is proportional to the inverse coercivity bound
    assert_eq!(data.max_err_mus[0], spe10::parameter(0.1));
  }

  #[test]
  fn errors_decrease_with_extensions() {
    let discretization = small_discretization();
    let fom = &discretization.fom;
    let mut reductor = CoerciveRbReductor::new(
      fom,
      discretization.dg_product.clone(),
      ParameterFunctional::projection(spe10::PARAMETER),
    )
    .unwrap();
    let training_set = fom.parameter_space().sample_uniformly(10);

    let data = greedy(fom, &mut reductor, &training_set, Some(3), None).unwrap();
    assert!(data.extensions <= 3);
    assert_eq!(data.max_errs.len(), data.extensions);
    assert!(data.max_errs.last().unwrap() < &data.max_errs[0]);

    // the tolerance is already met by the empty basis
    let mut reductor = CoerciveRbReductor::new(
      fom,
      discretization.dg_product.clone(),
      ParameterFunctional::projection(spe10::PARAMETER),
    )
    .unwrap();
    let atol = data.max_errs[0];
    let data = greedy(fom, &mut reductor, &training_set, None, Some(atol)).unwrap();
    assert_eq!(data.extensions, 0);
    assert_eq!(data.rom.dim(), 0);
  }

  #[test]
  fn stops_when_extension_fails() {
    let discretization = small_discretization();
    let fom = &discretization.fom;
    let mut reductor = CoerciveRbReductor::new(
      fom,
      discretization.dg_product.clone(),
      ParameterFunctional::projection(spe10::PARAMETER),
    )
    .unwrap();
    // the second snapshot repeats the first one
    let training_set = vec![spe10::parameter(0.4); 3];

    let data = greedy(fom, &mut reductor, &training_set, None, None).unwrap();
    assert_eq!(data.extensions, 1);
    assert_eq!(data.max_errs.len(), 2);
    assert_eq!(data.max_err_mus, vec![spe10::parameter(0.4); 2]);
    assert_eq!(reductor.basis_size(), 1);
    assert_eq!(data.rom.dim(), reductor.basis_size());
    assert!(data.max_errs[1] < 1e-6 * data.max_errs[0]);
  }

  #[test]
  fn empty_training_set_is_rejected() {
    let discretization = small_discretization();
    let fom = &discretization.fom;
    let mut reductor = CoerciveRbReductor::new(
      fom,
      discretization.dg_product.clone(),
      ParameterFunctional::projection(spe10::PARAMETER),
    )
    .unwrap();
    assert!(greedy(fom, &mut reductor, &[], Some(1), None).is_err());
  }
}
