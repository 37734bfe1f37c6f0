//! Parameters, parameter spaces and parameter functionals.

use crate::error::{Error, Result};

use indexmap::IndexMap;
use itertools::Itertools;

use std::fmt;

/// Named scalar parameter components, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
  values: IndexMap<String, f64>,
}

impl Parameter {
  pub fn new<S: Into<String>>(components: impl IntoIterator<Item = (S, f64)>) -> Self {
    let values = components
      .into_iter()
      .map(|(name, value)| (name.into(), value))
      .collect();
    Self { values }
  }

  pub fn scalar(name: impl Into<String>, value: f64) -> Self {
    Self::new([(name.into(), value)])
  }

  pub fn get(&self, name: &str) -> Result<f64> {
    self
      .values
      .get(name)
      .copied()
      .ok_or_else(|| Error::MissingParameter(name.to_string()))
  }

  pub fn components(&self) -> impl Iterator<Item = (&str, f64)> {
    self.values.iter().map(|(k, &v)| (k.as_str(), v))
  }
}

impl fmt::Display for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let inner = self
      .values
      .iter()
      .map(|(name, value)| format!("{name}: {value}"))
      .join(", ");
    write!(f, "{{{inner}}}")
  }
}

/// Axis-aligned box of admissible parameters.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
  ranges: IndexMap<String, (f64, f64)>,
}

impl ParameterSpace {
  /// The same range `[min, max]` for every component.
  pub fn cubic<S: Into<String>>(
    components: impl IntoIterator<Item = S>,
    min: f64,
    max: f64,
  ) -> Result<Self> {
    if !(min <= max) {
      return Err(Error::Config(format!(
        "invalid parameter range [{min}, {max}]"
      )));
    }
    let ranges = components
      .into_iter()
      .map(|name| (name.into(), (min, max)))
      .collect();
    Ok(Self { ranges })
  }

  pub fn ranges(&self) -> &IndexMap<String, (f64, f64)> {
    &self.ranges
  }

  pub fn contains(&self, mu: &Parameter) -> bool {
    self.ranges.iter().all(|(name, &(min, max))| {
      mu.get(name)
        .map(|value| min <= value && value <= max)
        .unwrap_or(false)
    })
  }

  pub fn check(&self, mu: &Parameter) -> Result<()> {
    if self.contains(mu) {
      Ok(())
    } else {
      Err(Error::ParameterOutOfRange(mu.to_string()))
    }
  }

  /// Tensor product of `num_samples` equidistant points per component, end points included.
  pub fn sample_uniformly(&self, num_samples: usize) -> Vec<Parameter> {
    let axes: Vec<Vec<(String, f64)>> = self
      .ranges
      .iter()
      .map(|(name, &(min, max))| {
        linspace(min, max, num_samples)
          .into_iter()
          .map(|v| (name.clone(), v))
          .collect()
      })
      .collect();
    axes
      .into_iter()
      .multi_cartesian_product()
      .map(Parameter::new)
      .collect()
  }
}

pub fn linspace(min: f64, max: f64, num: usize) -> Vec<f64> {
  match num {
    0 => Vec::new(),
    1 => vec![min],
    _ => (0..num)
      .map(|i| min + (max - min) * i as f64 / (num - 1) as f64)
      .collect(),
  }
}

/// Scalar coefficient depending on the parameter.
#[derive(Debug, Clone)]
pub enum ParameterFunctional {
  Constant(f64),
  /// Projection onto a named scalar component.
  Projection(String),
}

impl ParameterFunctional {
  pub fn projection(name: impl Into<String>) -> Self {
    Self::Projection(name.into())
  }

  pub fn evaluate(&self, mu: &Parameter) -> Result<f64> {
    match self {
      Self::Constant(value) => Ok(*value),
      Self::Projection(name) => mu.get(name),
    }
  }
}

/// $alpha(mu, bar(mu)) = min_q theta_q (mu) / theta_q (bar(mu))$
pub fn alpha(coefficients: &[ParameterFunctional], mu: &Parameter, mu_bar: &Parameter) -> Result<f64> {
  coefficient_ratios(coefficients, mu, mu_bar).map(|ratios| ratios.fold(f64::INFINITY, f64::min))
}

/// $gamma(mu, bar(mu)) = max_q theta_q (mu) / theta_q (bar(mu))$
pub fn gamma(coefficients: &[ParameterFunctional], mu: &Parameter, mu_bar: &Parameter) -> Result<f64> {
  coefficient_ratios(coefficients, mu, mu_bar)
    .map(|ratios| ratios.fold(f64::NEG_INFINITY, f64::max))
}

fn coefficient_ratios(
  coefficients: &[ParameterFunctional],
  mu: &Parameter,
  mu_bar: &Parameter,
) -> Result<impl Iterator<Item = f64>> {
  let ratios = coefficients
    .iter()
    .map(|theta| Ok(theta.evaluate(mu)? / theta.evaluate(mu_bar)?))
    .collect::<Result<Vec<f64>>>()?;
  Ok(ratios.into_iter())
}

#[cfg(test)]
mod test {
  use super::{alpha, gamma, Parameter, ParameterFunctional, ParameterSpace};
  use approx::assert_relative_eq;

  #[test]
  fn uniform_samples_include_end_points() {
    let space = ParameterSpace::cubic(["switch"], 0.1, 1.0).unwrap();
    let samples = space.sample_uniformly(3);
    let values: Vec<f64> = samples.iter().map(|mu| mu.get("switch").unwrap()).collect();
    assert_eq!(values.len(), 3);
    assert_relative_eq!(values[0], 0.1);
    assert_relative_eq!(values[1], 0.55);
    assert_relative_eq!(values[2], 1.0);
    assert!(samples.iter().all(|mu| space.contains(mu)));
  }

  #[test]
  fn samples_form_tensor_product() {
    let space = ParameterSpace::cubic(["a", "b"], 0.0, 1.0).unwrap();
    assert_eq!(space.sample_uniformly(4).len(), 16);
  }

  #[test]
  fn missing_component_is_an_error() {
    let theta = ParameterFunctional::projection("switch");
    assert!(theta.evaluate(&Parameter::scalar("other", 1.0)).is_err());
  }

  #[test]
  fn alpha_gamma_of_affine_coefficients() {
    let thetas = [
      ParameterFunctional::Constant(1.0),
      ParameterFunctional::projection("switch"),
    ];
    let mu = Parameter::scalar("switch", 0.5);
    let mu_bar = Parameter::scalar("switch", 0.1);
    assert_relative_eq!(alpha(&thetas, &mu, &mu_bar).unwrap(), 1.0);
    assert_relative_eq!(gamma(&thetas, &mu, &mu_bar).unwrap(), 5.0);
    assert_relative_eq!(alpha(&thetas, &mu_bar, &mu).unwrap(), 0.2);
  }
}
