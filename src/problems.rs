//! Parametric diffusion problems with an affinely decomposed diffusion factor.

pub mod spe10;

use crate::{
  error::{Error, Result},
  fe::Diffusion,
  function::{DiffusionTensor, Expression},
  geometry::min_eigenvalue,
  mesh::Triangulation,
  parameter::{self, Parameter, ParameterFunctional, ParameterSpace},
};

/// $-div(kappa_mu A nabla u) = f$ in $Omega$, $u = 0$ on $partial Omega$,
/// with $kappa_mu = sum_q theta_q (mu) kappa_q$.
#[derive(Debug, Clone)]
pub struct AffineDiffusionProblem {
  pub lower_left: [f64; 2],
  pub upper_right: [f64; 2],
  /// Boxes of the unrefined grid per axis.
  pub num_elements: [usize; 2],
  pub factor_functions: Vec<Expression>,
  pub factor_coefficients: Vec<ParameterFunctional>,
  pub tensor: DiffusionTensor,
  pub force: Expression,
  pub parameter_space: ParameterSpace,
}

impl AffineDiffusionProblem {
  /// The diffusion factor $kappa_mu$ for a fixed parameter.
  pub fn diffusion_factor(&self, mu: &Parameter) -> Result<Expression> {
    let mut terms = self
      .factor_functions
      .iter()
      .zip(&self.factor_coefficients)
      .map(|(kappa, theta)| -> Result<Expression> {
        Ok(Expression::constant(theta.evaluate(mu)?) * kappa.clone())
      });
    let mut factor = terms.next().unwrap_or(Ok(Expression::constant(0.0)))?;
    for term in terms {
      factor = factor + term?;
    }
    Ok(factor)
  }

  /// $kappa_mu A$ interpolated onto the cells of `mesh`.
  pub fn diffusion(&self, mesh: &Triangulation, mu: &Parameter) -> Result<Diffusion> {
    let factor = self.diffusion_factor(mu)?;
    Ok(Diffusion::interpolate(mesh, &factor, &self.tensor))
  }

  /// The affine components $kappa_q A$ on the cells of `mesh`.
  pub fn diffusion_components(&self, mesh: &Triangulation) -> Vec<Diffusion> {
    self
      .factor_functions
      .iter()
      .map(|kappa| Diffusion::interpolate(mesh, kappa, &self.tensor))
      .collect()
  }

  /// Checks that $kappa_mu A$ is positive definite on every cell of `mesh` for all parameters.
  ///
  /// The coefficients are affine in the parameter, so the corners of the parameter space suffice.
  pub fn check_ellipticity(&self, mesh: &Triangulation) -> Result<()> {
    for mu in self.parameter_space.sample_uniformly(2) {
      let diffusion = self.diffusion(mesh, &mu)?;
      let degenerate = (0..mesh.ncells()).find(|&icell| {
        !(diffusion.factor(icell) > 0.0 && min_eigenvalue(diffusion.tensor(icell)) > 0.0)
      });
      if let Some(icell) = degenerate {
        let centroid = mesh.cell_geometry(icell).centroid();
        return Err(Error::Config(format!(
          "diffusion is not positive definite for {mu} in cell {icell} at ({:.4}, {:.4}), factor {:.4e}",
          centroid.x,
          centroid.y,
          diffusion.factor(icell)
        )));
      }
    }
    Ok(())
  }

  pub fn alpha(&self, mu: &Parameter, mu_bar: &Parameter) -> Result<f64> {
    parameter::alpha(&self.factor_coefficients, mu, mu_bar)
  }
  pub fn gamma(&self, mu: &Parameter, mu_bar: &Parameter) -> Result<f64> {
    parameter::gamma(&self.factor_coefficients, mu, mu_bar)
  }
}
