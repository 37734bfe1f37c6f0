//! Guaranteed a posteriori error estimator for the SWIPDG discretization,
//! based on an Oswald interpolant of the pressure and a reconstructed flux.
//!
//! Three diffusions enter: $kappa_mu$ of the solution, the energy norm diffusion
//! $kappa_(bar(mu))$ and the weighting diffusion $kappa_(hat(mu))$. Since they are affine in
//! the parameter, the estimate is valid for the energy norm at $bar(mu)$ after scaling with
//! the constants of [`AffineConstants`].

use crate::{
  error::{Error, Result},
  fe::Diffusion,
  function::{interpolate_p0, Function},
  geometry::min_eigenvalue,
  mesh::{CellIdx, Triangulation},
  quadrature::triangle_midpoint_rule,
  space::{DgSpace, RtSpace},
};

use rayon::prelude::*;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
  pub eta: f64,
  pub eta_nc: f64,
  pub eta_r: f64,
  pub eta_df: f64,
}

/// The diffusions the estimator is evaluated with.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorDiffusions<'a> {
  pub mu: &'a Diffusion,
  pub bar: &'a Diffusion,
  pub hat: &'a Diffusion,
}

/// $alpha(mu, bar(mu))$, $alpha(mu, hat(mu))$ and $gamma(mu, bar(mu))$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineConstants {
  pub alpha_mu_mubar: f64,
  pub alpha_mu_muhat: f64,
  pub gamma_mu_mubar: f64,
}
impl AffineConstants {
  /// For $mu = bar(mu) = hat(mu)$.
  pub fn unit() -> Self {
    Self {
      alpha_mu_mubar: 1.0,
      alpha_mu_muhat: 1.0,
      gamma_mu_mubar: 1.0,
    }
  }
}

/// Conforming P1 function with vertex values averaged over the adjacent cells.
///
/// Boundary vertices are set to zero, so the result satisfies the Dirichlet condition.
/// Returned in DG coefficients.
pub fn oswald_interpolation(dg: &DgSpace, u: &na::DVector<f64>) -> Result<na::DVector<f64>> {
  dg.check_dofs(u)?;
  let mesh = dg.mesh();

  let vertex_values: Vec<f64> = (0..mesh.nvertices())
    .map(|ivertex| {
      if mesh.is_boundary_vertex(ivertex) {
        return 0.0;
      }
      let cells = mesh.vertex_cells(ivertex);
      let sum: f64 = cells
        .iter()
        .map(|&icell| u[dg.local2global(icell)[local_vertex(mesh, icell, ivertex)]])
        .sum();
      sum / cells.len() as f64
    })
    .collect();

  let mut interpolant = na::DVector::zeros(dg.num_dofs());
  for icell in 0..mesh.ncells() {
    for (idof, ivertex) in dg.local2global(icell).into_iter().zip(mesh.cell(icell)) {
      interpolant[idof] = vertex_values[ivertex];
    }
  }
  Ok(interpolant)
}

fn local_vertex(mesh: &Triangulation, icell: CellIdx, ivertex: usize) -> usize {
  mesh
    .cell(icell)
    .iter()
    .position(|&v| v == ivertex)
    .expect("Vertex is incident to cell.")
}

/// Nonconformity estimator $|||u - I_"os" u|||_(bar(mu))$.
pub fn compute_eta_nc(dg: &DgSpace, u: &na::DVector<f64>, diffusion_bar: &Diffusion) -> Result<f64> {
  let difference = u - oswald_interpolation(dg, u)?;
  let mesh = dg.mesh();
  let eta_sq: f64 = (0..mesh.ncells())
    .into_par_iter()
    .map(|icell| {
      let area = mesh.cell_geometry(icell).area();
      let grad = dg.gradient(&difference, icell);
      area * grad.dot(&(diffusion_bar.full(icell) * grad))
    })
    .sum();
  Ok(eta_sq.sqrt())
}

/// Residual estimator $(sum_K h_K^2 / (pi^2 c_K) norm(f - div t)_K^2)^(1/2)$,
/// with $c_K$ the smallest eigenvalue of $kappa_(hat(mu)) A$ on $K$.
pub fn compute_eta_r(
  rt: &RtSpace,
  t: &na::DVector<f64>,
  force: &dyn Function,
  diffusion_hat: &Diffusion,
) -> Result<f64> {
  rt.check_dofs(t)?;
  let mesh = rt.mesh();
  let force = interpolate_p0(mesh, force);
  let eta_sq = (0..mesh.ncells())
    .into_par_iter()
    .map(|icell| -> Result<f64> {
      let geo = mesh.cell_geometry(icell);
      let c = min_eigenvalue(&diffusion_hat.full(icell));
      if c <= 0.0 {
        return Err(Error::Config(format!(
          "diffusion is not positive definite on cell {icell}"
        )));
      }
      let h = geo.diameter();
      let residual = force[icell] - rt.divergence(t, icell);
      Ok(h * h / (PI * PI * c) * geo.area() * residual * residual)
    })
    .collect::<Result<Vec<f64>>>()?
    .into_iter()
    .sum::<f64>();
  Ok(eta_sq.sqrt())
}

/// Diffusive flux estimator $norm((kappa_(hat(mu)) A)^(-1/2) (kappa_mu A nabla u + t))$.
pub fn compute_eta_df(
  dg: &DgSpace,
  rt: &RtSpace,
  u: &na::DVector<f64>,
  t: &na::DVector<f64>,
  diffusion: &Diffusion,
  diffusion_hat: &Diffusion,
) -> Result<f64> {
  dg.check_dofs(u)?;
  rt.check_dofs(t)?;
  let mesh = dg.mesh();
  if !std::sync::Arc::ptr_eq(mesh, rt.mesh()) {
    return Err(Error::NotNested(
      "pressure and flux spaces live on different grids".to_string(),
    ));
  }
  let eta_sq = (0..mesh.ncells())
    .into_par_iter()
    .map(|icell| -> Result<f64> {
      let geo = mesh.cell_geometry(icell);
      let weight = diffusion_hat.full(icell).try_inverse().ok_or_else(|| {
        Error::Config(format!("diffusion is singular on cell {icell}"))
      })?;
      let diffusive_flux = diffusion.full(icell) * dg.gradient(u, icell);
      // integrand is quadratic
      let value = triangle_midpoint_rule(&geo)
        .iter()
        .map(|(x, w)| {
          let v = diffusive_flux + rt.evaluate(t, icell, x);
          w * v.dot(&(weight * v))
        })
        .sum::<f64>();
      Ok(value)
    })
    .collect::<Result<Vec<f64>>>()?
    .into_iter()
    .sum::<f64>();
  Ok(eta_sq.sqrt())
}

/// All estimator contributions for the pressure `u` and flux `t`.
///
/// $eta = alpha(mu, bar(mu))^(-1/2) (gamma(mu, bar(mu))^(1/2) eta_"NC"
///   + alpha(mu, hat(mu))^(-1/2) (eta_R + eta_"DF"))$
pub fn compute_estimate(
  dg: &DgSpace,
  rt: &RtSpace,
  u: &na::DVector<f64>,
  t: &na::DVector<f64>,
  force: &dyn Function,
  diffusions: EstimatorDiffusions,
  constants: AffineConstants,
) -> Result<Estimate> {
  let eta_nc = compute_eta_nc(dg, u, diffusions.bar)?;
  let eta_r = compute_eta_r(rt, t, force, diffusions.hat)?;
  let eta_df = compute_eta_df(dg, rt, u, t, diffusions.mu, diffusions.hat)?;

  let AffineConstants {
    alpha_mu_mubar,
    alpha_mu_muhat,
    gamma_mu_mubar,
  } = constants;
  if alpha_mu_mubar <= 0.0 || alpha_mu_muhat <= 0.0 || gamma_mu_mubar <= 0.0 {
    return Err(Error::Config(format!(
      "affine constants must be positive, got {constants:?}"
    )));
  }
  let eta = (gamma_mu_mubar.sqrt() * eta_nc + (eta_r + eta_df) / alpha_mu_muhat.sqrt()) / alpha_mu_mubar.sqrt();
  tracing::debug!("estimate: eta_NC = {eta_nc:.3e}, eta_R = {eta_r:.3e}, eta_DF = {eta_df:.3e}");

  Ok(Estimate {
    eta,
    eta_nc,
    eta_r,
    eta_df,
  })
}

#[cfg(test)]
mod test {
  use super::{compute_estimate, oswald_interpolation, AffineConstants, EstimatorDiffusions};
  use crate::{
    assemble::{assemble_l2_vector, assemble_swipdg_matrix},
    fe::{Diffusion, DEFAULT_PENALTY},
    flux::compute_flux_reconstruction,
    function::{Box2, DiffusionTensor, Expression, IndicatorFunction},
    geometry::Point,
    lse::FaerCholesky,
    mesh::cartesian::CartesianGrid,
    space::{DgSpace, RtSpace},
  };
  use approx::assert_relative_eq;

  #[test]
  fn oswald_interpolant_is_continuous_and_vanishes_on_boundary() {
    let grid = CartesianGrid::new([0.0, 0.0], [1.0, 1.0], [3, 3]).unwrap();
    let dg = DgSpace::new(grid.triangulation().clone());
    let mesh = dg.mesh();
    let u = na::DVector::from_fn(dg.num_dofs(), |i, _| (i as f64 * 0.37).sin());
    let interpolant = oswald_interpolation(&dg, &u).unwrap();

    for ivertex in 0..mesh.nvertices() {
      let values: Vec<f64> = mesh
        .vertex_cells(ivertex)
        .iter()
        .map(|&icell| dg.evaluate(&interpolant, icell, &mesh.coords()[ivertex]))
        .collect();
      for v in &values {
        assert_relative_eq!(*v, values[0], epsilon = 1e-12);
      }
      if mesh.is_boundary_vertex(ivertex) {
        assert_relative_eq!(values[0], 0.0, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn oswald_interpolant_reproduces_conforming_functions() {
    let grid = CartesianGrid::new([0.0, 0.0], [1.0, 1.0], [4, 4]).unwrap();
    let dg = DgSpace::new(grid.triangulation().clone());
    let mesh = dg.mesh();
    let mut u = na::DVector::zeros(dg.num_dofs());
    for icell in 0..mesh.ncells() {
      let geo = mesh.cell_geometry(icell);
      for (k, idof) in dg.local2global(icell).into_iter().enumerate() {
        let x = geo.vertex(k);
        u[idof] = x.x * (1.0 - x.x) * x.y * (1.0 - x.y);
      }
    }
    let interpolant = oswald_interpolation(&dg, &u).unwrap();
    assert_relative_eq!(interpolant, u, epsilon = 1e-14);
  }

  #[test]
  fn estimate_of_galerkin_solution() {
    let grid = CartesianGrid::new([0.0, 0.0], [2.0, 1.0], [8, 4]).unwrap();
    let dg = DgSpace::new(grid.triangulation().clone());
    let rt = RtSpace::new(grid.triangulation().clone());
    let diffusion = Diffusion::interpolate(dg.mesh(), &|_: &Point| 1.0, &DiffusionTensor::default());
    let force: Expression =
      IndicatorFunction::new(vec![(Box2::new([0.5, 1.0], [0.25, 0.75]), 1.0)], "force").into();

    let lhs = assemble_swipdg_matrix(&dg, &diffusion, DEFAULT_PENALTY);
    let u = FaerCholesky::new(&lhs)
      .unwrap()
      .solve(&assemble_l2_vector(&dg, &force))
      .unwrap();
    let t = compute_flux_reconstruction(&dg, &rt, &diffusion, DEFAULT_PENALTY, &u).unwrap();

    let diffusions = EstimatorDiffusions {
      mu: &diffusion,
      bar: &diffusion,
      hat: &diffusion,
    };
    let estimate =
      compute_estimate(&dg, &rt, &u, &t, &force, diffusions, AffineConstants::unit()).unwrap();
    assert!(estimate.eta_r < 1e-10);
    assert!(estimate.eta_nc > 0.0);
    assert!(estimate.eta_df > 0.0);
    assert_relative_eq!(estimate.eta, estimate.eta_nc + estimate.eta_r + estimate.eta_df, epsilon = 1e-14);

    // scaling with the affine constants
    let constants = AffineConstants {
      alpha_mu_mubar: 0.25,
      alpha_mu_muhat: 1.0,
      gamma_mu_mubar: 4.0,
    };
    let scaled = compute_estimate(&dg, &rt, &u, &t, &force, diffusions, constants).unwrap();
    assert_relative_eq!(
      scaled.eta,
      2.0 * (2.0 * estimate.eta_nc + estimate.eta_r + estimate.eta_df),
      epsilon = 1e-12
    );
  }
}
