//! Locally conservative flux reconstruction in the lowest order Raviart-Thomas space.

use crate::{
  error::{Error, Result},
  fe::{boundary_face_penalty, inner_face_weights, Diffusion},
  function::{interpolate_p0, Function},
  space::{DgSpace, RtSpace},
};

use rayon::prelude::*;
use std::sync::Arc;

/// Raviart-Thomas DoFs of the SWIPDG numerical flux of `u`.
///
/// On an inner edge $e$ with normal $n$ pointing from the inside cell to the outside cell
/// $t_e = abs(e) (-{kappa A nabla u}_omega dot n + p_e [u](m_e))$,
/// on a boundary edge the average is the one-sided value and the jump is $u(m_e)$.
/// For a Galerkin solution of the SWIPDG system, $div t = Pi_0 f$ on every cell.
pub fn compute_flux_reconstruction(
  dg: &DgSpace,
  rt: &RtSpace,
  diffusion: &Diffusion,
  sigma: f64,
  u: &na::DVector<f64>,
) -> Result<na::DVector<f64>> {
  dg.check_dofs(u)?;
  let mesh = dg.mesh();
  if !Arc::ptr_eq(mesh, rt.mesh()) {
    return Err(Error::NotNested(
      "pressure and flux spaces live on different grids".to_string(),
    ));
  }

  let fluxes: Vec<f64> = (0..mesh.nedges())
    .into_par_iter()
    .map(|iedge| {
      let edge = mesh.edge(iedge);
      let normal = mesh.edge_normal(iedge);
      let length = mesh.edge_length(iedge);
      let [a, b] = edge.vertices().map(|v| mesh.coords()[v]);
      let midpoint = na::center(&a, &b);

      let inside = edge.inside().cell;
      let normal_flux = |icell| (diffusion.full(icell) * dg.gradient(u, icell)).dot(&normal);

      match edge.outside() {
        Some(outside) => {
          let outside = outside.cell;
          let weights = inner_face_weights(mesh, diffusion, iedge, sigma);
          let average =
            weights.omega_inside * normal_flux(inside) + weights.omega_outside * normal_flux(outside);
          let jump = dg.evaluate(u, inside, &midpoint) - dg.evaluate(u, outside, &midpoint);
          length * (-average + weights.penalty * jump)
        }
        None => {
          let penalty = boundary_face_penalty(mesh, diffusion, iedge, sigma);
          length * (-normal_flux(inside) + penalty * dg.evaluate(u, inside, &midpoint))
        }
      }
    })
    .collect();

  Ok(na::DVector::from_vec(fluxes))
}

/// $sum_K abs(integral_K div t - f)$
pub fn compute_local_conservation_error(rt: &RtSpace, t: &na::DVector<f64>, force: &dyn Function) -> Result<f64> {
  rt.check_dofs(t)?;
  let mesh = rt.mesh();
  let force = interpolate_p0(mesh, force);
  let error = (0..mesh.ncells())
    .into_par_iter()
    .map(|icell| {
      let area = mesh.cell_geometry(icell).area();
      (area * (rt.divergence(t, icell) - force[icell])).abs()
    })
    .sum::<f64>();
  Ok(error)
}

#[cfg(test)]
mod test {
  use super::{compute_flux_reconstruction, compute_local_conservation_error};
  use crate::{
    assemble::{assemble_l2_vector, assemble_swipdg_matrix},
    fe::{Diffusion, DEFAULT_PENALTY},
    function::{Box2, DiffusionTensor, Expression, IndicatorFunction},
    geometry::Point,
    lse::FaerCholesky,
    mesh::cartesian::CartesianGrid,
    space::{DgSpace, RtSpace},
  };

  #[test]
  fn galerkin_flux_is_conservative() {
    let grid = CartesianGrid::new([0.0, 0.0], [2.0, 1.0], [8, 4]).unwrap();
    let dg = DgSpace::new(grid.triangulation().clone());
    let rt = RtSpace::new(grid.triangulation().clone());

    let factor = |x: &Point| if x.y > 0.5 { 1.0 } else { 0.1 };
    let diffusion = Diffusion::interpolate(dg.mesh(), &factor, &DiffusionTensor::default());
    let force: Expression = IndicatorFunction::new(
      vec![
        (Box2::new([0.25, 0.75], [0.25, 0.5]), 10.0),
        (Box2::new([1.25, 1.5], [0.5, 0.75]), -5.0),
      ],
      "force",
    )
    .into();

    let lhs = assemble_swipdg_matrix(&dg, &diffusion, DEFAULT_PENALTY);
    let rhs = assemble_l2_vector(&dg, &force);
    let u = FaerCholesky::new(&lhs).unwrap().solve(&rhs).unwrap();

    let t = compute_flux_reconstruction(&dg, &rt, &diffusion, DEFAULT_PENALTY, &u).unwrap();
    let error = compute_local_conservation_error(&rt, &t, &force).unwrap();
    assert!(error < 1e-9, "conservation error {error}");
  }

  #[test]
  fn spaces_on_different_grids_are_rejected() {
    let grid = CartesianGrid::new([0.0, 0.0], [1.0, 1.0], [4, 4]).unwrap();
    let other = CartesianGrid::new([0.0, 0.0], [1.0, 1.0], [4, 4]).unwrap();
    let dg = DgSpace::new(grid.triangulation().clone());
    let rt = RtSpace::new(other.triangulation().clone());
    let diffusion = Diffusion::interpolate(dg.mesh(), &|_: &Point| 1.0, &DiffusionTensor::default());

    let u = na::DVector::zeros(dg.num_dofs());
    let result = compute_flux_reconstruction(&dg, &rt, &diffusion, DEFAULT_PENALTY, &u);
    assert!(matches!(result, Err(crate::Error::NotNested(_))));
  }

  #[test]
  fn non_galerkin_flux_is_not_conservative() {
    let grid = CartesianGrid::new([0.0, 0.0], [1.0, 1.0], [4, 4]).unwrap();
    let dg = DgSpace::new(grid.triangulation().clone());
    let rt = RtSpace::new(grid.triangulation().clone());
    let diffusion = Diffusion::interpolate(dg.mesh(), &|_: &Point| 1.0, &DiffusionTensor::default());

    let u = na::DVector::from_element(dg.num_dofs(), 1.0);
    let t = compute_flux_reconstruction(&dg, &rt, &diffusion, DEFAULT_PENALTY, &u).unwrap();
    let error = compute_local_conservation_error(&rt, &t, &Expression::constant(0.0)).unwrap();
    assert!(error > 1.0);
  }
}
