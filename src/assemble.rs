//! Assembly of the global Galerkin matrices and vectors.
//!
//! Cells and faces are traversed in parallel, each producing its local triplets.

use crate::{
  fe::{self, Diffusion, FaceTerms},
  function::{interpolate_p0, Function},
  space::{DgSpace, DofIdx, RtSpace},
  sparse::SparseMatrix,
};

use rayon::prelude::*;

pub type GalMat = nas::CsrMatrix<f64>;
pub type GalVec = na::DVector<f64>;

fn scatter(rows: &[DofIdx], cols: &[DofIdx], entry: impl Fn(usize, usize) -> f64) -> Vec<(usize, usize, f64)> {
  let mut triplets = Vec::with_capacity(rows.len() * cols.len());
  for (ilocal, &iglobal) in rows.iter().enumerate() {
    for (jlocal, &jglobal) in cols.iter().enumerate() {
      let v = entry(ilocal, jlocal);
      if v != 0.0 {
        triplets.push((iglobal, jglobal, v));
      }
    }
  }
  triplets
}

/// Volume and face terms of the interior penalty form.
pub fn assemble_elliptic_ipdg(space: &DgSpace, diffusion: &Diffusion, sigma: f64, terms: FaceTerms) -> GalMat {
  let mesh = space.mesh();
  assert_eq!(diffusion.ncells(), mesh.ncells());
  let ndofs = space.num_dofs();

  let mut triplets: Vec<(usize, usize, f64)> = (0..mesh.ncells())
    .into_par_iter()
    .flat_map_iter(|icell| {
      let elmat = fe::elliptic_elmat(&mesh.cell_geometry(icell), &diffusion.full(icell));
      let dofs = space.local2global(icell);
      scatter(&dofs, &dofs, |i, j| elmat[(i, j)])
    })
    .collect();

  if terms != FaceTerms::NONE {
    let inner_edges: Vec<_> = mesh.inner_edges().collect();
    let inner: Vec<(usize, usize, f64)> = inner_edges
      .par_iter()
      .flat_map_iter(|&iedge| {
        let edge = mesh.edge(iedge);
        let inside = space.local2global(edge.inside().cell);
        let outside = space.local2global(edge.outside().expect("Inner edge.").cell);
        let dofs = [inside, outside].concat();
        let elmat = fe::inner_face_elmat(mesh, diffusion, iedge, sigma, terms);
        scatter(&dofs, &dofs, |i, j| elmat[(i, j)])
      })
      .collect();
    triplets.extend(inner);

    let boundary_edges: Vec<_> = mesh.boundary_edges().collect();
    let boundary: Vec<(usize, usize, f64)> = boundary_edges
      .par_iter()
      .flat_map_iter(|&iedge| {
        let dofs = space.local2global(mesh.edge(iedge).inside().cell);
        let elmat = fe::boundary_face_elmat(mesh, diffusion, iedge, sigma, terms);
        scatter(&dofs, &dofs, |i, j| elmat[(i, j)])
      })
      .collect();
    triplets.extend(boundary);
  }

  SparseMatrix::new(ndofs, ndofs, triplets).to_nalgebra_csr()
}

/// SWIPDG matrix for homogeneous Dirichlet boundary conditions.
///
/// Linear in the scalar diffusion factor.
pub fn assemble_swipdg_matrix(space: &DgSpace, diffusion: &Diffusion, sigma: f64) -> GalMat {
  tracing::debug!("assembling SWIPDG matrix with {} DoFs", space.num_dofs());
  assemble_elliptic_ipdg(space, diffusion, sigma, FaceTerms::SWIPDG)
}

/// Product of the DG energy norm: broken energy plus jump penalty.
pub fn assemble_dg_product_matrix(space: &DgSpace, diffusion: &Diffusion, sigma: f64) -> GalMat {
  assemble_elliptic_ipdg(space, diffusion, sigma, FaceTerms::PENALTY_ONLY)
}

/// Broken energy semi-product $sum_K integral_K kappa A nabla u dot nabla v$.
pub fn assemble_energy_semi_product_matrix(space: &DgSpace, diffusion: &Diffusion) -> GalMat {
  assemble_elliptic_ipdg(space, diffusion, 0.0, FaceTerms::NONE)
}

pub fn assemble_l2_product_matrix(space: &DgSpace) -> GalMat {
  let mesh = space.mesh();
  let triplets: Vec<(usize, usize, f64)> = (0..mesh.ncells())
    .into_par_iter()
    .flat_map_iter(|icell| {
      let elmat = fe::mass_elmat(&mesh.cell_geometry(icell));
      let dofs = space.local2global(icell);
      scatter(&dofs, &dofs, |i, j| elmat[(i, j)])
    })
    .collect();
  SparseMatrix::new(space.num_dofs(), space.num_dofs(), triplets).to_nalgebra_csr()
}

/// Load vector $[integral f phi_i]_i$ of a cellwise constant source.
pub fn assemble_l2_vector(space: &DgSpace, source: &dyn Function) -> GalVec {
  let mesh = space.mesh();
  let values = interpolate_p0(mesh, source);
  let mut galvec = na::DVector::zeros(space.num_dofs());
  for icell in 0..mesh.ncells() {
    let elvec = fe::l2_elvec(&mesh.cell_geometry(icell), values[icell]);
    for (ilocal, idof) in space.local2global(icell).into_iter().enumerate() {
      galvec[idof] += elvec[ilocal];
    }
  }
  galvec
}

/// $H(div)$ product $integral t dot s + div t div s$ on the Raviart-Thomas space.
pub fn assemble_hdiv_product_matrix(space: &RtSpace) -> GalMat {
  let mesh = space.mesh();
  let ndofs = space.num_dofs();
  let triplets: Vec<(usize, usize, f64)> = (0..mesh.ncells())
    .into_par_iter()
    .flat_map_iter(|icell| {
      let elmat = fe::hdiv_elmat(&mesh.cell_geometry(icell));
      let signs = space.local_signs(icell);
      let dofs = space.local2global(icell);
      scatter(&dofs, &dofs, |i, j| signs[i] * signs[j] * elmat[(i, j)])
    })
    .collect();
  SparseMatrix::new(ndofs, ndofs, triplets).to_nalgebra_csr()
}

#[cfg(test)]
mod test {
  use super::{
    assemble_dg_product_matrix, assemble_energy_semi_product_matrix, assemble_hdiv_product_matrix,
    assemble_l2_product_matrix, assemble_l2_vector, assemble_swipdg_matrix,
  };
  use crate::{
    fe::{Diffusion, DEFAULT_PENALTY},
    function::{DiffusionTensor, Expression},
    geometry::Point,
    lse::FaerCholesky,
    mesh::cartesian::CartesianGrid,
    space::{DgSpace, RtSpace},
    sparse::{asymmetry, quadratic_form},
  };
  use approx::assert_relative_eq;

  fn setup() -> (CartesianGrid, DgSpace) {
    let grid = CartesianGrid::new([0.0, 0.0], [2.0, 1.0], [4, 2]).unwrap();
    let space = DgSpace::new(grid.triangulation().clone());
    (grid, space)
  }

  fn diffusion(space: &DgSpace, factor: impl Fn(&Point) -> f64 + Send + Sync) -> Diffusion {
    Diffusion::interpolate(space.mesh(), &factor, &DiffusionTensor::default())
  }

  #[test]
  fn swipdg_is_spd() {
    let (_, space) = setup();
    let kappa = diffusion(&space, |x| if x.x < 1.0 { 1.0 } else { 1e-2 });
    let galmat = assemble_swipdg_matrix(&space, &kappa, DEFAULT_PENALTY);
    assert!(asymmetry(&galmat) < 1e-12);
    assert!(FaerCholesky::new(&galmat).is_ok());
  }

  #[test]
  fn swipdg_is_linear_in_factor() {
    let (_, space) = setup();
    let a = diffusion(&space, |x| 1.0 + x.x);
    let b = diffusion(&space, |x| if x.y < 0.5 { -0.5 } else { 0.25 });
    let sum = a.with_factor(a.factors() + 3.0 * b.factors());

    let lhs = assemble_swipdg_matrix(&space, &sum, DEFAULT_PENALTY);
    let rhs = &assemble_swipdg_matrix(&space, &a, DEFAULT_PENALTY)
      + &(assemble_swipdg_matrix(&space, &b, DEFAULT_PENALTY) * 3.0);
    let diff = &lhs - &rhs;
    assert!(diff.values().iter().all(|v| v.abs() < 1e-10));
  }

  #[test]
  fn constants_are_in_kernel_of_energy_semi_product() {
    let (_, space) = setup();
    let kappa = diffusion(&space, |_| 2.0);
    let energy = assemble_energy_semi_product_matrix(&space, &kappa);
    let ones = na::DVector::from_element(space.num_dofs(), 1.0);
    assert_relative_eq!(quadratic_form(&energy, &ones), 0.0, epsilon = 1e-12);

    // constant functions jump at the boundary only
    let product = assemble_dg_product_matrix(&space, &kappa, 1.0);
    let perimeter = 6.0;
    let h = 0.5;
    assert_relative_eq!(quadratic_form(&product, &ones), 2.0 * perimeter / h, epsilon = 1e-10);
  }

  #[test]
  fn l2_vector_integrates_source() {
    let (_, space) = setup();
    let force = Expression::constant(3.0);
    let galvec = assemble_l2_vector(&space, &force);
    assert_relative_eq!(galvec.sum(), 3.0 * 2.0, epsilon = 1e-12);

    let mass = assemble_l2_product_matrix(&space);
    let ones = na::DVector::from_element(space.num_dofs(), 1.0);
    assert_relative_eq!(quadratic_form(&mass, &ones), 2.0, epsilon = 1e-12);
  }

  #[test]
  fn hdiv_product_is_spd() {
    let (grid, _) = setup();
    let rt = RtSpace::new(grid.triangulation().clone());
    let product = assemble_hdiv_product_matrix(&rt);
    assert_eq!(product.nrows(), rt.num_dofs());
    assert!(asymmetry(&product) < 1e-12);
    assert!(FaerCholesky::new(&product).is_ok());
  }
}
