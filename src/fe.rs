//! Local (element and face) contributions of the SWIPDG discretization and the
//! lowest order Raviart-Thomas products.

use crate::{
  function::{interpolate_p0, interpolate_tensor_p0, DiffusionTensor, Function},
  geometry::{Tensor, TriangleGeometry},
  mesh::{CellIdx, EdgeIdx, Triangulation},
  quadrature::{integrate_triangle, EdgeQuadRule},
};

/// Penalty parameter for first order SWIPDG on simplices.
pub const DEFAULT_PENALTY: f64 = 16.0;

/// Cellwise constant diffusion $kappa A$, split into scalar factor and tensor.
#[derive(Debug, Clone)]
pub struct Diffusion {
  factor: na::DVector<f64>,
  tensor: Vec<Tensor>,
}

impl Diffusion {
  pub fn new(factor: na::DVector<f64>, tensor: Vec<Tensor>) -> Self {
    assert_eq!(factor.len(), tensor.len());
    Self { factor, tensor }
  }

  pub fn interpolate(mesh: &Triangulation, factor: &dyn Function, tensor: &DiffusionTensor) -> Self {
    Self::new(interpolate_p0(mesh, factor), interpolate_tensor_p0(mesh, tensor))
  }

  pub fn ncells(&self) -> usize {
    self.factor.len()
  }
  pub fn factor(&self, icell: CellIdx) -> f64 {
    self.factor[icell]
  }
  pub fn factors(&self) -> &na::DVector<f64> {
    &self.factor
  }
  pub fn tensor(&self, icell: CellIdx) -> &Tensor {
    &self.tensor[icell]
  }
  pub fn full(&self, icell: CellIdx) -> Tensor {
    self.factor[icell] * self.tensor[icell]
  }

  pub fn with_factor(&self, factor: na::DVector<f64>) -> Self {
    Self::new(factor, self.tensor.clone())
  }
}

/// Which face terms of the interior penalty form are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceTerms {
  /// Consistency and symmetry terms.
  pub consistency: bool,
  pub penalty: bool,
}
impl FaceTerms {
  pub const SWIPDG: Self = Self {
    consistency: true,
    penalty: true,
  };
  pub const PENALTY_ONLY: Self = Self {
    consistency: false,
    penalty: true,
  };
  pub const NONE: Self = Self {
    consistency: false,
    penalty: false,
  };
}

/// Weights of an inner face.
///
/// The weights only depend on the tensor, not on the scalar factor, so that
/// all face terms are linear in the factor.
#[derive(Debug, Clone, Copy)]
pub struct FaceWeights {
  pub omega_inside: f64,
  pub omega_outside: f64,
  /// $sigma gamma_e {kappa}_omega / h_e$
  pub penalty: f64,
}

pub fn inner_face_weights(
  mesh: &Triangulation,
  diffusion: &Diffusion,
  iedge: EdgeIdx,
  sigma: f64,
) -> FaceWeights {
  let edge = mesh.edge(iedge);
  let inside = edge.inside().cell;
  let outside = edge.outside().expect("Inner edge.").cell;
  let normal = mesh.edge_normal(iedge);
  let h = mesh.edge_length(iedge);

  let delta_inside = normal.dot(&(diffusion.tensor(inside) * normal));
  let delta_outside = normal.dot(&(diffusion.tensor(outside) * normal));
  let delta_sum = delta_inside + delta_outside;
  let omega_inside = delta_outside / delta_sum;
  let omega_outside = delta_inside / delta_sum;
  let gamma = 2.0 * delta_inside * delta_outside / delta_sum;

  let factor_avg = omega_inside * diffusion.factor(inside) + omega_outside * diffusion.factor(outside);
  FaceWeights {
    omega_inside,
    omega_outside,
    penalty: sigma * gamma * factor_avg / h,
  }
}

/// $sigma kappa (n dot A n) / h_e$
pub fn boundary_face_penalty(mesh: &Triangulation, diffusion: &Diffusion, iedge: EdgeIdx, sigma: f64) -> f64 {
  let icell = mesh.edge(iedge).inside().cell;
  let normal = mesh.edge_normal(iedge);
  let delta = normal.dot(&(diffusion.tensor(icell) * normal));
  sigma * diffusion.factor(icell) * delta / mesh.edge_length(iedge)
}

/// $A = [integral_K kappa A nabla lambda_j dot nabla lambda_i]_(i,j)$
pub fn elliptic_elmat(geo: &TriangleGeometry, diffusion: &Tensor) -> na::Matrix3<f64> {
  let grads = geo.bary_gradients();
  na::Matrix3::from_fn(|i, j| geo.area() * grads[i].dot(&(diffusion * grads[j])))
}

/// $M = [integral_K lambda_j lambda_i]_(i,j)$
pub fn mass_elmat(geo: &TriangleGeometry) -> na::Matrix3<f64> {
  let v = geo.area() / 12.0;
  na::Matrix3::from_fn(|i, j| if i == j { 2.0 * v } else { v })
}

/// Element vector for a cellwise constant source.
pub fn l2_elvec(geo: &TriangleGeometry, value: f64) -> na::Vector3<f64> {
  na::Vector3::from_element(value * geo.area() / 3.0)
}

/// Face matrix on an inner edge, rows and columns ordered (inside, outside).
pub fn inner_face_elmat(
  mesh: &Triangulation,
  diffusion: &Diffusion,
  iedge: EdgeIdx,
  sigma: f64,
  terms: FaceTerms,
) -> na::Matrix6<f64> {
  let edge = mesh.edge(iedge);
  let cells = [edge.inside().cell, edge.outside().expect("Inner edge.").cell];
  let signs = [1.0, -1.0];
  let weights = inner_face_weights(mesh, diffusion, iedge, sigma);
  let omegas = [weights.omega_inside, weights.omega_outside];
  let normal = mesh.edge_normal(iedge);
  let geos = cells.map(|icell| mesh.cell_geometry(icell));

  // normal fluxes of the local basis functions, constant on the face
  let fluxes: [[f64; 3]; 2] = [0, 1].map(|s| {
    let diff = diffusion.full(cells[s]);
    geos[s].bary_gradients().map(|g| (diff * g).dot(&normal))
  });

  let [a, b] = edge.vertices().map(|v| mesh.coords()[v]);
  let mut elmat = na::Matrix6::zeros();
  for (x, w) in EdgeQuadRule::gauss2().points(&a, &b) {
    let values: [[f64; 3]; 2] = [0, 1].map(|s| geos[s].barycentric_coords(&x));
    for sa in 0..2 {
      for i in 0..3 {
        let jump_test = signs[sa] * values[sa][i];
        for sb in 0..2 {
          for j in 0..3 {
            let jump_ansatz = signs[sb] * values[sb][j];
            let mut v = 0.0;
            if terms.consistency {
              v -= omegas[sb] * fluxes[sb][j] * jump_test;
              v -= omegas[sa] * fluxes[sa][i] * jump_ansatz;
            }
            if terms.penalty {
              v += weights.penalty * jump_test * jump_ansatz;
            }
            elmat[(3 * sa + i, 3 * sb + j)] += w * v;
          }
        }
      }
    }
  }
  elmat
}

/// Face matrix on a Dirichlet boundary edge.
pub fn boundary_face_elmat(
  mesh: &Triangulation,
  diffusion: &Diffusion,
  iedge: EdgeIdx,
  sigma: f64,
  terms: FaceTerms,
) -> na::Matrix3<f64> {
  let icell = mesh.edge(iedge).inside().cell;
  let geo = mesh.cell_geometry(icell);
  let normal = mesh.edge_normal(iedge);
  let penalty = boundary_face_penalty(mesh, diffusion, iedge, sigma);
  let diff = diffusion.full(icell);
  let fluxes = geo.bary_gradients().map(|g| (diff * g).dot(&normal));

  let [a, b] = mesh.edge(iedge).vertices().map(|v| mesh.coords()[v]);
  let mut elmat = na::Matrix3::zeros();
  for (x, w) in EdgeQuadRule::gauss2().points(&a, &b) {
    let values = geo.barycentric_coords(&x);
    for i in 0..3 {
      for j in 0..3 {
        let mut v = 0.0;
        if terms.consistency {
          v -= fluxes[j] * values[i];
          v -= fluxes[i] * values[j];
        }
        if terms.penalty {
          v += penalty * values[i] * values[j];
        }
        elmat[(i, j)] += w * v;
      }
    }
  }
  elmat
}

/// Element matrix of the $H(div)$ product for the local Raviart-Thomas basis.
///
/// $[integral_K psi_j dot psi_i + div psi_j div psi_i]_(i,j)$ without orientation signs.
pub fn hdiv_elmat(geo: &TriangleGeometry) -> na::Matrix3<f64> {
  let area = geo.area();
  let scale = 1.0 / (4.0 * area * area);
  let vertices = *geo.vertices();
  na::Matrix3::from_fn(|i, j| {
    let l2 = scale * integrate_triangle(geo, |x| (x - vertices[i]).dot(&(x - vertices[j])));
    l2 + 1.0 / area
  })
}
