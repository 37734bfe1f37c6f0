use crate::{
  error::{Error, Result},
  geometry::{Point, Vector},
  mesh::{cartesian::CartesianGrid, CellIdx, Triangulation},
};

use std::sync::Arc;

pub type DofIdx = usize;

/// Discontinuous piecewise-linear Lagrange space.
///
/// The local basis on each cell are the barycentric coordinate functions,
/// so DoF `3 * icell + k` is the value at local vertex `k` of the cell.
#[derive(Debug, Clone)]
pub struct DgSpace {
  mesh: Arc<Triangulation>,
}

impl DgSpace {
  pub const NLOCAL: usize = 3;

  pub fn new(mesh: Arc<Triangulation>) -> Self {
    Self { mesh }
  }
  pub fn mesh(&self) -> &Arc<Triangulation> {
    &self.mesh
  }
  pub fn num_dofs(&self) -> usize {
    Self::NLOCAL * self.mesh.ncells()
  }
  pub fn local2global(&self, icell: CellIdx) -> [DofIdx; 3] {
    [0, 1, 2].map(|k| Self::NLOCAL * icell + k)
  }

  pub fn local_dofs(&self, dofs: &na::DVector<f64>, icell: CellIdx) -> [f64; 3] {
    self.local2global(icell).map(|idof| dofs[idof])
  }

  pub fn evaluate(&self, dofs: &na::DVector<f64>, icell: CellIdx, x: &Point) -> f64 {
    let lambdas = self.mesh.cell_geometry(icell).barycentric_coords(x);
    let coeffs = self.local_dofs(dofs, icell);
    (0..3).map(|k| coeffs[k] * lambdas[k]).sum()
  }

  /// The constant gradient on a cell.
  pub fn gradient(&self, dofs: &na::DVector<f64>, icell: CellIdx) -> Vector {
    let grads = self.mesh.cell_geometry(icell).bary_gradients();
    let coeffs = self.local_dofs(dofs, icell);
    (0..3).map(|k| coeffs[k] * grads[k]).sum()
  }

  pub fn check_dofs(&self, dofs: &na::DVector<f64>) -> Result<()> {
    check_len(self.num_dofs(), dofs.len())
  }
}

/// Lowest order Raviart-Thomas space.
///
/// DoF `iedge` is the total flux through the edge in direction of the global edge normal.
/// On a cell with vertices $p_k$ the local basis function of the edge opposite to $p_k$ is
/// $psi_k (x) = s_k (x - p_k) / (2 abs(K))$, where $s_k$ is the relative orientation of the edge.
#[derive(Debug, Clone)]
pub struct RtSpace {
  mesh: Arc<Triangulation>,
}

impl RtSpace {
  pub fn new(mesh: Arc<Triangulation>) -> Self {
    Self { mesh }
  }
  pub fn mesh(&self) -> &Arc<Triangulation> {
    &self.mesh
  }
  pub fn num_dofs(&self) -> usize {
    self.mesh.nedges()
  }
  pub fn local2global(&self, icell: CellIdx) -> [DofIdx; 3] {
    self.mesh.cell_edges(icell)
  }
  pub fn local_signs(&self, icell: CellIdx) -> [f64; 3] {
    [0, 1, 2].map(|k| self.mesh.edge_sign(icell, k))
  }

  /// Local basis functions evaluated at `x`.
  pub fn local_basis(&self, icell: CellIdx, x: &Point) -> [Vector; 3] {
    let geo = self.mesh.cell_geometry(icell);
    let signs = self.local_signs(icell);
    let scale = 1.0 / (2.0 * geo.area());
    [0, 1, 2].map(|k| signs[k] * scale * (x - geo.vertex(k)))
  }

  /// The constant divergences of the local basis functions.
  pub fn local_divergences(&self, icell: CellIdx) -> [f64; 3] {
    let area = self.mesh.cell_geometry(icell).area();
    self.local_signs(icell).map(|s| s / area)
  }

  pub fn evaluate(&self, dofs: &na::DVector<f64>, icell: CellIdx, x: &Point) -> Vector {
    let basis = self.local_basis(icell, x);
    let global = self.local2global(icell);
    (0..3).map(|k| dofs[global[k]] * basis[k]).sum()
  }

  pub fn divergence(&self, dofs: &na::DVector<f64>, icell: CellIdx) -> f64 {
    let divs = self.local_divergences(icell);
    let global = self.local2global(icell);
    (0..3).map(|k| dofs[global[k]] * divs[k]).sum()
  }

  pub fn check_dofs(&self, dofs: &na::DVector<f64>) -> Result<()> {
    check_len(self.num_dofs(), dofs.len())
  }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
  if expected == actual {
    Ok(())
  } else {
    Err(Error::DimensionMismatch { expected, actual })
  }
}

/// Transfers a DG function to a nested finer grid.
///
/// Exact, since piecewise-linear functions on the coarse grid are piecewise linear on any
/// refinement of it.
pub fn prolong(
  coarse_grid: &CartesianGrid,
  coarse_space: &DgSpace,
  coarse_dofs: &na::DVector<f64>,
  fine_space: &DgSpace,
) -> Result<na::DVector<f64>> {
  coarse_space.check_dofs(coarse_dofs)?;
  if !Arc::ptr_eq(coarse_grid.triangulation(), coarse_space.mesh()) {
    return Err(Error::NotNested(
      "coarse space does not live on the coarse grid".to_string(),
    ));
  }
  const TOL: f64 = 1e-10;

  let fine_mesh = fine_space.mesh();
  let mut fine_dofs = na::DVector::zeros(fine_space.num_dofs());
  for icell in 0..fine_mesh.ncells() {
    let fine_geo = fine_mesh.cell_geometry(icell);
    let icoarse = coarse_grid.locate(&fine_geo.centroid())?;
    let coarse_geo = coarse_space.mesh().cell_geometry(icoarse);
    for (k, idof) in fine_space.local2global(icell).into_iter().enumerate() {
      let x = fine_geo.vertex(k);
      if !coarse_geo.contains(&x, TOL) {
        return Err(Error::NotNested(format!(
          "fine cell {icell} is not contained in coarse cell {icoarse}"
        )));
      }
      fine_dofs[idof] = coarse_space.evaluate(coarse_dofs, icoarse, &x);
    }
  }
  Ok(fine_dofs)
}
