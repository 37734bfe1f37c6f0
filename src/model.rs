//! Full order model of the parametric SWIPDG discretization.

use crate::{
  assemble::{assemble_dg_product_matrix, assemble_l2_vector, assemble_swipdg_matrix},
  error::{Error, Result},
  mesh::cartesian::CartesianGrid,
  operator::{LincombOperator, MatrixOperator},
  parameter::{Parameter, ParameterSpace},
  problems::AffineDiffusionProblem,
  space::DgSpace,
};

use indexmap::IndexMap;
use std::sync::Arc;

pub const H1_PENALTY_PRODUCT: &str = "h1_penalty";

/// $A(mu) u = f$ with an affinely decomposed operator.
pub struct StationaryModel {
  operator: LincombOperator,
  rhs: na::DVector<f64>,
  products: IndexMap<String, Arc<MatrixOperator>>,
  parameter_space: ParameterSpace,
}

impl StationaryModel {
  pub fn new(
    operator: LincombOperator,
    rhs: na::DVector<f64>,
    products: IndexMap<String, Arc<MatrixOperator>>,
    parameter_space: ParameterSpace,
  ) -> Result<Self> {
    if operator.dim_source() != rhs.len() {
      return Err(Error::DimensionMismatch {
        expected: operator.dim_source(),
        actual: rhs.len(),
      });
    }
    Ok(Self {
      operator,
      rhs,
      products,
      parameter_space,
    })
  }

  pub fn operator(&self) -> &LincombOperator {
    &self.operator
  }
  pub fn rhs(&self) -> &na::DVector<f64> {
    &self.rhs
  }
  pub fn parameter_space(&self) -> &ParameterSpace {
    &self.parameter_space
  }
  pub fn dim(&self) -> usize {
    self.rhs.len()
  }
  pub fn products(&self) -> &IndexMap<String, Arc<MatrixOperator>> {
    &self.products
  }
  pub fn product(&self, name: &str) -> Result<&Arc<MatrixOperator>> {
    self
      .products
      .get(name)
      .ok_or_else(|| Error::Config(format!("model has no product `{name}`")))
  }

  pub fn solve(&self, mu: &Parameter) -> Result<na::DVector<f64>> {
    self.parameter_space.check(mu)?;
    tracing::debug!("solving full order model for {mu}");
    self.operator.assemble(mu)?.apply_inverse(&self.rhs)
  }
}

pub struct Discretization {
  pub grid: CartesianGrid,
  pub dg_space: DgSpace,
  /// The `h1_penalty` product, with the diffusion at $bar(mu)$.
  pub dg_product: Arc<MatrixOperator>,
  pub fom: StationaryModel,
}

/// Assembles the full order model on the base grid of `problem` refined `refinements` times.
pub fn discretize(
  problem: &AffineDiffusionProblem,
  mu_bar: &Parameter,
  penalty: f64,
  refinements: usize,
) -> Result<Discretization> {
  let mut grid = CartesianGrid::new(problem.lower_left, problem.upper_right, problem.num_elements)?;
  grid.refine(refinements);
  let dg_space = DgSpace::new(grid.triangulation().clone());
  let mesh = dg_space.mesh();
  problem.check_ellipticity(mesh)?;

  let operators = problem
    .diffusion_components(mesh)
    .iter()
    .map(|diffusion| MatrixOperator::new(assemble_swipdg_matrix(&dg_space, diffusion, penalty)))
    .collect();
  let operator = LincombOperator::new(operators, problem.factor_coefficients.clone())?;
  let rhs = assemble_l2_vector(&dg_space, &problem.force);

  let diffusion_bar = problem.diffusion(mesh, mu_bar)?;
  let dg_product = Arc::new(MatrixOperator::new(assemble_dg_product_matrix(
    &dg_space,
    &diffusion_bar,
    penalty,
  )));

  let mut products = IndexMap::new();
  products.insert(H1_PENALTY_PRODUCT.to_string(), dg_product.clone());
  let fom = StationaryModel::new(operator, rhs, products, problem.parameter_space.clone())?;

  Ok(Discretization {
    grid,
    dg_space,
    dg_product,
    fom,
  })
}
