//! Reduced basis Galerkin projection of coercive affine models with a residual based
//! error estimator.

use crate::{
  error::{Error, Result},
  linalg::{gram_schmidt, GramSchmidtOptions},
  model::StationaryModel,
  operator::MatrixOperator,
  parameter::{Parameter, ParameterFunctional, ParameterSpace},
};

use std::sync::Arc;

/// Builds [`ReducedModel`]s of a [`StationaryModel`] from a basis orthonormal in `product`.
pub struct CoerciveRbReductor<'a> {
  fom: &'a StationaryModel,
  product: Arc<MatrixOperator>,
  coercivity_estimator: ParameterFunctional,
  basis: na::DMatrix<f64>,
}

impl<'a> CoerciveRbReductor<'a> {
  pub fn new(
    fom: &'a StationaryModel,
    product: Arc<MatrixOperator>,
    coercivity_estimator: ParameterFunctional,
  ) -> Result<Self> {
    if product.dim_source() != fom.dim() {
      return Err(Error::DimensionMismatch {
        expected: fom.dim(),
        actual: product.dim_source(),
      });
    }
    Ok(Self {
      fom,
      product,
      coercivity_estimator,
      basis: na::DMatrix::zeros(fom.dim(), 0),
    })
  }

  pub fn basis(&self) -> &na::DMatrix<f64> {
    &self.basis
  }
  pub fn basis_size(&self) -> usize {
    self.basis.ncols()
  }

  /// Orthonormalizes `u` against the current basis and appends it.
  ///
  /// Fails with [`Error::Extension`] if `u` is numerically contained in the span of the basis.
  pub fn extend_basis(&mut self, u: &na::DVector<f64>) -> Result<()> {
    if u.len() != self.fom.dim() {
      return Err(Error::DimensionMismatch {
        expected: self.fom.dim(),
        actual: u.len(),
      });
    }
    let offset = self.basis.ncols();
    let mut vectors = self.basis.clone().insert_column(offset, 0.0);
    vectors.set_column(offset, u);

    let options = GramSchmidtOptions {
      offset,
      ..Default::default()
    };
    let extended = gram_schmidt(&vectors, Some(&self.product), options)?;
    if extended.ncols() == offset {
      return Err(Error::Extension(
        "snapshot is linearly dependent on the reduced basis".to_string(),
      ));
    }
    self.basis = extended;
    tracing::info!("extended reduced basis to size {}", self.basis.ncols());
    Ok(())
  }

  /// Galerkin projection onto the current basis, including the offline part of the estimator.
  pub fn reduce(&self) -> Result<ReducedModel> {
    let basis = &self.basis;
    let size = basis.ncols();
    tracing::info!("reducing to basis of size {size}");

    let fom_operator = self.fom.operator();
    let operators = fom_operator
      .operators()
      .iter()
      .map(|op| op.apply2_columns(basis, basis))
      .collect::<Result<Vec<_>>>()?;
    let rhs = basis.transpose() * self.fom.rhs();

    // Riesz representatives of f and of A_q v_i
    let nops = operators.len();
    let mut representatives = na::DMatrix::zeros(self.fom.dim(), 1 + nops * size);
    representatives.set_column(0, &self.product.apply_inverse(self.fom.rhs())?);
    for (q, op) in fom_operator.operators().iter().enumerate() {
      let images = op.apply_columns(basis)?;
      for (i, image) in images.column_iter().enumerate() {
        let representative = self.product.apply_inverse(&image.into_owned())?;
        representatives.set_column(1 + q * size + i, &representative);
      }
    }
    let residual_gram = self.product.apply2_columns(&representatives, &representatives)?;

    Ok(ReducedModel {
      operators,
      coefficients: fom_operator.coefficients().to_vec(),
      rhs,
      residual_gram,
      coercivity_estimator: self.coercivity_estimator.clone(),
      parameter_space: self.fom.parameter_space().clone(),
    })
  }

  /// Lifts reduced coefficients to the full order space.
  pub fn reconstruct(&self, u_rb: &na::DVector<f64>) -> Result<na::DVector<f64>> {
    if u_rb.len() != self.basis.ncols() {
      return Err(Error::DimensionMismatch {
        expected: self.basis.ncols(),
        actual: u_rb.len(),
      });
    }
    Ok(&self.basis * u_rb)
  }
}

/// Dense reduced model $sum_q theta_q (mu) V^T A_q V u_N = V^T f$.
#[derive(Debug, Clone)]
pub struct ReducedModel {
  operators: Vec<na::DMatrix<f64>>,
  coefficients: Vec<ParameterFunctional>,
  rhs: na::DVector<f64>,
  /// Gramian of the Riesz representatives of $f$ and all $A_q v_i$.
  residual_gram: na::DMatrix<f64>,
  coercivity_estimator: ParameterFunctional,
  parameter_space: ParameterSpace,
}

impl ReducedModel {
  pub fn dim(&self) -> usize {
    self.rhs.len()
  }
  pub fn parameter_space(&self) -> &ParameterSpace {
    &self.parameter_space
  }

  pub fn solve(&self, mu: &Parameter) -> Result<na::DVector<f64>> {
    self.parameter_space.check(mu)?;
    let n = self.dim();
    if n == 0 {
      return Ok(na::DVector::zeros(0));
    }
    let mut lhs = na::DMatrix::zeros(n, n);
    for (op, theta) in self.operators.iter().zip(&self.coefficients) {
      lhs += theta.evaluate(mu)? * op;
    }
    lhs
      .lu()
      .solve(&self.rhs)
      .ok_or_else(|| Error::Factorization(format!("reduced system is singular for {mu}")))
  }

  /// Dual norm of the residual divided by the coercivity lower bound.
  pub fn estimate(&self, mu: &Parameter) -> Result<f64> {
    let u = self.solve(mu)?;
    self.estimate_for(&u, mu)
  }

  /// Error estimate of given reduced coefficients.
  pub fn estimate_for(&self, u: &na::DVector<f64>, mu: &Parameter) -> Result<f64> {
    let n = self.dim();
    if u.len() != n {
      return Err(Error::DimensionMismatch {
        expected: n,
        actual: u.len(),
      });
    }
    let mut weights = na::DVector::zeros(1 + self.operators.len() * n);
    weights[0] = 1.0;
    for (q, theta) in self.coefficients.iter().enumerate() {
      let theta = theta.evaluate(mu)?;
      weights.rows_mut(1 + q * n, n).copy_from(&(-theta * u));
    }
    let residual_norm = weights.dot(&(&self.residual_gram * &weights)).max(0.0).sqrt();

    let alpha = self.coercivity_estimator.evaluate(mu)?;
    if !(alpha > 0.0) {
      return Err(Error::Config(format!(
        "coercivity estimate {alpha} is not positive for {mu}"
      )));
    }
    Ok(residual_norm / alpha)
  }
}
