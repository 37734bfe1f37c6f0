//! Linear operators, their parametric linear combinations and products.

use crate::{
  error::{Error, Result},
  lse::FaerCholesky,
  parameter::{Parameter, ParameterFunctional},
  sparse,
};

use once_cell::sync::OnceCell;

/// A sparse matrix acting on coefficient vectors.
///
/// The Cholesky factorization used by [`MatrixOperator::apply_inverse`] is computed on first use.
pub struct MatrixOperator {
  matrix: nas::CsrMatrix<f64>,
  cholesky: OnceCell<FaerCholesky>,
}

impl MatrixOperator {
  pub fn new(matrix: nas::CsrMatrix<f64>) -> Self {
    Self {
      matrix,
      cholesky: OnceCell::new(),
    }
  }

  pub fn matrix(&self) -> &nas::CsrMatrix<f64> {
    &self.matrix
  }
  pub fn dim_source(&self) -> usize {
    self.matrix.ncols()
  }
  pub fn dim_range(&self) -> usize {
    self.matrix.nrows()
  }

  pub fn apply(&self, u: &na::DVector<f64>) -> Result<na::DVector<f64>> {
    check_dim(self.dim_source(), u.len())?;
    Ok(&self.matrix * u)
  }

  /// Applies every column.
  pub fn apply_columns(&self, us: &na::DMatrix<f64>) -> Result<na::DMatrix<f64>> {
    check_dim(self.dim_source(), us.nrows())?;
    Ok(&self.matrix * us)
  }

  /// $v^T A u$
  pub fn apply2(&self, v: &na::DVector<f64>, u: &na::DVector<f64>) -> Result<f64> {
    check_dim(self.dim_range(), v.len())?;
    check_dim(self.dim_source(), u.len())?;
    Ok(sparse::bilinear_form(&self.matrix, v, u))
  }

  /// Gramian $V^T A U$ of column sets.
  pub fn apply2_columns(&self, vs: &na::DMatrix<f64>, us: &na::DMatrix<f64>) -> Result<na::DMatrix<f64>> {
    check_dim(self.dim_range(), vs.nrows())?;
    Ok(vs.transpose() * self.apply_columns(us)?)
  }

  pub fn apply_inverse(&self, rhs: &na::DVector<f64>) -> Result<na::DVector<f64>> {
    self.factorization()?.solve(rhs)
  }

  pub fn factorization(&self) -> Result<&FaerCholesky> {
    self.cholesky.get_or_try_init(|| {
      tracing::debug!("factorizing {}x{} matrix", self.dim_range(), self.dim_source());
      FaerCholesky::new(&self.matrix)
    })
  }

  /// Norm induced by the operator seen as a product.
  pub fn induced_norm(&self, u: &na::DVector<f64>) -> Result<f64> {
    Ok(self.apply2(u, u)?.max(0.0).sqrt())
  }
}

/// Parametric operator $A(mu) = sum_q theta_q (mu) A_q$.
pub struct LincombOperator {
  operators: Vec<MatrixOperator>,
  coefficients: Vec<ParameterFunctional>,
}

impl LincombOperator {
  pub fn new(operators: Vec<MatrixOperator>, coefficients: Vec<ParameterFunctional>) -> Result<Self> {
    if operators.len() != coefficients.len() {
      return Err(Error::DimensionMismatch {
        expected: operators.len(),
        actual: coefficients.len(),
      });
    }
    if let Some(first) = operators.first() {
      for op in &operators {
        check_dim(first.dim_source(), op.dim_source())?;
        check_dim(first.dim_range(), op.dim_range())?;
      }
    }
    Ok(Self {
      operators,
      coefficients,
    })
  }

  pub fn operators(&self) -> &[MatrixOperator] {
    &self.operators
  }
  pub fn coefficients(&self) -> &[ParameterFunctional] {
    &self.coefficients
  }
  pub fn dim_source(&self) -> usize {
    self.operators.first().map_or(0, |op| op.dim_source())
  }

  pub fn evaluate_coefficients(&self, mu: &Parameter) -> Result<Vec<f64>> {
    self
      .coefficients
      .iter()
      .map(|theta| theta.evaluate(mu))
      .collect()
  }

  /// The matrix of the operator for a fixed parameter.
  pub fn assemble(&self, mu: &Parameter) -> Result<MatrixOperator> {
    let thetas = self.evaluate_coefficients(mu)?;
    let mut ops = self.operators.iter().zip(thetas);
    let (first, theta) = ops
      .next()
      .ok_or_else(|| Error::Config("empty linear combination".to_string()))?;
    let mut matrix = first.matrix() * theta;
    for (op, theta) in ops {
      matrix = &matrix + &(op.matrix() * theta);
    }
    Ok(MatrixOperator::new(matrix))
  }

  pub fn apply(&self, u: &na::DVector<f64>, mu: &Parameter) -> Result<na::DVector<f64>> {
    let thetas = self.evaluate_coefficients(mu)?;
    let mut result = na::DVector::zeros(u.len());
    for (op, theta) in self.operators.iter().zip(thetas) {
      result += theta * op.apply(u)?;
    }
    Ok(result)
  }
}

fn check_dim(expected: usize, actual: usize) -> Result<()> {
  if expected == actual {
    Ok(())
  } else {
    Err(Error::DimensionMismatch { expected, actual })
  }
}

#[cfg(test)]
mod test {
  use super::{LincombOperator, MatrixOperator};
  use crate::{
    parameter::{Parameter, ParameterFunctional},
    sparse::SparseMatrix,
  };
  use approx::assert_relative_eq;

  fn diagonal(values: &[f64]) -> MatrixOperator {
    let mut mat = SparseMatrix::zeros(values.len(), values.len());
    for (i, &v) in values.iter().enumerate() {
      mat.push(i, i, v);
    }
    MatrixOperator::new(mat.to_nalgebra_csr())
  }

  #[test]
  fn lincomb_assembles_and_applies() {
    let op = LincombOperator::new(
      vec![diagonal(&[1.0, 2.0]), diagonal(&[3.0, 0.5])],
      vec![
        ParameterFunctional::Constant(1.0),
        ParameterFunctional::projection("switch"),
      ],
    )
    .unwrap();
    let mu = Parameter::scalar("switch", 2.0);
    let u = na::DVector::from_vec(vec![1.0, -1.0]);

    let assembled = op.assemble(&mu).unwrap();
    let expected = na::DVector::from_vec(vec![7.0, -3.0]);
    assert_relative_eq!(assembled.apply(&u).unwrap(), expected);
    assert_relative_eq!(op.apply(&u, &mu).unwrap(), expected);

    let solved = assembled.apply_inverse(&expected).unwrap();
    assert_relative_eq!(solved, u, epsilon = 1e-12);
  }

  #[test]
  fn mismatched_lincomb_is_rejected() {
    let result = LincombOperator::new(
      vec![diagonal(&[1.0]), diagonal(&[1.0, 1.0])],
      vec![
        ParameterFunctional::Constant(1.0),
        ParameterFunctional::Constant(1.0),
      ],
    );
    assert!(result.is_err());
  }
}
