//! Sparse linear system solvers, backed by faer.

use crate::{
  error::{Error, Result},
  sparse::csr_triplets,
};

use faer::solvers::SpSolver;

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: &nas::CsrMatrix<f64>) -> Result<SparseMatrixFaer> {
  SparseMatrixFaer::try_new_from_triplets(m.nrows(), m.ncols(), &csr_triplets(m))
    .map_err(|e| Error::Factorization(format!("invalid sparse matrix: {e:?}")))
}

/// Sparse Cholesky factorization of a symmetric positive definite matrix.
pub struct FaerCholesky {
  raw: faer::sparse::linalg::solvers::Cholesky<usize, f64>,
  ndofs: usize,
}
impl FaerCholesky {
  pub fn new(a: &nas::CsrMatrix<f64>) -> Result<Self> {
    if a.nrows() != a.ncols() {
      return Err(Error::DimensionMismatch {
        expected: a.nrows(),
        actual: a.ncols(),
      });
    }
    let raw = nalgebra2faer(a)?
      .sp_cholesky(faer::Side::Lower)
      .map_err(|e| Error::Factorization(format!("{e:?}")))?;
    Ok(Self {
      raw,
      ndofs: a.nrows(),
    })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> Result<na::DVector<f64>> {
    if b.len() != self.ndofs {
      return Err(Error::DimensionMismatch {
        expected: self.ndofs,
        actual: b.len(),
      });
    }
    let b = faer::col::from_slice(b.as_slice());
    Ok(na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec()))
  }
}
