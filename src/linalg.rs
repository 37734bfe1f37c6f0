use crate::{error::Result, operator::MatrixOperator};

/// Inner product given by an optional product operator, Euclidean otherwise.
pub fn inner(product: Option<&MatrixOperator>, u: &na::DVector<f64>, v: &na::DVector<f64>) -> Result<f64> {
  match product {
    Some(product) => product.apply2(u, v),
    None => Ok(u.dot(v)),
  }
}

pub fn norm(product: Option<&MatrixOperator>, u: &na::DVector<f64>) -> Result<f64> {
  Ok(inner(product, u, u)?.max(0.0).sqrt())
}

#[derive(Debug, Clone, Copy)]
pub struct GramSchmidtOptions {
  /// Vectors with smaller norm after orthogonalization are removed.
  pub atol: f64,
  /// Vectors whose norm shrinks by more than this factor are removed.
  pub rtol: f64,
  /// Orthogonalize again if the norm shrinks by more than this factor.
  pub reiteration_threshold: f64,
  /// The first `offset` columns are assumed to be orthonormal already.
  pub offset: usize,
}
impl Default for GramSchmidtOptions {
  fn default() -> Self {
    Self {
      atol: 1e-13,
      rtol: 1e-13,
      reiteration_threshold: 1e-1,
      offset: 0,
    }
  }
}

const MAX_ITERATIONS: usize = 3;

/// Modified Gram-Schmidt with re-orthogonalization.
///
/// Returns the orthonormalized columns; linearly dependent columns are dropped.
pub fn gram_schmidt(
  vectors: &na::DMatrix<f64>,
  product: Option<&MatrixOperator>,
  options: GramSchmidtOptions,
) -> Result<na::DMatrix<f64>> {
  let mut basis: Vec<na::DVector<f64>> = vectors
    .column_iter()
    .take(options.offset)
    .map(|c| c.into_owned())
    .collect();

  for (icol, column) in vectors.column_iter().enumerate().skip(options.offset) {
    let mut v = column.into_owned();
    let initial_norm = norm(product, &v)?;
    if initial_norm < options.atol {
      tracing::info!("removing vector {icol} of norm {initial_norm:.3e}");
      continue;
    }
    v /= initial_norm;

    // absolute norm of the remainder
    let mut scale = initial_norm;
    let mut iterations = 0;
    let accepted = loop {
      iterations += 1;
      for b in &basis {
        let p = inner(product, b, &v)?;
        v.axpy(-p, b, 1.0);
      }
      let new_norm = norm(product, &v)?;
      scale *= new_norm;
      if scale < options.atol || scale < options.rtol * initial_norm {
        break false;
      }
      v /= new_norm;
      if new_norm >= options.reiteration_threshold || iterations >= MAX_ITERATIONS {
        break true;
      }
      tracing::debug!("orthonormalizing vector {icol} again");
    };

    if accepted {
      basis.push(v);
    } else {
      tracing::info!("removing linearly dependent vector {icol}");
    }
  }

  let nrows = vectors.nrows();
  if basis.is_empty() {
    return Ok(na::DMatrix::zeros(nrows, 0));
  }
  Ok(na::DMatrix::from_columns(&basis))
}

#[cfg(test)]
mod test {
  use super::{gram_schmidt, GramSchmidtOptions};
  use crate::{operator::MatrixOperator, sparse::SparseMatrix};
  use approx::assert_relative_eq;

  #[test]
  fn euclidean_orthonormalization_drops_dependent_vectors() {
    #[rustfmt::skip]
    let vectors = na::DMatrix::from_column_slice(3, 3, &[
      1.0, 1.0, 0.0,
      2.0, 2.0, 0.0,
      1.0, 0.0, 1.0,
    ]);
    let basis = gram_schmidt(&vectors, None, GramSchmidtOptions::default()).unwrap();
    assert_eq!(basis.ncols(), 2);
    let gram = basis.transpose() * &basis;
    assert_relative_eq!(gram, na::DMatrix::identity(2, 2), epsilon = 1e-12);
  }

  #[test]
  fn orthonormal_in_product() {
    let mut product = SparseMatrix::zeros(2, 2);
    product.push(0, 0, 4.0);
    product.push(1, 1, 1.0);
    product.push(0, 1, 1.0);
    product.push(1, 0, 1.0);
    let product = MatrixOperator::new(product.to_nalgebra_csr());

    let vectors = na::DMatrix::from_column_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
    let basis = gram_schmidt(&vectors, Some(&product), GramSchmidtOptions::default()).unwrap();
    let gram = product.apply2_columns(&basis, &basis).unwrap();
    assert_relative_eq!(gram, na::DMatrix::identity(2, 2), epsilon = 1e-12);
  }

  #[test]
  fn offset_keeps_existing_columns() {
    let vectors = na::DMatrix::from_column_slice(2, 2, &[0.0, 1.0, 3.0, 3.0]);
    let options = GramSchmidtOptions {
      offset: 1,
      ..Default::default()
    };
    let basis = gram_schmidt(&vectors, None, options).unwrap();
    assert_relative_eq!(basis.column(0).into_owned(), na::DVector::from_vec(vec![0.0, 1.0]));
    assert_relative_eq!(basis.column(1).into_owned(), na::DVector::from_vec(vec![1.0, 0.0]), epsilon = 1e-12);
  }
}
