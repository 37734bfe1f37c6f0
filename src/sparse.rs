/// Sparse matrix in triplet form, used as the target of assembly.
///
/// Duplicate entries are summed on conversion.
#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows() && c < self.ncols());
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let rows = self.triplets.iter().map(|t| t.0).collect();
    let cols = self.triplets.iter().map(|t| t.1).collect();
    let vals = self.triplets.iter().map(|t| t.2).collect();
    // indices come from the dof maps or are checked on push
    nas::CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals)
      .expect("Triplets are in bounds.")
  }

  pub fn to_nalgebra_csr(&self) -> nas::CsrMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }
}

pub fn csr_triplets(matrix: &nas::CsrMatrix<f64>) -> Vec<(usize, usize, f64)> {
  matrix.triplet_iter().map(|(r, c, &v)| (r, c, v)).collect()
}

/// $u^T A v$
pub fn bilinear_form(mat: &nas::CsrMatrix<f64>, u: &na::DVector<f64>, v: &na::DVector<f64>) -> f64 {
  u.dot(&(mat * v))
}
pub fn quadratic_form(mat: &nas::CsrMatrix<f64>, u: &na::DVector<f64>) -> f64 {
  bilinear_form(mat, u, u)
}

/// Largest absolute deviation from symmetry.
pub fn asymmetry(mat: &nas::CsrMatrix<f64>) -> f64 {
  let transpose = mat.transpose();
  let diff = mat - &transpose;
  diff.values().iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod test {
  use super::{asymmetry, quadratic_form, SparseMatrix};

  #[test]
  fn duplicates_are_summed() {
    let mut mat = SparseMatrix::zeros(2, 2);
    mat.push(0, 0, 1.0);
    mat.push(0, 0, 2.0);
    mat.push(1, 0, 1.0);
    mat.push(0, 1, 1.0);
    mat.push(1, 1, 0.0);
    assert_eq!(mat.triplets().len(), 4);

    let csr = mat.to_nalgebra_csr();
    let dense = mat.to_nalgebra_dense();
    assert_eq!(dense[(0, 0)], 3.0);
    assert_eq!(asymmetry(&csr), 0.0);

    let u = na::DVector::from_vec(vec![1.0, 1.0]);
    assert_eq!(quadratic_form(&csr, &u), 5.0);
  }
}
