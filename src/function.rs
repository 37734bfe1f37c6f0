//! Scalar and tensor valued data functions on the physical domain.
//!
//! All data of the experiment is piecewise constant on boxes aligned with the grid,
//! so grid functions are represented by their value in each cell, taken at the cell centroid.

use crate::{
  error::{Error, Result},
  geometry::{Point, Tensor},
  mesh::Triangulation,
};

use std::{
  ops::{Add, Mul},
  path::Path,
};

pub trait Function: Send + Sync {
  fn evaluate(&self, x: &Point) -> f64;
}

impl<F> Function for F
where
  F: Fn(&Point) -> f64 + Send + Sync,
{
  fn evaluate(&self, x: &Point) -> f64 {
    self(x)
  }
}

/// Half-open axis-aligned box `[x0, x1) x [y0, y1)`.
///
/// Boxes sharing a side never both contain a point on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2 {
  pub min: [f64; 2],
  pub max: [f64; 2],
}
impl Box2 {
  pub fn new(xrange: [f64; 2], yrange: [f64; 2]) -> Self {
    Self {
      min: [xrange[0], yrange[0]],
      max: [xrange[1], yrange[1]],
    }
  }
  pub fn contains(&self, x: &Point) -> bool {
    self.min[0] <= x.x && x.x < self.max[0] && self.min[1] <= x.y && x.y < self.max[1]
  }
}

/// Sum of weighted box indicators.
///
/// Where boxes overlap, the values add up.
#[derive(Debug, Clone)]
pub struct IndicatorFunction {
  name: String,
  boxes: Vec<(Box2, f64)>,
}
impl IndicatorFunction {
  pub fn new(boxes: Vec<(Box2, f64)>, name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      boxes,
    }
  }
  pub fn name(&self) -> &str {
    &self.name
  }
  pub fn boxes(&self) -> &[(Box2, f64)] {
    &self.boxes
  }
}
impl Function for IndicatorFunction {
  fn evaluate(&self, x: &Point) -> f64 {
    self
      .boxes
      .iter()
      .filter(|(b, _)| b.contains(x))
      .map(|(_, v)| v)
      .sum()
  }
}

/// Arithmetic expression tree over data functions.
#[derive(Debug, Clone)]
pub enum Expression {
  Constant(f64),
  Indicator(IndicatorFunction),
  Sum(Box<Expression>, Box<Expression>),
  Product(Box<Expression>, Box<Expression>),
}

impl Expression {
  pub fn constant(value: f64) -> Self {
    Self::Constant(value)
  }
}

impl From<IndicatorFunction> for Expression {
  fn from(indicator: IndicatorFunction) -> Self {
    Self::Indicator(indicator)
  }
}

impl Function for Expression {
  fn evaluate(&self, x: &Point) -> f64 {
    match self {
      Self::Constant(value) => *value,
      Self::Indicator(indicator) => indicator.evaluate(x),
      Self::Sum(a, b) => a.evaluate(x) + b.evaluate(x),
      Self::Product(a, b) => a.evaluate(x) * b.evaluate(x),
    }
  }
}

impl<T: Into<Expression>> Add<T> for Expression {
  type Output = Expression;
  fn add(self, rhs: T) -> Self::Output {
    Expression::Sum(Box::new(self), Box::new(rhs.into()))
  }
}
impl<T: Into<Expression>> Mul<T> for Expression {
  type Output = Expression;
  fn mul(self, rhs: T) -> Self::Output {
    Expression::Product(Box::new(self), Box::new(rhs.into()))
  }
}

/// Cellwise constant grid function, evaluated at the cell centroids.
pub fn interpolate_p0(mesh: &Triangulation, f: &dyn Function) -> na::DVector<f64> {
  na::DVector::from_iterator(
    mesh.ncells(),
    (0..mesh.ncells()).map(|icell| f.evaluate(&mesh.cell_geometry(icell).centroid())),
  )
}

/// Symmetric positive definite diffusion tensor field.
#[derive(Debug, Clone)]
pub enum DiffusionTensor {
  Constant(Tensor),
  Spe10Model1(Spe10Model1),
}

impl Default for DiffusionTensor {
  fn default() -> Self {
    Self::Constant(Tensor::identity())
  }
}

impl DiffusionTensor {
  pub fn evaluate(&self, x: &Point) -> Tensor {
    match self {
      Self::Constant(tensor) => *tensor,
      Self::Spe10Model1(spe10) => spe10.evaluate(x),
    }
  }
}

/// Cellwise constant tensor field, evaluated at the cell centroids.
pub fn interpolate_tensor_p0(mesh: &Triangulation, tensor: &DiffusionTensor) -> Vec<Tensor> {
  (0..mesh.ncells())
    .map(|icell| tensor.evaluate(&mesh.cell_geometry(icell).centroid()))
    .collect()
}

/// Permeability of the first SPE10 benchmark model.
///
/// A `100 x 20` cell field on `[0,5] x [0,1]`, isotropic in each cell.
#[derive(Debug, Clone)]
pub struct Spe10Model1 {
  lower_left: [f64; 2],
  upper_right: [f64; 2],
  permeability: Vec<f64>,
  min: f64,
  max: f64,
}

impl Spe10Model1 {
  pub const NCELLS: [usize; 2] = [100, 20];
  pub const DOMAIN: [[f64; 2]; 2] = [[0.0, 0.0], [5.0, 1.0]];

  /// Permeability values, first axis running fastest.
  ///
  /// Values are clamped to `[min, max]`.
  pub fn new(permeability: Vec<f64>, min: f64, max: f64) -> Result<Self> {
    let expected = Self::NCELLS[0] * Self::NCELLS[1];
    if permeability.len() != expected {
      return Err(Error::DimensionMismatch {
        expected,
        actual: permeability.len(),
      });
    }
    if !(0.0 < min && min <= max) {
      return Err(Error::Config(format!(
        "invalid permeability bounds [{min}, {max}]"
      )));
    }
    let permeability = permeability.into_iter().map(|k| k.clamp(min, max)).collect();
    Ok(Self {
      lower_left: Self::DOMAIN[0],
      upper_right: Self::DOMAIN[1],
      permeability,
      min,
      max,
    })
  }

  /// Reads whitespace separated ASCII values.
  pub fn from_file(path: impl AsRef<Path>, min: f64, max: f64) -> Result<Self> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let values = content
      .split_whitespace()
      .map(|token| {
        token
          .parse::<f64>()
          .map_err(|e| Error::Parse(format!("`{token}`: {e}")))
      })
      .collect::<Result<Vec<_>>>()?;
    tracing::info!(
      "read {} permeability values from {}",
      values.len(),
      path.as_ref().display()
    );
    Self::new(values, min, max)
  }

  pub fn bounds(&self) -> (f64, f64) {
    (self.min, self.max)
  }

  pub fn evaluate(&self, x: &Point) -> Tensor {
    let cell = [0, 1].map(|d| {
      let width = (self.upper_right[d] - self.lower_left[d]) / Self::NCELLS[d] as f64;
      let i = ((x[d] - self.lower_left[d]) / width).floor().max(0.0) as usize;
      i.min(Self::NCELLS[d] - 1)
    });
    let k = self.permeability[cell[1] * Self::NCELLS[0] + cell[0]];
    Tensor::identity() * k
  }
}

#[cfg(test)]
mod test {
  use super::{Box2, Expression, Function, IndicatorFunction, Spe10Model1};
  use crate::geometry::Point;
  use approx::assert_relative_eq;

  fn indicator() -> IndicatorFunction {
    IndicatorFunction::new(
      vec![
        (Box2::new([0.0, 1.0], [0.0, 1.0]), 2.0),
        (Box2::new([0.5, 1.5], [0.0, 1.0]), -1.0),
      ],
      "test",
    )
  }

  #[test]
  fn indicator_values_add_up() {
    let f = indicator();
    assert_eq!(f.evaluate(&Point::new(0.25, 0.5)), 2.0);
    assert_eq!(f.evaluate(&Point::new(0.75, 0.5)), 1.0);
    assert_eq!(f.evaluate(&Point::new(1.25, 0.5)), -1.0);
    assert_eq!(f.evaluate(&Point::new(3.0, 0.5)), 0.0);
  }

  #[test]
  fn adjacent_boxes_do_not_overlap() {
    let f = IndicatorFunction::new(
      vec![
        (Box2::new([0.0, 0.05], [0.0, 0.05]), -2.0),
        (Box2::new([0.05, 0.1], [0.0, 0.05]), -2.0),
        (Box2::new([0.0, 0.05], [0.05, 0.1]), -2.0),
      ],
      "channel",
    );
    assert_eq!(f.evaluate(&Point::new(0.05, 0.025)), -2.0);
    assert_eq!(f.evaluate(&Point::new(0.025, 0.05)), -2.0);
    assert_eq!(f.evaluate(&Point::new(0.05, 0.05)), 0.0);
    assert_eq!(f.evaluate(&Point::new(0.0, 0.0)), -2.0);
  }

  #[test]
  fn expression_algebra() {
    let chi = Expression::from(indicator());
    let kappa = Expression::constant(1.0) + Expression::constant(0.5) * chi;
    assert_relative_eq!(kappa.evaluate(&Point::new(0.25, 0.5)), 2.0);
    assert_relative_eq!(kappa.evaluate(&Point::new(3.0, 0.5)), 1.0);
  }

  #[test]
  fn spe10_lookup_and_clamping() {
    let mut values = vec![1.0; 2000];
    values[0] = 1e-9;
    values[2 * 100 + 3] = 7.0;
    let spe10 = Spe10Model1::new(values, 1e-3, 1e3).unwrap();
    assert_relative_eq!(spe10.evaluate(&Point::new(0.01, 0.01))[(0, 0)], 1e-3);
    assert_relative_eq!(spe10.evaluate(&Point::new(0.17, 0.12))[(1, 1)], 7.0);
    assert_relative_eq!(spe10.evaluate(&Point::new(0.17, 0.12))[(0, 1)], 0.0);
  }

  #[test]
  fn spe10_rejects_wrong_size() {
    assert!(Spe10Model1::new(vec![1.0; 10], 1e-3, 1e3).is_err());
  }
}
