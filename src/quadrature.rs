use crate::geometry::{Point, TriangleGeometry};

/// A quadrature rule on a line segment, given on the reference interval `[0,1]`.
pub struct EdgeQuadRule {
  nodes: Vec<f64>,
  weights: Vec<f64>,
}
impl EdgeQuadRule {
  /// Two point Gauss-Legendre rule. Exact for cubic polynomials.
  pub fn gauss2() -> Self {
    let offset = 0.5 / 3f64.sqrt();
    Self {
      nodes: vec![0.5 - offset, 0.5 + offset],
      weights: vec![0.5, 0.5],
    }
  }

  /// Physical quadrature points and weights on the segment `[a, b]`.
  pub fn points(&self, a: &Point, b: &Point) -> Vec<(Point, f64)> {
    let length = (b - a).norm();
    self
      .nodes
      .iter()
      .zip(self.weights.iter())
      .map(|(&s, &w)| (a + s * (b - a), w * length))
      .collect()
  }

  pub fn apply<F>(&self, a: &Point, b: &Point, f: F) -> f64
  where
    F: Fn(&Point) -> f64,
  {
    self.points(a, b).iter().map(|(x, w)| w * f(x)).sum()
  }
}

/// Edge midpoint rule on a triangle. Exact for quadratic polynomials.
pub fn triangle_midpoint_rule(geo: &TriangleGeometry) -> [(Point, f64); 3] {
  let weight = geo.area() / 3.0;
  geo.edge_midpoints().map(|m| (m, weight))
}

pub fn integrate_triangle<F>(geo: &TriangleGeometry, f: F) -> f64
where
  F: Fn(&Point) -> f64,
{
  triangle_midpoint_rule(geo)
    .iter()
    .map(|(x, w)| w * f(x))
    .sum()
}

#[cfg(test)]
mod test {
  use super::{integrate_triangle, EdgeQuadRule};
  use crate::geometry::{Point, TriangleGeometry};
  use approx::assert_relative_eq;

  #[test]
  fn gauss2_integrates_cubics() {
    let rule = EdgeQuadRule::gauss2();
    let a = Point::new(0.0, 0.0);
    let b = Point::new(2.0, 0.0);
    let integral = rule.apply(&a, &b, |x| x.x.powi(3) - x.x);
    assert_relative_eq!(integral, 4.0 - 2.0, epsilon = 1e-13);
  }

  #[test]
  fn midpoint_rule_integrates_quadratics() {
    let geo = TriangleGeometry::new([
      Point::new(0.0, 0.0),
      Point::new(1.0, 0.0),
      Point::new(0.0, 1.0),
    ]);
    // int_T x^2 = 1/12, int_T x y = 1/24
    assert_relative_eq!(integrate_triangle(&geo, |x| x.x * x.x), 1.0 / 12.0, epsilon = 1e-14);
    assert_relative_eq!(integrate_triangle(&geo, |x| x.x * x.y), 1.0 / 24.0, epsilon = 1e-14);
  }
}
