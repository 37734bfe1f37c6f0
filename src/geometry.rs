//! Geometry of affine triangles.
//!
//! All quantities are computed from the vertex coordinates of a single cell.
//! Local edge `k` of a triangle is the edge opposite of local vertex `k`.

pub type Point = na::Point2<f64>;
pub type Vector = na::Vector2<f64>;
pub type Tensor = na::Matrix2<f64>;

#[derive(Debug, Clone, Copy)]
pub struct TriangleGeometry {
  vertices: [Point; 3],
}

impl TriangleGeometry {
  pub fn new(vertices: [Point; 3]) -> Self {
    Self { vertices }
  }

  pub fn vertices(&self) -> &[Point; 3] {
    &self.vertices
  }
  pub fn vertex(&self, ivertex: usize) -> Point {
    self.vertices[ivertex]
  }

  /// Columns are the spanning vectors `p_1 - p_0` and `p_2 - p_0`.
  pub fn spanning_vectors(&self) -> na::Matrix2<f64> {
    let [p0, p1, p2] = self.vertices;
    na::Matrix2::from_columns(&[p1 - p0, p2 - p0])
  }

  /// Signed area, positive for counter-clockwise vertex order.
  pub fn signed_area(&self) -> f64 {
    0.5 * self.spanning_vectors().determinant()
  }
  pub fn area(&self) -> f64 {
    self.signed_area().abs()
  }
  pub fn is_ccw(&self) -> bool {
    self.signed_area() > 0.0
  }

  pub fn centroid(&self) -> Point {
    let [p0, p1, p2] = self.vertices;
    Point::from((p0.coords + p1.coords + p2.coords) / 3.0)
  }

  pub fn edge_vertices(&self, iedge: usize) -> [Point; 2] {
    [
      self.vertices[(iedge + 1) % 3],
      self.vertices[(iedge + 2) % 3],
    ]
  }
  pub fn edge_length(&self, iedge: usize) -> f64 {
    let [a, b] = self.edge_vertices(iedge);
    (b - a).norm()
  }
  pub fn edge_midpoint(&self, iedge: usize) -> Point {
    let [a, b] = self.edge_vertices(iedge);
    na::center(&a, &b)
  }
  pub fn edge_midpoints(&self) -> [Point; 3] {
    [0, 1, 2].map(|iedge| self.edge_midpoint(iedge))
  }

  /// Largest edge length.
  pub fn diameter(&self) -> f64 {
    (0..3).map(|iedge| self.edge_length(iedge)).fold(0.0, f64::max)
  }

  /// Outward unit normal of local edge.
  pub fn outward_normal(&self, iedge: usize) -> Vector {
    let [a, b] = self.edge_vertices(iedge);
    let tangent = b - a;
    let normal = Vector::new(tangent.y, -tangent.x).normalize();
    let opposite = self.vertices[iedge];
    if normal.dot(&(a - opposite)) < 0.0 {
      -normal
    } else {
      normal
    }
  }

  /// The constant gradients of the barycentric coordinate functions.
  pub fn bary_gradients(&self) -> [Vector; 3] {
    let ref_grads = [
      Vector::new(-1.0, -1.0),
      Vector::new(1.0, 0.0),
      Vector::new(0.0, 1.0),
    ];
    let inv_transpose = self
      .spanning_vectors()
      .try_inverse()
      .expect("Degenerate triangle.")
      .transpose();
    ref_grads.map(|g| inv_transpose * g)
  }

  pub fn barycentric_coords(&self, x: &Point) -> [f64; 3] {
    let local = self
      .spanning_vectors()
      .try_inverse()
      .expect("Degenerate triangle.")
      * (x - self.vertices[0]);
    [1.0 - local.x - local.y, local.x, local.y]
  }

  pub fn contains(&self, x: &Point, tol: f64) -> bool {
    self.barycentric_coords(x).iter().all(|&l| l >= -tol)
  }
}

/// Smallest eigenvalue of a symmetric 2x2 tensor.
pub fn min_eigenvalue(tensor: &Tensor) -> f64 {
  tensor.symmetric_eigenvalues().min()
}
