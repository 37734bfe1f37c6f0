use super::{CellIdx, Triangulation, VertexIdx};
use crate::{
  error::{Error, Result},
  geometry::Point,
};

use std::sync::Arc;

/// converts cartesian index to linear index
///
/// converts cartesian index `(i, j)` in `(0..dim_len[0], 0..dim_len[1])` to linear index with
/// the first axis running fastest
pub fn cartesian_index2linear_index(cart_idx: [usize; 2], dim_len: [usize; 2]) -> usize {
  debug_assert!(cart_idx[0] < dim_len[0] && cart_idx[1] < dim_len[1]);
  cart_idx[1] * dim_len[0] + cart_idx[0]
}

/// converts linear index to cartesian index
pub fn linear_index2cartesian_index(lin_idx: usize, dim_len: [usize; 2]) -> [usize; 2] {
  [lin_idx % dim_len[0], lin_idx / dim_len[0]]
}

pub struct Rect {
  min: Point,
  max: Point,
}
impl Rect {
  pub fn new_min_max(min: Point, max: Point) -> Result<Self> {
    if !(min.x < max.x && min.y < max.y) {
      return Err(Error::Config(format!(
        "degenerate rectangle [{}, {}] x [{}, {}]",
        min.x, max.x, min.y, max.y
      )));
    }
    Ok(Self { min, max })
  }
  pub fn min(&self) -> &Point {
    &self.min
  }
  pub fn max(&self) -> &Point {
    &self.max
  }
  pub fn side_lengths(&self) -> na::Vector2<f64> {
    self.max - self.min
  }
}

/// Grid provider for a structured simplicial grid of a rectangle.
///
/// The rectangle is divided into `nrects[0] x nrects[1]` axis-aligned boxes,
/// each of which is split along its lower-left to upper-right diagonal into two triangles.
/// Cell `2 * r + t` is triangle `t` (0 below, 1 above the diagonal) of box `r`.
pub struct CartesianGrid {
  rect: Rect,
  nrects: [usize; 2],
  triangulation: Arc<Triangulation>,
}

// constructors
impl CartesianGrid {
  pub fn new(lower_left: [f64; 2], upper_right: [f64; 2], nrects: [usize; 2]) -> Result<Self> {
    let rect = Rect::new_min_max(Point::from(lower_left), Point::from(upper_right))?;
    if nrects.iter().any(|&n| n == 0) {
      return Err(Error::Config(format!(
        "number of elements per axis must be positive, got {nrects:?}"
      )));
    }
    let triangulation = Arc::new(build_triangulation(&rect, nrects));
    Ok(Self {
      rect,
      nrects,
      triangulation,
    })
  }

  /// Uniform red refinement.
  ///
  /// Every level halves the mesh width, so every triangle is replaced by four.
  /// On this structured grid this coincides with doubling the number of boxes per axis.
  pub fn refine(&mut self, levels: usize) {
    if levels == 0 {
      return;
    }
    let factor = 1 << levels;
    self.nrects = self.nrects.map(|n| n * factor);
    self.triangulation = Arc::new(build_triangulation(&self.rect, self.nrects));
    tracing::debug!(
      "refined grid {levels} times to {}x{} boxes",
      self.nrects[0],
      self.nrects[1]
    );
  }
}

// getters
impl CartesianGrid {
  pub fn rect(&self) -> &Rect {
    &self.rect
  }
  pub fn nrects(&self) -> [usize; 2] {
    self.nrects
  }
  pub fn num_elements(&self) -> usize {
    self.triangulation.ncells()
  }
  pub fn triangulation(&self) -> &Arc<Triangulation> {
    &self.triangulation
  }
  pub fn box_widths(&self) -> na::Vector2<f64> {
    let lengths = self.rect.side_lengths();
    na::Vector2::new(
      lengths.x / self.nrects[0] as f64,
      lengths.y / self.nrects[1] as f64,
    )
  }

  /// Finds the cell containing the point.
  ///
  /// Points on shared edges are attributed to one of the adjacent cells.
  pub fn locate(&self, x: &Point) -> Result<CellIdx> {
    const TOL: f64 = 1e-12;
    let min = self.rect.min();
    let max = self.rect.max();
    let lengths = self.rect.side_lengths();
    let outside = x.x < min.x - TOL * lengths.x
      || x.x > max.x + TOL * lengths.x
      || x.y < min.y - TOL * lengths.y
      || x.y > max.y + TOL * lengths.y;
    if outside {
      return Err(Error::PointOutsideGrid { x: x.x, y: x.y });
    }

    let widths = self.box_widths();
    let scaled = [(x.x - min.x) / widths.x, (x.y - min.y) / widths.y];
    let ibox = [0, 1].map(|d| (scaled[d].floor().max(0.0) as usize).min(self.nrects[d] - 1));
    let local = [0, 1].map(|d| scaled[d] - ibox[d] as f64);

    let irect = cartesian_index2linear_index(ibox, self.nrects);
    let upper = (local[1] > local[0]) as usize;
    Ok(2 * irect + upper)
  }
}

fn build_triangulation(rect: &Rect, nrects: [usize; 2]) -> Triangulation {
  let nnodes = nrects.map(|n| n + 1);
  let lengths = rect.side_lengths();

  let coords = (0..nnodes[0] * nnodes[1])
    .map(|inode| {
      let [i, j] = linear_index2cartesian_index(inode, nnodes);
      Point::new(
        rect.min.x + lengths.x * i as f64 / nrects[0] as f64,
        rect.min.y + lengths.y * j as f64 / nrects[1] as f64,
      )
    })
    .collect();

  let node = |i: usize, j: usize| -> VertexIdx { cartesian_index2linear_index([i, j], nnodes) };
  let mut cells = Vec::with_capacity(2 * nrects[0] * nrects[1]);
  for irect in 0..nrects[0] * nrects[1] {
    let [i, j] = linear_index2cartesian_index(irect, nrects);
    let v00 = node(i, j);
    let v10 = node(i + 1, j);
    let v11 = node(i + 1, j + 1);
    let v01 = node(i, j + 1);
    cells.push([v00, v10, v11]);
    cells.push([v00, v11, v01]);
  }

  Triangulation::new(coords, cells)
}
