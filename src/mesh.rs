//! A triangulation plays the role of a container of mesh entities (cells, edges, vertices).
//! It provides a global numbering for unique identification of the entities
//! and the incidence information needed by the DG and RT spaces.
//! Structured triangulations of rectangles are generated by [`cartesian::CartesianGrid`].

pub mod cartesian;

use crate::geometry::{Point, TriangleGeometry, Vector};

use std::collections::HashMap;

pub type VertexIdx = usize;
pub type CellIdx = usize;
pub type EdgeIdx = usize;

/// Helper struct that ensures that edges don't have an orientation.
/// Always use `Self::new` never construct tuple directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeBetweenVertices(VertexIdx, VertexIdx);
impl EdgeBetweenVertices {
  pub fn new(a: VertexIdx, b: VertexIdx) -> Self {
    if a < b {
      Self(a, b)
    } else {
      Self(b, a)
    }
  }
}

/// Reference from an edge to an adjacent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEdge {
  pub cell: CellIdx,
  /// Local edge index in the cell, which is the index of the opposite vertex.
  pub local: usize,
}

#[derive(Debug, Clone)]
pub struct Edge {
  vertices: [VertexIdx; 2],
  /// The inside cell defines the direction of the global edge normal.
  inside: CellEdge,
  outside: Option<CellEdge>,
}
impl Edge {
  pub fn vertices(&self) -> [VertexIdx; 2] {
    self.vertices
  }
  pub fn inside(&self) -> CellEdge {
    self.inside
  }
  pub fn outside(&self) -> Option<CellEdge> {
    self.outside
  }
  pub fn is_boundary(&self) -> bool {
    self.outside.is_none()
  }
}

#[derive(Debug)]
pub struct Triangulation {
  coords: Vec<Point>,
  cells: Vec<[VertexIdx; 3]>,
  edges: Vec<Edge>,
  cell_edges: Vec<[EdgeIdx; 3]>,
  vertex_cells: Vec<Vec<CellIdx>>,
  boundary_vertices: Vec<bool>,
}

impl Triangulation {
  /// Builds the topology from the cell list.
  ///
  /// Cells are reordered counter-clockwise if necessary.
  pub fn new(coords: Vec<Point>, mut cells: Vec<[VertexIdx; 3]>) -> Self {
    for cell in &mut cells {
      let geo = TriangleGeometry::new(cell.map(|v| coords[v]));
      if !geo.is_ccw() {
        cell.swap(1, 2);
      }
    }

    let mut edge_lookup: HashMap<EdgeBetweenVertices, EdgeIdx> = HashMap::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut cell_edges = Vec::with_capacity(cells.len());
    for (icell, cell) in cells.iter().enumerate() {
      let mut local_edges = [0; 3];
      for (local, local_edge) in local_edges.iter_mut().enumerate() {
        let a = cell[(local + 1) % 3];
        let b = cell[(local + 2) % 3];
        let key = EdgeBetweenVertices::new(a, b);
        let cell_edge = CellEdge {
          cell: icell,
          local,
        };
        *local_edge = match edge_lookup.get(&key) {
          Some(&iedge) => {
            let edge = &mut edges[iedge];
            assert!(edge.outside.is_none(), "Non-manifold edge.");
            edge.outside = Some(cell_edge);
            iedge
          }
          None => {
            let iedge = edges.len();
            edges.push(Edge {
              vertices: [a, b],
              inside: cell_edge,
              outside: None,
            });
            edge_lookup.insert(key, iedge);
            iedge
          }
        };
      }
      cell_edges.push(local_edges);
    }

    let mut vertex_cells = vec![Vec::new(); coords.len()];
    for (icell, cell) in cells.iter().enumerate() {
      for &ivertex in cell {
        vertex_cells[ivertex].push(icell);
      }
    }

    let mut boundary_vertices = vec![false; coords.len()];
    for edge in edges.iter().filter(|e| e.is_boundary()) {
      for ivertex in edge.vertices {
        boundary_vertices[ivertex] = true;
      }
    }

    Self {
      coords,
      cells,
      edges,
      cell_edges,
      vertex_cells,
      boundary_vertices,
    }
  }
}

// getters
impl Triangulation {
  pub fn nvertices(&self) -> usize {
    self.coords.len()
  }
  pub fn ncells(&self) -> usize {
    self.cells.len()
  }
  pub fn nedges(&self) -> usize {
    self.edges.len()
  }
  pub fn coords(&self) -> &[Point] {
    &self.coords
  }
  pub fn cells(&self) -> &[[VertexIdx; 3]] {
    &self.cells
  }
  pub fn cell(&self, icell: CellIdx) -> [VertexIdx; 3] {
    self.cells[icell]
  }
  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }
  pub fn edge(&self, iedge: EdgeIdx) -> &Edge {
    &self.edges[iedge]
  }
  pub fn cell_edges(&self, icell: CellIdx) -> [EdgeIdx; 3] {
    self.cell_edges[icell]
  }
  pub fn vertex_cells(&self, ivertex: VertexIdx) -> &[CellIdx] {
    &self.vertex_cells[ivertex]
  }
  pub fn is_boundary_vertex(&self, ivertex: VertexIdx) -> bool {
    self.boundary_vertices[ivertex]
  }
  pub fn boundary_edges(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
    (0..self.nedges()).filter(|&iedge| self.edges[iedge].is_boundary())
  }
  pub fn inner_edges(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
    (0..self.nedges()).filter(|&iedge| !self.edges[iedge].is_boundary())
  }
}

// geometry
impl Triangulation {
  pub fn cell_geometry(&self, icell: CellIdx) -> TriangleGeometry {
    TriangleGeometry::new(self.cells[icell].map(|v| self.coords[v]))
  }

  pub fn edge_length(&self, iedge: EdgeIdx) -> f64 {
    let [a, b] = self.edges[iedge].vertices;
    (self.coords[b] - self.coords[a]).norm()
  }

  /// Global unit normal of the edge, pointing out of the inside cell.
  pub fn edge_normal(&self, iedge: EdgeIdx) -> Vector {
    let inside = self.edges[iedge].inside;
    self.cell_geometry(inside.cell).outward_normal(inside.local)
  }

  /// Relative orientation between the global edge normal and the outward normal of the cell.
  pub fn edge_sign(&self, icell: CellIdx, local: usize) -> f64 {
    let iedge = self.cell_edges[icell][local];
    if self.edges[iedge].inside.cell == icell {
      1.0
    } else {
      -1.0
    }
  }

  pub fn mesh_width(&self) -> f64 {
    (0..self.ncells())
      .map(|icell| self.cell_geometry(icell).diameter())
      .fold(0.0, f64::max)
  }
}
