//! Structured triangulations of axis-aligned squares.
//!
//! The mesh is an external collaborator to the nonlinear solver: it owns
//! the node coordinates, the element connectivity, the per-element areas
//! and the partition of nodes into free and boundary sets. The solver
//! never mutates any of it.

use crate::{fe, NodeIdx};

/// converts linear node index to cartesian lattice index
fn linear_index2cartesian_index(lin_idx: usize, dim_len: usize) -> [usize; 2] {
  [lin_idx % dim_len, lin_idx / dim_len]
}

/// converts cartesian lattice index to linear node index
fn cartesian_index2linear_index(cart_idx: [usize; 2], dim_len: usize) -> usize {
  cart_idx[1] * dim_len + cart_idx[0]
}

/// Conforming triangulation of an axis-aligned square.
///
/// Nodes live on a regular lattice, ordered lexicographically with the
/// x-index running fastest. Every grid cell is split into two right
/// triangles along the same diagonal. All four corners are boundary
/// nodes, so in particular node `0` and node `nnodes - 1` are.
pub struct SquareMesh {
  min: [f64; 2],
  max: [f64; 2],
  nsubdiv: usize,
  coords: na::DMatrix<f64>,
  triangles: Vec<[NodeIdx; 3]>,
  areas: na::DVector<f64>,
  boundary_nodes: Vec<NodeIdx>,
  free_nodes: Vec<NodeIdx>,
}

impl SquareMesh {
  pub fn new(min: [f64; 2], max: [f64; 2], nsubdiv: usize) -> Self {
    assert!(nsubdiv >= 1);
    assert!(min[0] < max[0] && min[1] < max[1]);

    let nnodes_per_dim = nsubdiv + 1;
    let nnodes = nnodes_per_dim * nnodes_per_dim;
    let side = [max[0] - min[0], max[1] - min[1]];

    let mut coords = na::DMatrix::zeros(2, nnodes);
    for inode in 0..nnodes {
      let cart = linear_index2cartesian_index(inode, nnodes_per_dim);
      coords[(0, inode)] = min[0] + side[0] * cart[0] as f64 / nsubdiv as f64;
      coords[(1, inode)] = min[1] + side[1] * cart[1] as f64 / nsubdiv as f64;
    }

    // Two triangles per grid cell, both using the same diagonal.
    let mut triangles = Vec::with_capacity(2 * nsubdiv * nsubdiv);
    for ibox in 0..nsubdiv * nsubdiv {
      let box_cart = linear_index2cartesian_index(ibox, nsubdiv);
      let origin = cartesian_index2linear_index(box_cart, nnodes_per_dim);
      let across = origin + nnodes_per_dim;
      triangles.push([origin, origin + 1, across + 1]);
      triangles.push([origin, across, across + 1]);
    }

    let areas = na::DVector::from_iterator(
      triangles.len(),
      triangles
        .iter()
        .map(|tri| fe::element_area(&triangle_coords(&coords, tri))),
    );

    let mut boundary_nodes = Vec::new();
    let mut free_nodes = Vec::new();
    for inode in 0..nnodes {
      let cart = linear_index2cartesian_index(inode, nnodes_per_dim);
      let on_boundary = cart
        .iter()
        .any(|&c| c == 0 || c == nnodes_per_dim - 1);
      if on_boundary {
        boundary_nodes.push(inode);
      } else {
        free_nodes.push(inode);
      }
    }
    debug_assert_eq!(boundary_nodes.len() + free_nodes.len(), nnodes);

    Self {
      min,
      max,
      nsubdiv,
      coords,
      triangles,
      areas,
      boundary_nodes,
      free_nodes,
    }
  }

  pub fn unit(nsubdiv: usize) -> Self {
    Self::new([0.0, 0.0], [1.0, 1.0], nsubdiv)
  }

  /// Uniform refinement: halves the mesh width.
  pub fn refine(&self) -> Self {
    Self::new(self.min, self.max, 2 * self.nsubdiv)
  }

  pub fn nnodes(&self) -> usize {
    self.coords.ncols()
  }
  pub fn ntriangles(&self) -> usize {
    self.triangles.len()
  }
  pub fn nsubdiv(&self) -> usize {
    self.nsubdiv
  }

  /// Node coordinates, one column per node (2×nnodes).
  pub fn coords(&self) -> &na::DMatrix<f64> {
    &self.coords
  }
  pub fn triangles(&self) -> &[[NodeIdx; 3]] {
    &self.triangles
  }
  pub fn areas(&self) -> &na::DVector<f64> {
    &self.areas
  }

  pub fn boundary_nodes(&self) -> &[NodeIdx] {
    &self.boundary_nodes
  }
  pub fn free_nodes(&self) -> &[NodeIdx] {
    &self.free_nodes
  }

  /// Vertex coordinates of one triangle (2×3).
  pub fn triangle_coords(&self, itriangle: usize) -> na::DMatrix<f64> {
    triangle_coords(&self.coords, &self.triangles[itriangle])
  }
}

fn triangle_coords(coords: &na::DMatrix<f64>, tri: &[NodeIdx; 3]) -> na::DMatrix<f64> {
  na::DMatrix::from_fn(2, 3, |r, c| coords[(r, tri[c])])
}
