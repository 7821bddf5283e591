//! Assembly of the discrete system: scatter-accumulation of element
//! contributions into global vectors and matrices.

use itertools::izip;

use crate::{fe, function::PointFn, matrix::TripletMatrix, mesh::SquareMesh, NodeIdx};

/// Sums `values` grouped by their target index.
///
/// `out[i]` is the sum of all `values[k]` with `subs[k] == i`, zero if
/// there is no such `k`. Duplicate indices accumulate. Single pass over
/// the contributions.
pub fn scatter_accumulate(subs: &[NodeIdx], values: &[f64], n: usize) -> na::DVector<f64> {
  assert_eq!(subs.len(), values.len());
  let mut out = na::DVector::zeros(n);
  for (&isub, &value) in izip!(subs, values) {
    out[isub] += value;
  }
  out
}

/// Assembles the load vector `b` with `b_i = ∫ f φ_i`, approximated by
/// edge-midpoint quadrature on every triangle.
///
/// Each vertex receives `area * (f(mid_a) + f(mid_b)) / 6` from the two
/// edge midpoints adjacent to it.
pub fn assemble_load<F>(mesh: &SquareMesh, source: &F) -> na::DVector<f64>
where
  F: PointFn,
{
  let ncontribs = 3 * mesh.ntriangles();
  let mut subs = Vec::with_capacity(ncontribs);
  let mut values = Vec::with_capacity(ncontribs);

  for (itriangle, (tri, &area)) in izip!(mesh.triangles(), mesh.areas().iter()).enumerate() {
    let coords = mesh.triangle_coords(itriangle);

    // Midpoint of the edge opposite each local vertex.
    let f_mid: [f64; 3] = std::array::from_fn(|k| {
      let a = coords.column((k + 1) % 3);
      let b = coords.column((k + 2) % 3);
      source.eval(0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1]))
    });

    for k in 0..3 {
      subs.push(tri[k]);
      values.push(area * (f_mid[(k + 1) % 3] + f_mid[(k + 2) % 3]) / 6.0);
    }
  }

  scatter_accumulate(&subs, &values, mesh.nnodes())
}

/// Assembles the stiffness matrix by an element loop over all triangles.
pub fn assemble_stiffness(mesh: &SquareMesh) -> TripletMatrix {
  let nnodes = mesh.nnodes();
  let mut galmat = TripletMatrix::zeros(nnodes, nnodes);
  for (itriangle, tri) in mesh.triangles().iter().enumerate() {
    let elmat = fe::stiffness_elmat(&mesh.triangle_coords(itriangle));
    for (ilocal, &iglobal) in tri.iter().enumerate() {
      for (jlocal, &jglobal) in tri.iter().enumerate() {
        galmat.push(iglobal, jglobal, elmat[(ilocal, jlocal)]);
      }
    }
  }
  galmat
}

/// Diagonal of the assembled (consistent) mass matrix, which is all the
/// nonlinear solver consumes ("lumped mass").
pub fn assemble_mass_diagonal(mesh: &SquareMesh) -> na::DVector<f64> {
  let nnodes = mesh.nnodes();
  let mut galmat = TripletMatrix::zeros(nnodes, nnodes);
  for (itriangle, tri) in mesh.triangles().iter().enumerate() {
    let elmat = fe::mass_elmat(mesh.areas()[itriangle]);
    for (ilocal, &iglobal) in tri.iter().enumerate() {
      for (jlocal, &jglobal) in tri.iter().enumerate() {
        galmat.push(iglobal, jglobal, elmat[(ilocal, jlocal)]);
      }
    }
  }
  galmat.diagonal()
}
