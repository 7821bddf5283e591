//! High-level entry point: a semilinear elliptic PDE
//! `-Δu + f(u) = s` with Dirichlet data on a square domain.

use crate::{
  assemble,
  function::{Boltzmann, Constant, PointFn, ReactionFn, Zero},
  mesh::SquareMesh,
  solver::{Method, SemilinearSystem, Solution, SolveError, SolverConfig},
};

/// The coefficient functions of one problem instance, selected at
/// construction time.
pub struct SemilinearProblem<S, B, R> {
  pub source: S,
  pub boundary: B,
  pub reaction: R,
}

impl SemilinearProblem<Zero, Constant, Boltzmann> {
  /// The Poisson-Boltzmann model problem: zero source, constant
  /// Dirichlet data and `f(u) = sinh u`.
  pub fn boltzmann(boundary_value: f64) -> Self {
    Self {
      source: Zero,
      boundary: Constant(boundary_value),
      reaction: Boltzmann,
    }
  }
}

impl<S, B, R> SemilinearProblem<S, B, R>
where
  S: PointFn,
  B: PointFn,
  R: ReactionFn,
{
  /// Discretizes the problem on `mesh` and runs the selected solver.
  ///
  /// Builds the stiffness matrix, the lumped mass diagonal and the load
  /// vector, writes the Dirichlet data into the boundary entries of `u`
  /// and hands the free nodes to the nonlinear solver. What to do with
  /// the returned solution (printing, output) is the caller's concern.
  pub fn solve(
    &self,
    mesh: &SquareMesh,
    config: SolverConfig,
    method: Method,
  ) -> Result<Solution, SolveError> {
    let stiffness = assemble::assemble_stiffness(mesh).to_nalgebra_dense();
    let mass_diag = assemble::assemble_mass_diagonal(mesh);
    let load = assemble::assemble_load(mesh, &self.source);

    let mut u = na::DVector::zeros(mesh.nnodes());
    for &inode in mesh.boundary_nodes() {
      let p = mesh.coords().column(inode);
      u[inode] = self.boundary.eval(p[0], p[1]);
    }

    let system = SemilinearSystem::new(
      stiffness,
      mass_diag,
      load,
      mesh.free_nodes(),
      &self.reaction,
      config,
    );
    system.solve(u, method)
  }
}
