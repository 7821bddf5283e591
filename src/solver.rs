//! The nonlinear algebraic solver for the discretized system
//! `A u + M ⊙ f(u) - b = 0`.
//!
//! Two strategies operate on the same [`SemilinearSystem`]: nodewise
//! Gauss-Seidel sweeps with an embedded scalar Newton solve per free
//! node, and a full-system Newton iteration on the free-node submatrix.

use tracing::info;

use crate::{
  function::ReactionFn,
  matrix::{FactorizationError, SparseLu, TripletMatrix},
  newton::{newton_scalar, NewtonSettings, NodalEquation},
  NodeIdx,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
  /// Relative residual tolerance. The effective tolerance is this value
  /// times the initial free residual norm.
  pub tolerance: f64,
  /// Cap on outer iterations. One outer iteration is a forward plus a
  /// backward sweep, or one full Newton update.
  pub max_outer_iterations: usize,
  /// Settings of the embedded per-node Newton solve.
  pub newton: NewtonSettings,
}
impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      tolerance: 1e-6,
      max_outer_iterations: 10,
      newton: NewtonSettings::default(),
    }
  }
}

/// Strategy used to drive the residual to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  /// Alternating forward/backward Gauss-Seidel sweeps with a scalar
  /// Newton solve at each free node.
  GaussSeidel,
  /// Full-system Newton updates on the free-node submatrix.
  Newton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Forward,
  Backward,
}

/// Outcome of a solve. Exhausting the iteration cap is not an error;
/// it is reported through `converged`.
#[derive(Debug, Clone)]
pub struct Solution {
  pub u: na::DVector<f64>,
  pub converged: bool,
  pub iterations: usize,
  pub residual_norm: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
  #[error("iteration diverged at node {node} in outer iteration {iteration}")]
  Diverged { node: NodeIdx, iteration: usize },
  #[error("newton update produced a non-finite solution in outer iteration {iteration}")]
  NonFiniteUpdate { iteration: usize },
  #[error(transparent)]
  SingularJacobian(#[from] FactorizationError),
}

/// The assembled discrete system together with the free-node set and
/// the reaction term. Everything here is immutable during a solve; the
/// solution vector is the only mutable state and is owned by the caller.
pub struct SemilinearSystem<'a, R> {
  stiffness: na::DMatrix<f64>,
  mass_diag: na::DVector<f64>,
  load: na::DVector<f64>,
  free_nodes: &'a [NodeIdx],
  reaction: &'a R,
  config: SolverConfig,
}

impl<'a, R> SemilinearSystem<'a, R>
where
  R: ReactionFn,
{
  pub fn new(
    stiffness: na::DMatrix<f64>,
    mass_diag: na::DVector<f64>,
    load: na::DVector<f64>,
    free_nodes: &'a [NodeIdx],
    reaction: &'a R,
    config: SolverConfig,
  ) -> Self {
    let nnodes = stiffness.nrows();
    assert_eq!(stiffness.ncols(), nnodes);
    assert_eq!(mass_diag.len(), nnodes);
    assert_eq!(load.len(), nnodes);
    // Ascending free-node order is what the sweep directions rely on.
    debug_assert!(free_nodes.windows(2).all(|w| w[0] < w[1]));
    debug_assert!(free_nodes.iter().all(|&i| i < nnodes));

    Self {
      stiffness,
      mass_diag,
      load,
      free_nodes,
      reaction,
      config,
    }
  }

  pub fn nnodes(&self) -> usize {
    self.stiffness.nrows()
  }

  /// The full algebraic residual `A u + M ⊙ f(u) - b`.
  pub fn residual(&self, u: &na::DVector<f64>) -> na::DVector<f64> {
    &self.stiffness * u + self.mass_diag.component_mul(&self.reaction.eval_many(u)) - &self.load
  }

  /// Euclidean norm of the residual restricted to the free rows.
  /// Boundary rows are satisfied by construction and excluded.
  pub fn free_residual_norm(&self, u: &na::DVector<f64>) -> f64 {
    let residual = self.residual(u);
    self.free_rows(&residual).norm()
  }

  fn free_rows(&self, v: &na::DVector<f64>) -> na::DVector<f64> {
    na::DVector::from_iterator(
      self.free_nodes.len(),
      self.free_nodes.iter().map(|&i| v[i]),
    )
  }

  /// One Gauss-Seidel pass over the free nodes.
  ///
  /// Visits free nodes in ascending (forward) or descending (backward)
  /// index order. Each node's local equation binds the current values of
  /// all other nodes, so the immediate in-place write-back is what makes
  /// this Gauss-Seidel rather than Jacobi.
  pub fn sweep(
    &self,
    u: &mut na::DVector<f64>,
    direction: Direction,
    iteration: usize,
  ) -> Result<(), SolveError> {
    let order: Box<dyn Iterator<Item = &NodeIdx> + '_> = match direction {
      Direction::Forward => Box::new(self.free_nodes.iter()),
      Direction::Backward => Box::new(self.free_nodes.iter().rev()),
    };

    for &inode in order {
      let a_ii = self.stiffness[(inode, inode)];
      // Neighbor contributions of both already-updated and stale nodes,
      // excluding the pivot column.
      let c = self.stiffness.row(inode).transpose().dot(u) - a_ii * u[inode] - self.load[inode];

      let eq = NodalEquation {
        c,
        a_ii,
        m_i: self.mass_diag[inode],
        reaction: self.reaction,
      };
      let local = newton_scalar(&eq, u[inode], self.config.newton);
      if !local.x.is_finite() {
        return Err(SolveError::Diverged {
          node: inode,
          iteration,
        });
      }
      u[inode] = local.x;
    }
    Ok(())
  }

  /// Alternating forward/backward sweeps until the free residual norm
  /// drops below `tolerance` times its initial value, or the outer
  /// iteration cap is reached.
  pub fn solve_gauss_seidel(&self, u0: na::DVector<f64>) -> Result<Solution, SolveError> {
    let mut u = u0;
    assert_eq!(u.len(), self.nnodes());

    let r0 = self.free_residual_norm(&u);
    let tolerance = self.config.tolerance * r0;
    let mut err = r0;
    let mut iterations = 0;

    while err > tolerance && iterations < self.config.max_outer_iterations {
      self.sweep(&mut u, Direction::Forward, iterations)?;
      self.sweep(&mut u, Direction::Backward, iterations)?;
      err = self.free_residual_norm(&u);
      iterations += 1;
      info!(iterations, residual = err, "gauss-seidel outer iteration");
    }

    Ok(Solution {
      u,
      converged: err <= tolerance,
      iterations,
      residual_norm: err,
    })
  }

  /// Full-system Newton updates: solves
  /// `(A + diag(M ⊙ f'(u)))_ff e = r_f` and applies `u_f ← u_f - e`.
  pub fn solve_newton(&self, u0: na::DVector<f64>) -> Result<Solution, SolveError> {
    let mut u = u0;
    assert_eq!(u.len(), self.nnodes());

    let r0 = self.free_residual_norm(&u);
    let tolerance = self.config.tolerance * r0;
    let mut err = r0;
    let mut iterations = 0;

    while err > tolerance && iterations < self.config.max_outer_iterations {
      let residual = self.residual(&u);
      let reaction_deriv = self.mass_diag.component_mul(&self.reaction.eval_deriv_many(&u));

      let jacobian = self.reduced_jacobian(&reaction_deriv);
      let lu = SparseLu::new(jacobian.to_nalgebra_csc())?;
      let update = lu.solve(&self.free_rows(&residual));

      for (ilocal, &inode) in self.free_nodes.iter().enumerate() {
        u[inode] -= update[ilocal];
      }
      if self.free_nodes.iter().any(|&i| !u[i].is_finite()) {
        return Err(SolveError::NonFiniteUpdate {
          iteration: iterations,
        });
      }

      err = self.free_residual_norm(&u);
      iterations += 1;
      info!(iterations, residual = err, "newton outer iteration");
    }

    Ok(Solution {
      u,
      converged: err <= tolerance,
      iterations,
      residual_norm: err,
    })
  }

  /// The Jacobian approximation `A + diag(M ⊙ f'(u))`, restricted to
  /// free rows and columns.
  fn reduced_jacobian(&self, reaction_deriv: &na::DVector<f64>) -> TripletMatrix {
    let nfree = self.free_nodes.len();
    let mut reduced = TripletMatrix::zeros(nfree, nfree);
    for (ilocal, &inode) in self.free_nodes.iter().enumerate() {
      for (jlocal, &jnode) in self.free_nodes.iter().enumerate() {
        let mut v = self.stiffness[(inode, jnode)];
        if inode == jnode {
          v += reaction_deriv[inode];
        }
        reduced.push(ilocal, jlocal, v);
      }
    }
    reduced
  }

  pub fn solve(&self, u0: na::DVector<f64>, method: Method) -> Result<Solution, SolveError> {
    match method {
      Method::GaussSeidel => self.solve_gauss_seidel(u0),
      Method::Newton => self.solve_newton(u0),
    }
  }
}

#[cfg(test)]
mod test {
  use super::{Direction, Method, SemilinearSystem, SolveError, SolverConfig};
  use crate::function::{ReactionFn, ZeroReaction};
  use approx::assert_relative_eq;

  /// Asymmetric, strictly diagonally dominant test system with all
  /// nodes free.
  fn dominant_system(config: SolverConfig) -> SemilinearSystem<'static, ZeroReaction> {
    #[rustfmt::skip]
    let stiffness = na::DMatrix::from_row_slice(3, 3, &[
       4.0, -1.0,  0.0,
      -2.0,  5.0, -1.0,
       0.0, -1.0,  4.0,
    ]);
    let mass_diag = na::DVector::from_element(3, 1.0);
    let load = na::DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    SemilinearSystem::new(stiffness, mass_diag, load, &[0, 1, 2], &ZeroReaction, config)
  }

  /// System whose single free node has an all-zero stiffness row and no
  /// mass, so both its local equation and the reduced Jacobian are
  /// singular while the residual stays nonzero.
  fn singular_system() -> SemilinearSystem<'static, ZeroReaction> {
    #[rustfmt::skip]
    let stiffness = na::DMatrix::from_row_slice(3, 3, &[
      1.0, 0.0, 0.0,
      0.0, 0.0, 0.0,
      0.0, 0.0, 1.0,
    ]);
    let mass_diag = na::DVector::zeros(3);
    let load = na::DVector::from_column_slice(&[0.0, 1.0, 0.0]);
    SemilinearSystem::new(
      stiffness,
      mass_diag,
      load,
      &[1],
      &ZeroReaction,
      SolverConfig::default(),
    )
  }

  #[test]
  fn zero_pivot_row_diverges_the_sweeps() {
    let system = singular_system();
    let err = system
      .solve(na::DVector::zeros(3), Method::GaussSeidel)
      .unwrap_err();
    assert!(matches!(err, SolveError::Diverged { node: 1, .. }));
  }

  #[test]
  fn singular_reduced_jacobian_is_an_error() {
    let system = singular_system();
    let err = system
      .solve(na::DVector::zeros(3), Method::Newton)
      .unwrap_err();
    assert!(matches!(err, SolveError::SingularJacobian(_)));
  }

  #[test]
  fn forward_and_backward_sweeps_differ() {
    let system = dominant_system(SolverConfig::default());

    let mut u_fwd = na::DVector::zeros(3);
    system.sweep(&mut u_fwd, Direction::Forward, 0).unwrap();
    let mut u_bwd = na::DVector::zeros(3);
    system.sweep(&mut u_bwd, Direction::Backward, 0).unwrap();

    assert!((&u_fwd - &u_bwd).norm() > 1e-8);
  }

  #[test]
  fn sweep_pair_reduces_residual() {
    let system = dominant_system(SolverConfig::default());
    let mut u = na::DVector::zeros(3);
    let r_before = system.free_residual_norm(&u);

    system.sweep(&mut u, Direction::Forward, 0).unwrap();
    system.sweep(&mut u, Direction::Backward, 0).unwrap();
    let r_after = system.free_residual_norm(&u);

    assert!(r_after < r_before);
  }

  #[test]
  fn gauss_seidel_solves_linear_system() {
    let system = dominant_system(SolverConfig::default());
    let solution = system.solve_gauss_seidel(na::DVector::zeros(3)).unwrap();
    assert!(solution.converged);

    // Verify against the residual directly.
    assert!(system.free_residual_norm(&solution.u) <= 1e-6 * system.free_residual_norm(&na::DVector::zeros(3)));
  }

  #[test]
  fn newton_solves_linear_system_in_one_iteration() {
    let system = dominant_system(SolverConfig::default());
    let solution = system.solve_newton(na::DVector::zeros(3)).unwrap();
    assert!(solution.converged);
    assert_eq!(solution.iterations, 1);

    let gs = system.solve_gauss_seidel(na::DVector::zeros(3)).unwrap();
    assert_relative_eq!(solution.u, gs.u, epsilon = 1e-5);
  }

  #[test]
  fn unreachable_tolerance_stops_at_iteration_cap() {
    let config = SolverConfig {
      tolerance: 0.0,
      max_outer_iterations: 7,
      ..SolverConfig::default()
    };
    let system = dominant_system(config);
    let solution = system.solve(na::DVector::zeros(3), Method::GaussSeidel).unwrap();
    assert!(!solution.converged);
    assert_eq!(solution.iterations, 7);
  }

  #[test]
  fn boundary_nodes_stay_untouched() {
    #[rustfmt::skip]
    let stiffness = na::DMatrix::from_row_slice(3, 3, &[
       1.0,  0.0,  0.0,
      -1.0,  4.0, -1.0,
       0.0,  0.0,  1.0,
    ]);
    let mass_diag = na::DVector::from_element(3, 1.0);
    let load = na::DVector::zeros(3);
    let free_nodes = [1];
    let system = SemilinearSystem::new(
      stiffness,
      mass_diag,
      load,
      &free_nodes,
      &ZeroReaction,
      SolverConfig::default(),
    );

    let mut u0 = na::DVector::zeros(3);
    u0[0] = 1.0;
    u0[2] = 2.0;
    let solution = system.solve(u0, Method::GaussSeidel).unwrap();
    assert_eq!(solution.u[0], 1.0);
    assert_eq!(solution.u[2], 2.0);
    // Interior value balances its two neighbors.
    assert_relative_eq!(solution.u[1], 0.75, epsilon = 1e-9);
  }

  #[test]
  fn idempotent_once_converged() {
    let system = dominant_system(SolverConfig::default());
    let r0 = system.free_residual_norm(&na::DVector::zeros(3));
    let solution = system.solve_gauss_seidel(na::DVector::zeros(3)).unwrap();
    assert!(solution.converged);

    let mut u = solution.u.clone();
    system.sweep(&mut u, Direction::Forward, 0).unwrap();
    system.sweep(&mut u, Direction::Backward, 0).unwrap();
    assert!((&u - &solution.u).norm() <= 1e-6 * r0);
  }

  #[test]
  fn nonlinear_reaction_stiffens_the_diagonal() {
    // With f(u) = u^3 the local equations stay solvable and the sweeps
    // still converge on a dominant system.
    struct Cubic;
    impl ReactionFn for Cubic {
      fn eval(&self, u: f64) -> f64 {
        u.powi(3)
      }
      fn eval_deriv(&self, u: f64) -> f64 {
        3.0 * u.powi(2)
      }
    }

    #[rustfmt::skip]
    let stiffness = na::DMatrix::from_row_slice(3, 3, &[
       4.0, -1.0,  0.0,
      -2.0,  5.0, -1.0,
       0.0, -1.0,  4.0,
    ]);
    let mass_diag = na::DVector::from_element(3, 1.0);
    let load = na::DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    let system = SemilinearSystem::new(
      stiffness,
      mass_diag,
      load,
      &[0, 1, 2],
      &Cubic,
      SolverConfig::default(),
    );

    let gs = system.solve(na::DVector::zeros(3), Method::GaussSeidel).unwrap();
    assert!(gs.converged);
    let newton = system.solve(na::DVector::zeros(3), Method::Newton).unwrap();
    assert!(newton.converged);
    assert_relative_eq!(gs.u, newton.u, epsilon = 1e-4);
  }
}
