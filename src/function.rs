//! Coefficient functions of the PDE.
//!
//! The solver never knows the analytic form of the source term, the
//! Dirichlet data or the reaction term. It only consumes these two
//! capabilities: scalar fields on the plane ([`PointFn`]) and nonlinear
//! reaction terms with a derivative ([`ReactionFn`]).

/// Scalar field on the plane, evaluated pointwise.
///
/// Used for the source term and the Dirichlet boundary data.
pub trait PointFn {
  fn eval(&self, x: f64, y: f64) -> f64;

  /// Evaluate at every coordinate column of `coords` (2×n).
  fn eval_at(&self, coords: &na::DMatrix<f64>) -> na::DVector<f64> {
    assert_eq!(coords.nrows(), 2);
    na::DVector::from_iterator(
      coords.ncols(),
      coords.column_iter().map(|p| self.eval(p[0], p[1])),
    )
  }
}

impl<F> PointFn for F
where
  F: Fn(f64, f64) -> f64,
{
  fn eval(&self, x: f64, y: f64) -> f64 {
    self(x, y)
  }
}

/// The zero source term.
pub struct Zero;
impl PointFn for Zero {
  fn eval(&self, _x: f64, _y: f64) -> f64 {
    0.0
  }
}

/// Constant Dirichlet data (or a constant source).
pub struct Constant(pub f64);
impl PointFn for Constant {
  fn eval(&self, _x: f64, _y: f64) -> f64 {
    self.0
  }
}

/// Nonlinear reaction term of the PDE together with its derivative.
pub trait ReactionFn {
  fn eval(&self, u: f64) -> f64;
  fn eval_deriv(&self, u: f64) -> f64;

  fn eval_many(&self, u: &na::DVector<f64>) -> na::DVector<f64> {
    u.map(|ui| self.eval(ui))
  }
  fn eval_deriv_many(&self, u: &na::DVector<f64>) -> na::DVector<f64> {
    u.map(|ui| self.eval_deriv(ui))
  }
}

/// Poisson-Boltzmann reaction `f(u) = sinh u`.
pub struct Boltzmann;
impl ReactionFn for Boltzmann {
  fn eval(&self, u: f64) -> f64 {
    u.sinh()
  }
  fn eval_deriv(&self, u: f64) -> f64 {
    u.cosh()
  }
}

/// Vanishing reaction, which degenerates the problem to linear Poisson.
pub struct ZeroReaction;
impl ReactionFn for ZeroReaction {
  fn eval(&self, _u: f64) -> f64 {
    0.0
  }
  fn eval_deriv(&self, _u: f64) -> f64 {
    0.0
  }
}
