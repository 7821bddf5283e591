//! Scalar Newton iteration for the per-node nonlinear equation.

use tracing::trace;

use crate::function::ReactionFn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSettings {
  pub tolerance: f64,
  pub max_iterations: usize,
}
impl Default for NewtonSettings {
  fn default() -> Self {
    Self {
      tolerance: 1e-6,
      max_iterations: 10,
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct NewtonResult {
  pub x: f64,
  pub iterations: usize,
  pub converged: bool,
}

/// The local equation of one free node,
/// `g(x) = a_ii x + m_i f(x) + c`,
/// with the neighbor and load contributions bound into `c`.
pub struct NodalEquation<'a, R> {
  pub c: f64,
  pub a_ii: f64,
  pub m_i: f64,
  pub reaction: &'a R,
}

impl<R> NodalEquation<'_, R>
where
  R: ReactionFn,
{
  pub fn eval(&self, x: f64) -> f64 {
    self.a_ii * x + self.m_i * self.reaction.eval(x) + self.c
  }
  pub fn eval_deriv(&self, x: f64) -> f64 {
    self.a_ii + self.m_i * self.reaction.eval_deriv(x)
  }
}

/// Undamped Newton iteration on `g(x) = 0`, seeded at `x0`.
///
/// Stops early once `|g(x)| <= tolerance` and always returns the last
/// iterate; the caller decides what a non-converged result means. There
/// is no bracketing and no derivative safeguard, so a flat `g` can
/// produce a non-finite iterate, which stops the iteration immediately.
pub fn newton_scalar<R>(eq: &NodalEquation<R>, x0: f64, settings: NewtonSettings) -> NewtonResult
where
  R: ReactionFn,
{
  let mut x = x0;
  let mut g = eq.eval(x);
  let mut iterations = 0;

  while g.abs() > settings.tolerance && iterations < settings.max_iterations {
    x -= g / eq.eval_deriv(x);
    iterations += 1;
    if !x.is_finite() {
      return NewtonResult {
        x,
        iterations,
        converged: false,
      };
    }
    g = eq.eval(x);
    trace!(iterations, x, residual = g.abs(), "newton step");
  }

  NewtonResult {
    x,
    iterations,
    converged: g.abs() <= settings.tolerance,
  }
}
