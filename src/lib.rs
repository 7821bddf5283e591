extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod fe;
pub mod function;
pub mod matrix;
pub mod mesh;
pub mod newton;
pub mod problem;
pub mod solver;

/// Index of a mesh node, which is also the index of its dof
/// in the solution vector.
pub type NodeIdx = usize;
