//! Element matrices for linear (P1) triangle elements.

/// Area of a triangle given by its vertex coordinates (2×3).
pub fn element_area(coords: &na::DMatrix<f64>) -> f64 {
  let jacobian = element_jacobian(coords);
  0.5 * jacobian.determinant().abs()
}

/// Jacobian of the affine map from the reference triangle (2×2).
fn element_jacobian(coords: &na::DMatrix<f64>) -> na::Matrix2<f64> {
  na::Matrix2::from_columns(&[
    (coords.column(1) - coords.column(0)).fixed_rows::<2>(0).into_owned(),
    (coords.column(2) - coords.column(0)).fixed_rows::<2>(0).into_owned(),
  ])
}

/// The constant gradients of the reference barycentric coordinate
/// functions.
fn ref_difbarys() -> na::Matrix2x3<f64> {
  na::Matrix2x3::new(
    -1.0, 1.0, 0.0, //
    -1.0, 0.0, 1.0,
  )
}

/// Element matrix of the (negative) Laplacian.
///
/// `A = vol * D^T G D` with the reference barycentric gradients `D` and
/// the covector Gramian `G` of the element.
pub fn stiffness_elmat(coords: &na::DMatrix<f64>) -> na::Matrix3<f64> {
  let jacobian = element_jacobian(coords);
  let vector_gramian = jacobian.transpose() * jacobian;
  // Covector Gramian is the inverse of the (full-rank) vector Gramian.
  let covector_gramian = vector_gramian.try_inverse().unwrap();
  let difbarys = ref_difbarys();
  element_area(coords) * difbarys.transpose() * covector_gramian * difbarys
}

/// Element matrix of the mass bilinear form, exact for P1.
pub fn mass_elmat(area: f64) -> na::Matrix3<f64> {
  let v = area / 12.0;
  let mut elmat = na::Matrix3::from_element(v);
  elmat.fill_diagonal(2.0 * v);
  elmat
}

#[cfg(test)]
mod test {
  use super::{element_area, mass_elmat, stiffness_elmat};
  use approx::assert_relative_eq;

  fn ref_triangle() -> na::DMatrix<f64> {
    na::DMatrix::from_column_slice(2, 3, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
  }

  #[test]
  fn ref_triangle_area() {
    assert_relative_eq!(element_area(&ref_triangle()), 0.5);
  }

  #[test]
  fn ref_triangle_stiffness() {
    let computed = stiffness_elmat(&ref_triangle());
    let expected = 0.5
      * na::Matrix3::new(
        2.0, -1.0, -1.0, //
        -1.0, 1.0, 0.0, //
        -1.0, 0.0, 1.0,
      );
    assert_relative_eq!(computed, expected, epsilon = 1e-14);
  }

  #[test]
  fn stiffness_annihilates_constants() {
    let coords = na::DMatrix::from_column_slice(2, 3, &[0.2, 0.1, 1.3, 0.4, 0.5, 1.7]);
    let elmat = stiffness_elmat(&coords);
    let ones = na::Vector3::from_element(1.0);
    assert_relative_eq!((elmat * ones).norm(), 0.0, epsilon = 1e-13);
  }

  #[test]
  fn mass_elmat_total() {
    // Entries sum to the element area, since the P1 hat functions
    // partition unity.
    let elmat = mass_elmat(0.125);
    assert_relative_eq!(elmat.sum(), 0.125, epsilon = 1e-15);
  }
}
