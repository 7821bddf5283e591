use faer::solvers::SpSolver;

/// Sparse matrix under assembly, stored as unsorted triplets.
///
/// Duplicate entries are implicitly summed on conversion to any of the
/// compressed formats and by [`Self::diagonal`].
#[derive(Debug, Clone, Default)]
pub struct TripletMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl TripletMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self {
      nrows,
      ncols,
      triplets: Vec::new(),
    }
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows && c < self.ncols);
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  /// Accumulated diagonal of the matrix.
  ///
  /// Off-diagonal triplets are simply not part of it.
  pub fn diagonal(&self) -> na::DVector<f64> {
    let mut diagonal = na::DVector::zeros(self.nrows.min(self.ncols));
    for &(r, c, v) in &self.triplets {
      if r == c {
        diagonal[r] += v;
      }
    }
    diagonal
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let rows = self.triplets.iter().map(|t| t.0).collect();
    let cols = self.triplets.iter().map(|t| t.1).collect();
    let vals = self.triplets.iter().map(|t| t.2).collect();
    nas::CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals).unwrap()
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }
}

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> faer::sparse::SparseColMat<usize, f64> {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

#[derive(Debug, thiserror::Error)]
#[error("sparse LU factorization failed: {0}")]
pub struct FactorizationError(String);

/// Sparse LU factorization of a square matrix.
pub struct SparseLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl SparseLu {
  pub fn new(a: nas::CscMatrix<f64>) -> Result<Self, FactorizationError> {
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|err| FactorizationError(format!("{err:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let b = faer::col::from_slice(b.as_slice());
    na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}
