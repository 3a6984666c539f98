//! LU factorization of the sparse Jacobian.
//!
//! Split into a symbolic phase ([`SparseLu::analyze_pattern`]), run once per
//! sparsity pattern, and a numeric phase ([`SparseLu::factorize`]), run for
//! every new set of values. Both phases are faer's supernodal sparse LU; the
//! symbolic factorization (fill-reducing ordering and elimination structure)
//! is kept and handed to every numeric factorization of the same pattern.

use std::fmt;

use faer::Col;
use faer::prelude::Solve;
use faer::sparse::linalg::solvers::{Lu, SymbolicLu};
use faer::sparse::{SparseColMat, SymbolicSparseColMat};
use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use crate::error::{SolverError, SolverResult};

#[derive(Default)]
pub struct SparseLu {
    dimension: usize,
    /// Column offsets of the analyzed pattern.
    col_offsets: Vec<usize>,
    /// Row indices of the analyzed pattern, sorted within each column.
    row_indices: Vec<usize>,
    symbolic: Option<SymbolicLu<usize>>,
    numeric: Option<Lu<usize, f64>>,
    analyses: usize,
}

impl fmt::Debug for SparseLu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseLu")
            .field("dimension", &self.dimension)
            .field("nonzeros", &self.row_indices.len())
            .field("analyses", &self.analyses)
            .field("factorized", &self.numeric.is_some())
            .finish()
    }
}

impl SparseLu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbolic factorization of the pattern of `matrix`.
    ///
    /// A pattern equal to the analyzed one keeps its symbolic factorization.
    pub fn analyze_pattern(&mut self, matrix: &CscMatrix<f64>) -> SolverResult<()> {
        if matrix.nrows() != matrix.ncols() {
            return Err(SolverError::DimensionMismatch {
                what: "jacobian columns",
                expected: matrix.nrows(),
                got: matrix.ncols(),
            });
        }
        self.numeric = None;
        if self.symbolic.is_some() && self.matches_pattern(matrix) {
            return Ok(());
        }

        let pattern = matrix.pattern();
        self.dimension = matrix.nrows();
        self.col_offsets = pattern.major_offsets().to_vec();
        self.row_indices = pattern.minor_indices().to_vec();
        let structure = self.structure();
        let symbolic = SymbolicLu::try_new(structure.as_ref()).map_err(|err| {
            SolverError::NumericalProblem {
                what: format!("symbolic LU analysis failed: {err:?}"),
            }
        })?;
        self.symbolic = Some(symbolic);
        self.analyses += 1;
        Ok(())
    }

    /// Whether `matrix` has the pattern recorded by the last analysis.
    pub fn matches_pattern(&self, matrix: &CscMatrix<f64>) -> bool {
        let pattern = matrix.pattern();
        matrix.nrows() == self.dimension
            && matrix.ncols() == self.dimension
            && pattern.major_offsets() == self.col_offsets.as_slice()
            && pattern.minor_indices() == self.row_indices.as_slice()
    }

    /// Number of symbolic factorizations done so far.
    pub fn number_of_analyses(&self) -> usize {
        self.analyses
    }

    /// Numeric factorization. The pattern must have been analyzed.
    pub fn factorize(&mut self, matrix: &CscMatrix<f64>) -> SolverResult<()> {
        self.numeric = None;
        let Some(symbolic) = self.symbolic.clone() else {
            return Err(SolverError::NumericalProblem {
                what: "factorize called before the pattern was analyzed".to_string(),
            });
        };
        if !self.matches_pattern(matrix) {
            return Err(SolverError::DimensionMismatch {
                what: "jacobian nonzeros",
                expected: self.row_indices.len(),
                got: matrix.nnz(),
            });
        }
        let values = SparseColMat::new(self.structure(), matrix.values().to_vec());
        let lu = Lu::try_new_with_symbolic(symbolic, values.as_ref()).map_err(|err| {
            SolverError::NumericalProblem {
                what: format!(
                    "Couldn't decompose a Jacobian, it may be non-invertible ({err:?})"
                ),
            }
        })?;
        self.numeric = Some(lu);
        Ok(())
    }

    /// Solve `J x = rhs` with the last factorization.
    ///
    /// A zero pivot only shows up as a non-finite solution, which is reported
    /// as a non-invertible Jacobian.
    pub fn solve(&self, rhs: &DVector<f64>) -> SolverResult<DVector<f64>> {
        let lu = self.numeric.as_ref().ok_or_else(|| SolverError::NumericalProblem {
            what: "solve called without a valid factorization".to_string(),
        })?;
        if rhs.len() != self.dimension {
            return Err(SolverError::DimensionMismatch {
                what: "right-hand side",
                expected: self.dimension,
                got: rhs.len(),
            });
        }
        let mut x = Col::<f64>::from_fn(self.dimension, |i| rhs[i]);
        lu.solve_in_place(x.as_mut());
        let solution = DVector::from_fn(self.dimension, |i, _| x[i]);
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NumericalProblem {
                what: "Couldn't decompose a Jacobian, it may be non-invertible".to_string(),
            });
        }
        Ok(solution)
    }

    fn structure(&self) -> SymbolicSparseColMat<usize> {
        SymbolicSparseColMat::new_checked(
            self.dimension,
            self.dimension,
            self.col_offsets.clone(),
            None,
            self.row_indices.clone(),
        )
    }
}
