//! Jacobian assembly strategies.
//!
//! Components never see the sparse matrix. They push derivative contributions
//! through [`MatrixHandler::add_to_coefficient`], which accumulates: several
//! components may add to the same entry (a node and all its incident edges,
//! for example).
//!
//! - [`TripletHandler`] collects `(row, col, value)` triplets and builds a new
//!   matrix. Use it whenever the sparsity pattern may have changed.
//! - [`InPlaceHandler`] overwrites the values of an existing matrix without
//!   touching its pattern. Contributions outside the pattern are recorded and
//!   reported by [`MatrixHandler::finalize`].
//!
//! [`Transposed`] wraps either strategy and swaps row and column, which is how
//! `J^T` is assembled from the same component code.

use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::error::{SolverError, SolverResult};

pub trait MatrixHandler {
    /// Add `value` to entry `(row, col)`.
    fn add_to_coefficient(&mut self, row: usize, col: usize, value: f64);

    /// Flush collected contributions into the matrix.
    fn finalize(&mut self) -> SolverResult<()>;
}

/// Builds a fresh matrix from collected triplets.
#[derive(Debug)]
pub struct TripletHandler {
    coo: CooMatrix<f64>,
    matrix: Option<CscMatrix<f64>>,
}

impl TripletHandler {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            coo: CooMatrix::new(nrows, ncols),
            matrix: None,
        }
    }

    /// Number of contributions pushed so far, duplicates counted.
    pub fn triplet_count(&self) -> usize {
        self.coo.nnz()
    }

    /// The assembled matrix. Finalizes first if that has not happened yet.
    pub fn into_matrix(mut self) -> CscMatrix<f64> {
        match self.matrix.take() {
            Some(matrix) => matrix,
            None => CscMatrix::from(&self.coo),
        }
    }
}

impl MatrixHandler for TripletHandler {
    fn add_to_coefficient(&mut self, row: usize, col: usize, value: f64) {
        self.coo.push(row, col, value);
    }

    fn finalize(&mut self) -> SolverResult<()> {
        // Duplicate triplets are summed by the conversion.
        self.matrix = Some(CscMatrix::from(&self.coo));
        Ok(())
    }
}

/// Refreshes the values of a matrix whose pattern is already known.
///
/// Creating the handler zeroes every stored value.
#[derive(Debug)]
pub struct InPlaceHandler<'m> {
    matrix: &'m mut CscMatrix<f64>,
    first_miss: Option<(usize, usize)>,
}

impl<'m> InPlaceHandler<'m> {
    pub fn new(matrix: &'m mut CscMatrix<f64>) -> Self {
        matrix.values_mut().iter_mut().for_each(|v| *v = 0.0);
        Self {
            matrix,
            first_miss: None,
        }
    }
}

impl MatrixHandler for InPlaceHandler<'_> {
    fn add_to_coefficient(&mut self, row: usize, col: usize, value: f64) {
        let (offsets, rows, values) = self.matrix.csc_data_mut();
        let slot = offsets
            .get(col)
            .zip(offsets.get(col + 1))
            .and_then(|(&begin, &end)| {
                rows[begin..end]
                    .binary_search(&row)
                    .ok()
                    .map(|local| begin + local)
            });
        match slot {
            Some(slot) => values[slot] += value,
            None => {
                self.first_miss.get_or_insert((row, col));
            }
        }
    }

    fn finalize(&mut self) -> SolverResult<()> {
        match self.first_miss {
            Some((row, col)) => Err(SolverError::PatternChanged { row, col }),
            None => Ok(()),
        }
    }
}

/// Forwards every contribution with row and column swapped.
pub struct Transposed<'h> {
    inner: &'h mut dyn MatrixHandler,
}

impl<'h> Transposed<'h> {
    pub fn new(inner: &'h mut dyn MatrixHandler) -> Self {
        Self { inner }
    }
}

impl MatrixHandler for Transposed<'_> {
    fn add_to_coefficient(&mut self, row: usize, col: usize, value: f64) {
        self.inner.add_to_coefficient(col, row, value);
    }

    fn finalize(&mut self) -> SolverResult<()> {
        self.inner.finalize()
    }
}
