//! Sparse matrices and iterative solvers shared by the global solves.
//!
//! Both the frame-field solve and the parametrization are complex Hermitian
//! least-squares problems. They are assembled as a [`HermitianSystem`] and solved
//! through the equivalent real symmetric system of twice the size:
//!
//! ```text
//! (A + iB)(x + iy) = (b + ic)   <=>   [A  -B] [x]   [b]
//!                                     [B   A] [y] = [c]
//! ```
//!
//! The real system is solved with a Jacobi-preconditioned conjugate gradient.

use nalgebra::{Complex, DVector};

use crate::error::{Error, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the entries of row `i`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same position are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if last == Some((row, col)) {
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
                continue;
            }
            col_idx.push(col);
            values.push(val);
            row_ptr[row + 1] += 1;
            last = Some((row, col));
        }

        // Entry counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Main diagonal (zero where no entry is stored).
    pub fn diagonal(&self) -> DVector<f64> {
        let mut diag = DVector::zeros(self.rows.min(self.cols));
        for i in 0..diag.len() {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                if self.col_idx[k] == i {
                    diag[i] += self.values[k];
                }
            }
        }
        diag
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| {
                (self.row_ptr[i]..self.row_ptr[i + 1])
                    .map(|k| self.values[k] * x[self.col_idx[k]])
                    .sum::<f64>()
            }),
        )
    }
}

/// Stopping parameters for the conjugate gradient.
#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    /// Pipeline stage name used in error reports.
    pub stage: &'static str,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Relative residual at which the iteration stops.
    pub tolerance: f64,
}

/// Solve `A x = b` with Jacobi-preconditioned conjugate gradients.
///
/// `A` must be symmetric positive (semi-)definite with a positive diagonal.
///
/// # Errors
/// - [`Error::Solver`] if the diagonal has a non-positive entry
/// - [`Error::ConvergenceFailed`] if the relative residual does not drop below
///   the tolerance within the iteration budget
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    settings: &SolverSettings,
) -> Result<DVector<f64>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "Matrix must be square");

    let diag = a.diagonal();
    if let Some(i) = diag.iter().position(|&d| !(d > 0.0)) {
        return Err(Error::solver(
            settings.stage,
            format!("system is singular (row {} has diagonal {})", i, diag[i]),
        ));
    }
    let inv_diag = diag.map(|d| 1.0 / d);

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    let b_norm = b.norm();
    if b_norm < 1e-300 {
        return Ok(DVector::zeros(n));
    }

    let mut r = b - a.mul_vec(&x);
    if r.norm() / b_norm < settings.tolerance {
        return Ok(x);
    }

    let mut z = r.component_mul(&inv_diag);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..settings.max_iterations {
        let ap = a.mul_vec(&p);
        let p_ap = p.dot(&ap);
        if !(p_ap > 0.0) {
            // Exhausted the range of a semi-definite system.
            log::debug!("{}: CG stopped on curvature {:e} after {} iterations", settings.stage, p_ap, iter);
            break;
        }
        let alpha = rz / p_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() / b_norm < settings.tolerance {
            log::debug!("{}: CG converged in {} iterations", settings.stage, iter + 1);
            return Ok(x);
        }

        z = r.component_mul(&inv_diag);
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;
        p = &z + beta * &p;
        rz = rz_new;
    }

    if r.norm() / b_norm < settings.tolerance.sqrt() {
        // Stalled close to the solution; good enough for a semi-definite system.
        log::debug!("{}: CG stalled at relative residual {:e}", settings.stage, r.norm() / b_norm);
        return Ok(x);
    }

    Err(Error::ConvergenceFailed {
        stage: settings.stage,
        iterations: settings.max_iterations,
    })
}

/// Real symmetric system with support for fixing unknowns to given values.
#[derive(Debug, Clone)]
pub struct SymmetricSystem {
    dim: usize,
    triplets: Vec<(usize, usize, f64)>,
    rhs: Vec<f64>,
}

impl SymmetricSystem {
    /// Dimension of the system.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Solve with the unknowns in `fixed` clamped to their values.
    ///
    /// Fixed columns move to the right-hand side and the remaining reduced system
    /// is solved with [`conjugate_gradient`]. The returned vector has full length.
    pub fn solve_constrained(
        &self,
        fixed: &[Option<f64>],
        guess: Option<&DVector<f64>>,
        settings: &SolverSettings,
    ) -> Result<DVector<f64>> {
        assert_eq!(fixed.len(), self.dim, "Constraint mask dimension mismatch");

        let mut column = vec![usize::MAX; self.dim];
        let mut free = Vec::with_capacity(self.dim);
        for (i, f) in fixed.iter().enumerate() {
            if f.is_none() {
                column[i] = free.len();
                free.push(i);
            }
        }

        let mut full = DVector::from_iterator(self.dim, fixed.iter().map(|f| f.unwrap_or(0.0)));
        if free.is_empty() {
            return Ok(full);
        }

        let mut rhs = DVector::from_iterator(free.len(), free.iter().map(|&i| self.rhs[i]));
        let mut reduced = Vec::with_capacity(self.triplets.len());
        for &(r, c, v) in &self.triplets {
            if column[r] == usize::MAX {
                continue;
            }
            match fixed[c] {
                None => reduced.push((column[r], column[c], v)),
                Some(value) => rhs[column[r]] -= v * value,
            }
        }

        let matrix = CsrMatrix::from_triplets(free.len(), free.len(), reduced);
        let x0 = guess.map(|g| DVector::from_iterator(free.len(), free.iter().map(|&i| g[i])));
        let x = conjugate_gradient(&matrix, &rhs, x0.as_ref(), settings)?;

        for (k, &i) in free.iter().enumerate() {
            full[i] = x[k];
        }
        Ok(full)
    }

    /// Solve without constraints.
    pub fn solve(&self, settings: &SolverSettings) -> Result<DVector<f64>> {
        self.solve_constrained(&vec![None; self.dim], None, settings)
    }
}

/// Complex Hermitian system `H z = b`, assembled entry by entry.
///
/// Entries are accumulated as given; callers add both `(i, j)` and the
/// conjugate `(j, i)` entry for off-diagonal terms.
#[derive(Debug, Clone)]
pub struct HermitianSystem {
    dim: usize,
    entries: Vec<(usize, usize, Complex<f64>)>,
    rhs: Vec<Complex<f64>>,
}

impl HermitianSystem {
    /// Create an empty system with `dim` complex unknowns.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
            rhs: vec![Complex::new(0.0, 0.0); dim],
        }
    }

    /// Number of complex unknowns.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Accumulate a matrix entry.
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: Complex<f64>) {
        self.entries.push((row, col, value));
    }

    /// Accumulate a right-hand side entry.
    #[inline]
    pub fn add_rhs(&mut self, row: usize, value: Complex<f64>) {
        self.rhs[row] += value;
    }

    /// The equivalent real symmetric system.
    ///
    /// Unknown `k` of the real system is `Re z_k` for `k < dim` and
    /// `Im z_(k - dim)` otherwise.
    pub fn to_real(&self) -> SymmetricSystem {
        let n = self.dim;
        let mut triplets = Vec::with_capacity(self.entries.len() * 4);
        for &(r, c, v) in &self.entries {
            if v.re != 0.0 {
                triplets.push((r, c, v.re));
                triplets.push((n + r, n + c, v.re));
            }
            if v.im != 0.0 {
                triplets.push((r, n + c, -v.im));
                triplets.push((n + r, c, v.im));
            }
        }

        let mut rhs = vec![0.0; 2 * n];
        for (i, b) in self.rhs.iter().enumerate() {
            rhs[i] = b.re;
            rhs[n + i] = b.im;
        }

        SymmetricSystem {
            dim: 2 * n,
            triplets,
            rhs,
        }
    }

    /// Solve the system.
    pub fn solve(&self, settings: &SolverSettings) -> Result<Vec<Complex<f64>>> {
        let x = self.to_real().solve(settings)?;
        Ok(to_complex(&x))
    }
}

/// Reassemble complex unknowns from the real embedding.
pub fn to_complex(x: &DVector<f64>) -> Vec<Complex<f64>> {
    let n = x.len() / 2;
    (0..n).map(|i| Complex::new(x[i], x[n + i])).collect()
}
