//! Linear-algebra helpers for the covariance matrix.
//!
//! The covariance matrix `C` is the single source of truth of the search
//! distribution's shape. [`Eigensystem`] is a cache of views derived from it
//! (`B`, `D`, `C^{-1/2}` and `B·D`) and is only ever produced by
//! [`Eigensystem::decompose`].

use nalgebra::linalg::SymmetricEigen;
use nalgebra::{DMatrix, DVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Iteration cap handed to the symmetric QR solver.
const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Eigenvalues below this are treated as round-off and lifted to it.
const EIGENVALUE_FLOOR: f64 = 1e-20;

/// Relative tolerance for negative eigenvalues before `C` is rejected.
const NEGATIVE_EIGENVALUE_TOLERANCE: f64 = 1e-10;

/// Cached eigendecomposition `C = B·diag(D²)·Bᵀ`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Eigensystem {
    /// Orthonormal eigenvectors of `C` (one per column).
    pub b: DMatrix<f64>,
    /// Square roots of the eigenvalues of `C`.
    pub d: DVector<f64>,
    /// `C^{-1/2} = B·D⁻¹·Bᵀ`.
    pub inv_sqrt_c: DMatrix<f64>,
    /// `B·D`, the transform from standard normal draws to `N(0, C)`.
    pub bd: DMatrix<f64>,
}

impl Eigensystem {
    /// The eigensystem of the `n×n` identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            b: DMatrix::identity(n, n),
            d: DVector::from_element(n, 1.0),
            inv_sqrt_c: DMatrix::identity(n, n),
            bd: DMatrix::identity(n, n),
        }
    }

    /// Decomposes a symmetric positive-semidefinite matrix.
    ///
    /// Eigenvalues within round-off of zero (or slightly negative) are lifted
    /// to a tiny positive floor so that `C^{-1/2}` stays finite.
    ///
    /// # Errors
    ///
    /// Returns `Error::NonFiniteCovariance` if `c` holds NaN or infinite
    /// entries, `Error::EigenDecomposition` if the solver does not converge,
    /// and `Error::NotPositiveSemidefinite` if an eigenvalue is clearly
    /// negative.
    pub fn decompose(c: &DMatrix<f64>) -> Result<Self> {
        if c.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteCovariance);
        }

        let eigen = SymmetricEigen::try_new(c.clone(), f64::EPSILON, EIGEN_MAX_ITERATIONS)
            .ok_or(Error::EigenDecomposition)?;

        let max_abs = eigen.eigenvalues.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let tolerance = NEGATIVE_EIGENVALUE_TOLERANCE * max_abs.max(1.0);
        if let Some(&worst) = eigen
            .eigenvalues
            .iter()
            .find(|&&ev| ev < -tolerance || !ev.is_finite())
        {
            return Err(Error::NotPositiveSemidefinite(worst));
        }

        let d = eigen.eigenvalues.map(|ev| ev.max(EIGENVALUE_FLOOR).sqrt());
        let b = eigen.eigenvectors;
        let d_inv = d.map(|v| 1.0 / v);
        let inv_sqrt_c = &b * DMatrix::from_diagonal(&d_inv) * b.transpose();
        let bd = &b * DMatrix::from_diagonal(&d);

        Ok(Self {
            b,
            d,
            inv_sqrt_c,
            bd,
        })
    }

    /// Ratio of the largest to the smallest entry of `D` (the axis ratio).
    #[must_use]
    pub fn axis_ratio(&self) -> f64 {
        let max = self.d.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.d.iter().copied().fold(f64::INFINITY, f64::min);
        max / min
    }
}

/// Forces `c` symmetric by mirroring its upper triangle onto the lower one.
pub fn symmetrize(c: &mut DMatrix<f64>) {
    let n = c.nrows();
    for i in 0..n {
        for j in 0..i {
            c[(i, j)] = c[(j, i)];
        }
    }
}

/// Largest absolute difference `|C[i][j] - C[j][i]|`.
#[must_use]
pub fn max_asymmetry(c: &DMatrix<f64>) -> f64 {
    let n = c.nrows();
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in 0..i {
            worst = worst.max((c[(i, j)] - c[(j, i)]).abs());
        }
    }
    worst
}
