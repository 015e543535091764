//! Dense/sparse linear algebra primitives used by assembly and the solver.
//!
//! Grounded in the predecessor crate's `matrix::MatrixOps`: a thin static
//! wrapper over `nalgebra` decompositions, kept dense for the target scale
//! (assembly builds the stiffness matrix densely but also emits a sparse
//! `nalgebra_sparse` COO form so a future sparse factorization slots in
//! without touching the assembler).

use nalgebra::{Cholesky, DMatrix, DVector, LU};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::error::{FeaError, Result};

/// Solve `Ax = b`, preferring Cholesky when `a` is symmetric positive
/// definite and falling back to LU otherwise.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() != a.ncols() {
        return Err(FeaError::Matrix("matrix must be square".into()));
    }
    if a.nrows() != b.len() {
        return Err(FeaError::Matrix("matrix and vector dimensions must match".into()));
    }

    if is_symmetric(a) {
        if let Some(chol) = Cholesky::new(a.clone()) {
            return Ok(chol.solve(b));
        }
    }
    solve_lu(a, b)
}

pub fn solve_lu(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    LU::new(a.clone())
        .solve(b)
        .ok_or_else(|| FeaError::Matrix("matrix is singular".into()))
}

pub fn is_symmetric(a: &DMatrix<f64>) -> bool {
    if a.nrows() != a.ncols() {
        return false;
    }
    let n = a.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (a[(i, j)] - a[(j, i)]).abs() > 1e-9 * a[(i, j)].abs().max(1.0) {
                return false;
            }
        }
    }
    true
}

/// `u^T K u`, used to check invariant 3 (energy non-negativity) in tests.
pub fn quadratic_form(k: &DMatrix<f64>, u: &DVector<f64>) -> f64 {
    (u.transpose() * k * u)[(0, 0)]
}

pub fn frobenius_norm_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    (a - b).norm()
}

/// Assemble a dense global matrix from element contributions addressed by
/// global DOF index. Sequential; callers needing the `rayon` intra-assembly
/// fan-out build per-element matrices in parallel and then fold them here.
pub fn assemble_dense(contributions: &[(Vec<usize>, DMatrix<f64>)], num_dofs: usize) -> DMatrix<f64> {
    let mut global = DMatrix::zeros(num_dofs, num_dofs);
    for (dofs, local) in contributions {
        add_local_into_global(&mut global, local, dofs);
    }
    global
}

pub fn add_local_into_global(global: &mut DMatrix<f64>, local: &DMatrix<f64>, dofs: &[usize]) {
    for (i, &gi) in dofs.iter().enumerate() {
        for (j, &gj) in dofs.iter().enumerate() {
            global[(gi, gj)] += local[(i, j)];
        }
    }
}

/// Mirror the same contributions into a sparse COO/CSR matrix. Kept
/// alongside the dense assembly (never the sole path) so a future sparse
/// factorization can be introduced without changing the assembler's call
/// sites.
pub fn assemble_sparse(contributions: &[(Vec<usize>, DMatrix<f64>)], num_dofs: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(num_dofs, num_dofs);
    for (dofs, local) in contributions {
        for (i, &gi) in dofs.iter().enumerate() {
            for (j, &gj) in dofs.iter().enumerate() {
                let value = local[(i, j)];
                if value != 0.0 {
                    coo.push(gi, gj, value);
                }
            }
        }
    }
    CsrMatrix::from(&coo)
}

/// Apply restrained DOFs by the penalty method: add `factor * max(diag K)`
/// to each restrained diagonal and zero the corresponding load entry,
/// rather than a fixed absolute penalty, so conditioning tracks the
/// problem's own stiffness scale.
pub fn apply_penalty_constraints(
    k: &mut DMatrix<f64>,
    f: &mut DVector<f64>,
    restrained_dofs: &[usize],
    factor: f64,
) {
    let max_diag = (0..k.nrows()).map(|i| k[(i, i)].abs()).fold(0.0_f64, f64::max);
    let penalty = factor * max_diag.max(1.0);
    for &dof in restrained_dofs {
        k[(dof, dof)] += penalty;
        f[dof] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_spd_system() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        let x = solve_linear_system(&a, &b).unwrap();
        assert!((a.clone() * x - b).norm() < 1e-9);
    }

    #[test]
    fn detects_asymmetry() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
        assert!(!is_symmetric(&a));
    }

    #[test]
    fn penalty_scales_with_stiffness() {
        let mut k = DMatrix::from_row_slice(2, 2, &[1e9, 0.0, 0.0, 1e9]);
        let mut f = DVector::from_row_slice(&[5.0, 5.0]);
        apply_penalty_constraints(&mut k, &mut f, &[0], 1e12);
        assert!(k[(0, 0)] > 1e18);
        assert_eq!(f[0], 0.0);
    }
}
