//! Vector-Matrix Products
//!
//! Matrix-vector products and rank-1 updates between `Vector` and `Matrix`
//! views. All of them are dense products: the result must not share any
//! element with an operand.
//!
//! # Key Features
//! - `mat_dot_vec` / `vec_dot_mat` through the kernel's GEMV
//! - `outer` / `update_outer` through the kernel's rank-1 update
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use lamina_core::{CpuKernel, Error, Float, Kernel, Result};

use crate::matrix::Matrix;
use crate::ops::check_dense;
use crate::vector::Vector;

// =============================================================================
// Matrix-Vector Products
// =============================================================================

/// `result = m @ v`.
///
/// # Arguments
/// * `result` - Vector of length `m.rows()`
/// * `m` - The matrix
/// * `v` - Vector of length `m.cols()`
pub fn mat_dot_vec<T: Float>(result: &Vector<T>, m: &Matrix<T>, v: &Vector<T>) -> Result<()> {
    if m.cols() != v.len() || m.rows() != result.len() {
        return Err(Error::shape_mismatch(&[m.rows(), m.cols()], &[result.len(), v.len()]));
    }
    gemv(result, m, false, v)
}

/// `result = v @ m`, i.e. `m^T v`.
///
/// # Arguments
/// * `result` - Vector of length `m.cols()`
/// * `v` - Vector of length `m.rows()`
/// * `m` - The matrix
pub fn vec_dot_mat<T: Float>(result: &Vector<T>, v: &Vector<T>, m: &Matrix<T>) -> Result<()> {
    if m.rows() != v.len() || m.cols() != result.len() {
        return Err(Error::shape_mismatch(&[m.rows(), m.cols()], &[v.len(), result.len()]));
    }
    gemv(result, m, true, v)
}

fn gemv<T: Float>(
    result: &Vector<T>,
    m: &Matrix<T>,
    transpose: bool,
    v: &Vector<T>,
) -> Result<()> {
    check_dense((&result.payload, result.extent()), (&m.payload, m.extent()))?;
    check_dense((&result.payload, result.extent()), (&v.payload, v.extent()))?;
    result
        .payload
        .lease_mut(&[&m.payload, &v.payload], |base, sources| -> Result<()> {
            let a = m.operand(&sources[0])?;
            let a = if transpose { a.t() } else { a };
            let x = v.operand(&sources[1])?;
            let y = result.operand_mut(&base)?;
            CpuKernel::global().gemv(T::one(), a, x, T::zero(), y)
        })?
}

// =============================================================================
// Rank-1 Updates
// =============================================================================

/// `result = left right^T`.
pub fn outer<T: Float>(result: &Matrix<T>, left: &Vector<T>, right: &Vector<T>) -> Result<()> {
    check_outer(result, left, right)?;
    result.fill_zero()?;
    ger(result, T::one(), left, right)
}

/// `target += alpha * left right^T`.
pub fn update_outer<T: Float>(
    target: &Matrix<T>,
    alpha: T,
    left: &Vector<T>,
    right: &Vector<T>,
) -> Result<()> {
    check_outer(target, left, right)?;
    ger(target, alpha, left, right)
}

fn check_outer<T: Float>(target: &Matrix<T>, left: &Vector<T>, right: &Vector<T>) -> Result<()> {
    if target.rows() != left.len() || target.cols() != right.len() {
        return Err(Error::shape_mismatch(&[left.len(), right.len()], &target.shape()));
    }
    check_dense((&target.payload, target.extent()), (&left.payload, left.extent()))?;
    check_dense((&target.payload, target.extent()), (&right.payload, right.extent()))
}

fn ger<T: Float>(target: &Matrix<T>, alpha: T, left: &Vector<T>, right: &Vector<T>) -> Result<()> {
    target
        .payload
        .lease_mut(&[&left.payload, &right.payload], |base, sources| -> Result<()> {
            let x = left.operand(&sources[0])?;
            let y = right.operand(&sources[1])?;
            CpuKernel::global().ger(alpha, x, y, target.operand_mut(&base)?)
        })?
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::Slice;

    fn grid() -> Matrix<f64> {
        Matrix::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap()
    }

    #[test]
    fn test_mat_dot_vec() {
        let m = grid();
        let v = Vector::from_slice(&[1.0, 0.0, -1.0]).unwrap();
        let out = Vector::construct(2).unwrap();
        mat_dot_vec(&out, &m, &v).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![-2.0, -2.0]);

        assert!(matches!(mat_dot_vec(&out, &m, &out), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_vec_dot_mat() {
        let m = grid();
        let v = Vector::from_slice(&[1.0, 2.0]).unwrap();
        let out = Vector::construct(3).unwrap();
        vec_dot_mat(&out, &v, &m).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_strided_operands() {
        let m = grid();
        let column = m.column_at(1);
        let out = Vector::construct(2).unwrap();
        let square = m.view(0, 2, 2);
        mat_dot_vec(&out, &square, &Vector::from_slice(&[1.0, 1.0]).unwrap()).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![3.0, 7.0]);

        let reversed = Vector::from_slice(&[1.0, 0.0, 2.0])
            .unwrap()
            .view_slice(&Slice::from(2, -1));
        mat_dot_vec(&column, &Matrix::from_slice(&[1.0; 6], 2, 3).unwrap(), &reversed)
            .unwrap();
        assert_eq!(m.to_vec().unwrap(), vec![1.0, 3.0, 3.0, 4.0, 3.0, 6.0]);
    }

    #[test]
    fn test_product_rejects_overlap() {
        let m = Matrix::<f64>::construct(3, 3).unwrap();
        let row = Vector::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            mat_dot_vec(&m.row_at(1), &m, &row),
            Err(Error::Aliasing { .. })
        ));
        assert!(matches!(
            mat_dot_vec(&row, &m, &row),
            Err(Error::Aliasing { .. })
        ));
    }

    #[test]
    fn test_outer() {
        let l = Vector::from_slice(&[1.0, 2.0]).unwrap();
        let r = Vector::from_slice(&[3.0, 4.0, 5.0]).unwrap();
        let out = Matrix::from_slice(&[9.0; 6], 2, 3).unwrap();
        outer(&out, &l, &r).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);

        update_outer(&out, -1.0, &l, &r).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![0.0; 6]);

        assert!(outer(&out, &r, &l).is_err());
        let head = out.row_at(0).view(0, 2, 1);
        assert!(matches!(outer(&out, &head, &r), Err(Error::Aliasing { .. })));
    }
}
