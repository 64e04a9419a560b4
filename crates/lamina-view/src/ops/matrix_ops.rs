//! Matrix Arithmetic
//!
//! Elementwise operations run over the matrix's contiguous block as one
//! flat vector once the shapes agree; products and transposes go through
//! the kernel's two-dimensional operands.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use lamina_core::{CpuKernel, Error, Float, Kernel, Result};

use super::{check_dense, check_elementwise};
use crate::matrix::Matrix;

impl<T: Float> Matrix<T> {
    fn same_shape(&self, other: &Self) -> Result<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(Error::shape_mismatch(&self.shape(), &other.shape()))
        }
    }

    fn guard(&self, input: &Self) -> Result<()> {
        self.same_shape(input)?;
        check_elementwise(
            (&self.payload, self.extent()),
            (&input.payload, input.extent()),
        )
    }

    // =========================================================================
    // Assignment and Fills
    // =========================================================================

    /// Copies `src` into this matrix.
    pub fn assign(&self, src: &Self) -> Result<()> {
        self.guard(src)?;
        self.flat().assign(&src.flat())
    }

    /// Sets every element to `value`.
    pub fn fill(&self, value: T) -> Result<()> {
        self.flat().fill(value)
    }

    /// Sets every element to zero.
    pub fn fill_zero(&self) -> Result<()> {
        self.fill(T::zero())
    }

    // =========================================================================
    // Elementwise Arithmetic
    // =========================================================================

    /// `self = left + right`.
    pub fn add(&self, left: &Self, right: &Self) -> Result<()> {
        self.guard(left)?;
        self.guard(right)?;
        self.flat().add(&left.flat(), &right.flat())
    }

    /// `self = left - right`.
    pub fn sub(&self, left: &Self, right: &Self) -> Result<()> {
        self.guard(left)?;
        self.guard(right)?;
        self.flat().sub(&left.flat(), &right.flat())
    }

    /// `self = left * right` (elementwise).
    pub fn mul(&self, left: &Self, right: &Self) -> Result<()> {
        self.guard(left)?;
        self.guard(right)?;
        self.flat().mul(&left.flat(), &right.flat())
    }

    /// `self = left / right` (elementwise).
    pub fn div(&self, left: &Self, right: &Self) -> Result<()> {
        self.guard(left)?;
        self.guard(right)?;
        self.flat().div(&left.flat(), &right.flat())
    }

    /// `self += right`.
    pub fn add_assign(&self, right: &Self) -> Result<()> {
        self.guard(right)?;
        self.flat().add_assign(&right.flat())
    }

    /// `self -= right`.
    pub fn sub_assign(&self, right: &Self) -> Result<()> {
        self.guard(right)?;
        self.flat().sub_assign(&right.flat())
    }

    /// `self *= right` (elementwise).
    pub fn mul_assign(&self, right: &Self) -> Result<()> {
        self.guard(right)?;
        self.flat().mul_assign(&right.flat())
    }

    /// `self += value` for every element.
    pub fn add_scalar(&self, value: T) -> Result<()> {
        self.flat().add_scalar(value)
    }

    /// `self *= alpha`.
    pub fn scale(&self, alpha: T) -> Result<()> {
        self.flat().scale(alpha)
    }

    /// `self += alpha * right`.
    pub fn update(&self, alpha: T, right: &Self) -> Result<()> {
        self.guard(right)?;
        self.flat().update(alpha, &right.flat())
    }

    /// `self = src * src` (elementwise).
    pub fn square(&self, src: &Self) -> Result<()> {
        self.guard(src)?;
        self.flat().square(&src.flat())
    }

    /// `self = sqrt(src)`.
    pub fn sqrt(&self, src: &Self) -> Result<()> {
        self.guard(src)?;
        self.flat().sqrt(&src.flat())
    }

    // =========================================================================
    // Products and Transposes
    // =========================================================================

    /// `self = left @ right`.
    ///
    /// The target must not share any element with either operand.
    pub fn dot(&self, left: &Self, right: &Self) -> Result<()> {
        if left.cols != right.rows || self.rows != left.rows || self.cols != right.cols {
            return Err(Error::shape_mismatch(
                &[left.rows, right.cols],
                &self.shape(),
            ));
        }
        check_dense((&self.payload, self.extent()), (&left.payload, left.extent()))?;
        check_dense((&self.payload, self.extent()), (&right.payload, right.extent()))?;
        self.payload
            .lease_mut(&[&left.payload, &right.payload], |base, sources| -> Result<()> {
                let a = left.operand(&sources[0])?;
                let b = right.operand(&sources[1])?;
                let c = self.operand_mut(&base)?;
                CpuKernel::global().gemm(T::one(), a, b, T::zero(), c)
            })?
    }

    /// `self = src^T`, out of place.
    pub fn transpose_from(&self, src: &Self) -> Result<()> {
        if self.rows != src.cols || self.cols != src.rows {
            return Err(Error::shape_mismatch(&[src.cols, src.rows], &self.shape()));
        }
        check_dense((&self.payload, self.extent()), (&src.payload, src.extent()))?;
        self.payload
            .lease_mut(&[&src.payload], |base, sources| -> Result<()> {
                let a = src.operand(&sources[0])?;
                CpuKernel::global().transpose(a, self.operand_mut(&base)?)
            })?
    }

    /// Transposes the block in place; afterwards this view is
    /// `cols x rows`.
    ///
    /// Other views over the same payload see the permuted elements.
    pub fn transpose_in_place(&mut self) -> Result<()> {
        let (rows, cols) = (self.rows, self.cols);
        let offset = self.offset;
        self.payload.lease_mut(&[], |base, _| -> Result<()> {
            let data = base.strided_mut(offset, rows * cols, 1)?;
            CpuKernel::global().transpose_in_place(data, rows, cols)
        })??;
        self.rows = cols;
        self.cols = rows;
        Ok(())
    }

    // =========================================================================
    // Reductions
    // =========================================================================

    /// Frobenius norm.
    pub fn norm_2(&self) -> Result<T> {
        self.flat().norm_2()
    }

    /// Sum of elements.
    pub fn sum(&self) -> Result<T> {
        self.flat().sum()
    }

    /// Relative closeness in the Frobenius norm, as [`Vector::is_close`].
    ///
    /// Matrices of different shapes are never close; a matrix is always
    /// close to a view of the same block.
    ///
    /// [`Vector::is_close`]: crate::Vector::is_close
    pub fn is_close(&self, other: &Self, eps: T) -> Result<bool> {
        if self.shape() != other.shape() {
            return Ok(false);
        }
        if self.payload.ptr_eq(&other.payload) && self.offset == other.offset {
            return Ok(true);
        }
        self.flat().is_close(&other.flat(), eps)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(data: &[f64], rows: usize, cols: usize) -> Matrix<f64> {
        Matrix::from_slice(data, rows, cols).unwrap()
    }

    #[test]
    fn test_elementwise() {
        let a = matrix(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = matrix(&[4.0, 3.0, 2.0, 1.0], 2, 2);
        let out = Matrix::construct(2, 2).unwrap();

        out.add(&a, &b).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![5.0; 4]);
        out.sub(&a, &b).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![-3.0, -1.0, 1.0, 3.0]);
        out.mul(&a, &b).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![4.0, 6.0, 6.0, 4.0]);
        out.div(&a, &b).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![0.25, 2.0 / 3.0, 1.5, 4.0]);

        out.assign(&a).unwrap();
        out.add_assign(&b).unwrap();
        out.sub_assign(&a).unwrap();
        out.mul_assign(&a).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![4.0, 6.0, 6.0, 4.0]);
        out.update(0.5, &b).unwrap();
        out.add_scalar(-1.0).unwrap();
        out.scale(2.0).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![10.0, 13.0, 12.0, 7.0]);
    }

    #[test]
    fn test_shape_checks() {
        let wide = Matrix::<f64>::construct(2, 3).unwrap();
        let tall = Matrix::<f64>::construct(3, 2).unwrap();
        assert!(matches!(wide.assign(&tall), Err(Error::ShapeMismatch { .. })));
        assert!(wide.dot(&wide, &tall).is_err());
        assert!(!wide.is_close(&tall, 1e-6).unwrap());
    }

    #[test]
    fn test_square_sqrt_and_reductions() {
        let a = matrix(&[1.0, 4.0, 9.0, 16.0], 2, 2);
        let out = Matrix::construct(2, 2).unwrap();
        out.sqrt(&a).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.sum().unwrap(), 10.0);
        assert!((out.norm_2().unwrap() - 30.0_f64.sqrt()).abs() < 1e-12);
        out.square(&out.clone()).unwrap();
        assert_eq!(out.to_vec().unwrap(), a.to_vec().unwrap());
    }

    #[test]
    fn test_dot() {
        let a = matrix(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let b = matrix(&[7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2);
        let c = Matrix::construct(2, 2).unwrap();
        c.dot(&a, &b).unwrap();
        assert_eq!(c.to_vec().unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_dot_on_shared_payload() {
        let whole = Matrix::<f64>::construct(3, 4).unwrap();
        let data = [1.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0, 0.0];
        whole.flat().copy_from_slice(&data).unwrap();
        let eye = whole.view(0, 2, 2);
        let rhs = whole.view(4, 2, 2);
        let out = whole.view(8, 2, 2);

        out.dot(&eye, &rhs).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![2.0, 3.0, 4.0, 5.0]);
        assert!(matches!(out.dot(&out, &rhs), Err(Error::Aliasing { .. })));
    }

    #[test]
    fn test_transpose() {
        let a = matrix(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let t = Matrix::construct(3, 2).unwrap();
        t.transpose_from(&a).unwrap();
        assert_eq!(t.to_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert!(a.transpose_from(&a.clone()).is_err());

        let mut b = a.clone();
        b.transpose_in_place().unwrap();
        assert_eq!(b.shape(), [3, 2]);
        assert!(b.is_close(&t, 1e-12).unwrap());
        assert_eq!(a.shape(), [2, 3]);
    }

    #[test]
    fn test_is_close_same_block() {
        let a = matrix(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        let same = a.view(0, 2, 2);
        assert!(a.is_close(&same, 1e-12).unwrap());

        let b = matrix(&[1.0, 2.0, 3.0, 4.000_000_1], 2, 2);
        assert!(a.is_close(&b, 1e-6).unwrap());
        assert!(!a.is_close(&b, 1e-9).unwrap());
    }
}
