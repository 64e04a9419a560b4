//! Vector Arithmetic
//!
//! Elementwise maps, reductions and in-place updates on `Vector`. Every
//! operation that writes takes the target as `&self`: views share their
//! payload, so the write is visible through all of them.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use lamina_core::kernel::{Binary, Strided, Unary};
use lamina_core::{CpuKernel, Error, Float, Kernel, Payload, Result};

use super::{check_elementwise, check_len};
use crate::vector::Vector;

// =============================================================================
// Kernel Plumbing
// =============================================================================

impl<T: Float> Vector<T> {
    fn guard(&self, input: &Self) -> Result<()> {
        check_len(self.len, input.len)?;
        check_elementwise(
            (&self.payload, self.extent()),
            (&input.payload, input.extent()),
        )
    }

    /// `self[i] = op(src[i])`.
    fn map_from(&self, op: Unary, src: &Self) -> Result<()> {
        self.guard(src)?;
        self.payload.lease_mut(&[&src.payload], |base, sources| -> Result<()> {
            let x = src.operand(&sources[0])?;
            let y = self.operand_mut(&base)?;
            CpuKernel::global().unary(op, x, y);
            Ok(())
        })?
    }

    /// `self[i] = op(left[i], right[i])`.
    fn zip_from(&self, op: Binary, left: &Self, right: &Self) -> Result<()> {
        self.guard(left)?;
        self.guard(right)?;
        self.payload
            .lease_mut(&[&left.payload, &right.payload], |base, sources| -> Result<()> {
                let a = left.operand(&sources[0])?;
                let b = right.operand(&sources[1])?;
                let y = self.operand_mut(&base)?;
                CpuKernel::global().binary(op, a, b, y);
                Ok(())
            })?
    }

    /// `self[i] = op(src[i], value)`, or `op(value, src[i])` when
    /// `scalar_first` is set.
    fn zip_scalar(&self, op: Binary, src: &Self, value: T, scalar_first: bool) -> Result<()> {
        self.guard(src)?;
        self.payload.lease_mut(&[&src.payload], |base, sources| -> Result<()> {
            let x = src.operand(&sources[0])?;
            let s = Strided::broadcast(&value, x.len());
            let y = self.operand_mut(&base)?;
            let (a, b) = if scalar_first { (s, x) } else { (x, s) };
            CpuKernel::global().binary(op, a, b, y);
            Ok(())
        })?
    }

    fn reduce<R>(&self, f: impl FnOnce(Strided<'_, T>) -> R) -> Result<R> {
        Payload::lease(&[&self.payload], |bases| -> Result<R> {
            Ok(f(self.operand(&bases[0])?))
        })?
    }
}

// =============================================================================
// Assignment and Fills
// =============================================================================

impl<T: Float> Vector<T> {
    /// Copies `src` element by element into this view.
    pub fn assign(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Copy, src)
    }

    /// Copies a contiguous slice into this view.
    pub fn copy_from_slice(&self, data: &[T]) -> Result<()> {
        check_len(self.len, data.len())?;
        self.payload.lease_mut(&[], |base, _| -> Result<()> {
            let y = self.operand_mut(&base)?;
            CpuKernel::global().unary(Unary::Copy, Strided::from_slice(data), y);
            Ok(())
        })?
    }

    /// Sets every element to `value`.
    pub fn fill(&self, value: T) -> Result<()> {
        self.payload.lease_mut(&[], |base, _| -> Result<()> {
            let y = self.operand_mut(&base)?;
            let s = Strided::broadcast(&value, y.len());
            CpuKernel::global().unary(Unary::Copy, s, y);
            Ok(())
        })?
    }

    /// Sets every element to zero.
    pub fn fill_zero(&self) -> Result<()> {
        self.fill(T::zero())
    }
}

// =============================================================================
// Elementwise Arithmetic
// =============================================================================

impl<T: Float> Vector<T> {
    /// `self = left + right`.
    pub fn add(&self, left: &Self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Add, left, right)
    }

    /// `self = left - right`.
    pub fn sub(&self, left: &Self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Sub, left, right)
    }

    /// `self = left * right` (elementwise).
    pub fn mul(&self, left: &Self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Mul, left, right)
    }

    /// `self = left / right` (elementwise).
    pub fn div(&self, left: &Self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Div, left, right)
    }

    /// `self = alpha * src`.
    pub fn scaled(&self, src: &Self, alpha: T) -> Result<()> {
        self.zip_scalar(Binary::Mul, src, alpha, false)
    }

    /// `self = value - src`.
    pub fn scalar_sub(&self, value: T, src: &Self) -> Result<()> {
        self.zip_scalar(Binary::Sub, src, value, true)
    }

    /// `self += right`.
    pub fn add_assign(&self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Add, self, right)
    }

    /// `self -= right`.
    pub fn sub_assign(&self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Sub, self, right)
    }

    /// `self *= right` (elementwise).
    pub fn mul_assign(&self, right: &Self) -> Result<()> {
        self.zip_from(Binary::Mul, self, right)
    }

    /// `self += value` for every element.
    pub fn add_scalar(&self, value: T) -> Result<()> {
        self.zip_scalar(Binary::Add, self, value, false)
    }

    /// `self *= alpha`.
    pub fn scale(&self, alpha: T) -> Result<()> {
        self.payload.lease_mut(&[], |base, _| -> Result<()> {
            CpuKernel::global().scal(alpha, self.operand_mut(&base)?);
            Ok(())
        })?
    }

    /// `self += alpha * right`.
    pub fn update(&self, alpha: T, right: &Self) -> Result<()> {
        self.guard(right)?;
        self.payload.lease_mut(&[&right.payload], |base, sources| -> Result<()> {
            let x = right.operand(&sources[0])?;
            CpuKernel::global().axpy(alpha, x, self.operand_mut(&base)?);
            Ok(())
        })?
    }

    /// `self = sign(src)`: +1 or -1 carrying the sign bit of each element.
    pub fn sign(&self, src: &Self) -> Result<()> {
        self.zip_scalar(Binary::CopySign, src, T::one(), true)
    }

    /// `self = theta(src)`: 1 where the sign bit is clear, 0 where set.
    pub fn theta(&self, src: &Self) -> Result<()> {
        self.zip_scalar(Binary::CopySign, src, T::HALF, true)?;
        self.add_scalar(T::HALF)
    }
}

// =============================================================================
// Maps
// =============================================================================

impl<T: Float> Vector<T> {
    /// Applies `f` to every element in place.
    ///
    /// Prefer the dedicated maps below where one exists.
    pub fn apply(&self, f: impl Fn(T) -> T) -> Result<()> {
        let mapped: Vec<T> = self.to_vec()?.into_iter().map(f).collect();
        self.copy_from_slice(&mapped)
    }

    /// `self = exp(src)`.
    pub fn exp(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Exp, src)
    }

    /// `self = ln(src)`.
    pub fn ln(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Ln, src)
    }

    /// `self = log2(src)`.
    pub fn log2(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Log2, src)
    }

    /// `self = 1 / src`.
    pub fn inv(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Inv, src)
    }

    /// `self = sqrt(src)`.
    pub fn sqrt(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Sqrt, src)
    }

    /// `self = src * src`.
    pub fn square(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Square, src)
    }

    /// `self = tanh(src)`.
    pub fn tanh(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Tanh, src)
    }

    /// `self = 1 / (1 + exp(-src))`.
    pub fn sigmoid(&self, src: &Self) -> Result<()> {
        self.map_from(Unary::Neg, src)?;
        self.map_from(Unary::Exp, self)?;
        self.add_scalar(T::one())?;
        self.map_from(Unary::Inv, self)
    }

    /// `self = max(src, 0)`.
    pub fn relu(&self, src: &Self) -> Result<()> {
        self.zip_scalar(Binary::Max, src, T::zero(), false)
    }

    /// `self = exp(src) / sum(exp(src))`.
    ///
    /// The maximum is subtracted before exponentiating.
    pub fn softmax(&self, src: &Self) -> Result<()> {
        let max = src.max()?;
        self.zip_scalar(Binary::Sub, src, max, false)?;
        self.map_from(Unary::Exp, self)?;
        let total = self.sum()?;
        self.scale(total.recip())
    }
}

// =============================================================================
// Reductions
// =============================================================================

impl<T: Float> Vector<T> {
    /// Inner product with `other`.
    pub fn dot(&self, other: &Self) -> Result<T> {
        check_len(self.len, other.len)?;
        Payload::lease(&[&self.payload, &other.payload], |bases| -> Result<T> {
            let x = self.operand(&bases[0])?;
            let y = other.operand(&bases[1])?;
            Ok(CpuKernel::global().dot(x, y))
        })?
    }

    /// Euclidean norm.
    pub fn norm_2(&self) -> Result<T> {
        self.reduce(|x| CpuKernel::global().nrm2(x))
    }

    /// Sum of absolute values.
    pub fn norm_1(&self) -> Result<T> {
        self.reduce(|x| CpuKernel::global().asum(x))
    }

    /// Sum of elements.
    pub fn sum(&self) -> Result<T> {
        let one = T::one();
        self.reduce(|x| CpuKernel::global().dot(x, Strided::broadcast(&one, x.len())))
    }

    /// Largest element.
    pub fn max(&self) -> Result<T> {
        let index = self.argmax()?;
        self.get(index as isize)
    }

    /// Position of the largest element (the first one on ties).
    pub fn argmax(&self) -> Result<usize> {
        self.reduce(|x| {
            let mut best = 0;
            for i in 1..x.len() {
                if x.get(i) > x.get(best) {
                    best = i;
                }
            }
            best
        })
    }

    /// Returns true if `2 |a - b| / (|a| + |b|) < eps` in the Euclidean norm.
    ///
    /// Two zero vectors are close.
    pub fn is_close(&self, other: &Self, eps: T) -> Result<bool> {
        if eps <= T::zero() {
            return Err(Error::invalid_operation("tolerance must be positive"));
        }
        check_len(self.len, other.len)?;
        let total = self.norm_2()? + other.norm_2()?;
        if total == T::zero() {
            return Ok(true);
        }
        let diff = Self::construct(self.len)?;
        diff.sub(self, other)?;
        let two = T::one() + T::one();
        Ok(two * diff.norm_2()? / total < eps)
    }
}

// =============================================================================
// Tests
// =============================================================================
