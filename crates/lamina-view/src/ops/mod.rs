//! View Operations - Arithmetic Driven Through the Kernel
//!
//! Vectors and matrices compute by leasing their payloads, building strided
//! operands over the leased bases and handing them to the process-wide
//! `CpuKernel`. This module holds the aliasing rules shared by all of them.
//!
//! # Categories
//!
//! ## Elementwise
//! - `add`, `sub`, `mul`, `div` - Binary results into a target view
//! - `exp`, `ln`, `sqrt`, `tanh`, `sigmoid`, `relu` - Unary maps
//!
//! ## Reductions
//! - `dot`, `norm_1`, `norm_2`, `sum`, `max`, `argmax`
//!
//! ## Dense
//! - `Matrix::dot`, `transpose_from`, `transpose_in_place`
//!
//! ## Fills
//! - `fill`, `fill_zero`, `fill_with`, `fill_rnd`, `fill_randn`
//!
//! A target may be exactly the same view as an input (in-place). Any other
//! overlap between a target and an input is rejected with
//! `Error::Aliasing`; dense products reject every overlap.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

mod fill;
mod matrix_ops;
mod vector_ops;

use lamina_core::{Error, Payload, Result, Scalar};

// =============================================================================
// Extents
// =============================================================================

/// The payload indices a view addresses, as an arithmetic progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extent {
    first: isize,
    len: usize,
    step: isize,
}

impl Extent {
    pub(crate) fn new(offset: usize, len: usize, step: isize) -> Self {
        Self {
            first: offset as isize,
            len,
            step,
        }
    }

    fn bounds(&self) -> (isize, isize) {
        let last = self.first + self.step * (self.len as isize - 1);
        (self.first.min(last), self.first.max(last))
    }

    fn contains(&self, index: isize) -> bool {
        let delta = index - self.first;
        if self.step == 0 {
            return delta == 0;
        }
        if delta % self.step != 0 {
            return false;
        }
        let k = delta / self.step;
        k >= 0 && (k as usize) < self.len
    }

    /// Returns true if the progressions share an index.
    pub(crate) fn intersects(&self, other: &Self) -> bool {
        if self.len == 0 || other.len == 0 {
            return false;
        }
        let (lo, hi) = self.bounds();
        let (other_lo, other_hi) = other.bounds();
        if hi < other_lo || other_hi < lo {
            return false;
        }
        let (short, long) = if self.len <= other.len {
            (self, other)
        } else {
            (other, self)
        };
        (0..short.len as isize).any(|k| long.contains(short.first + short.step * k))
    }
}

// =============================================================================
// Aliasing Rules
// =============================================================================

/// Checks a target/input pair for elementwise operations: an exact
/// self-view is allowed, any other shared element is not.
pub(crate) fn check_elementwise<T: Scalar>(
    target: (&Payload<T>, Extent),
    input: (&Payload<T>, Extent),
) -> Result<()> {
    if !target.0.ptr_eq(input.0) || target.1 == input.1 {
        return Ok(());
    }
    if target.1.intersects(&input.1) {
        return Err(Error::aliasing(
            "target overlaps an input without being the same view",
        ));
    }
    Ok(())
}

/// Checks a target/input pair for dense products: no shared element at all.
pub(crate) fn check_dense<T: Scalar>(
    target: (&Payload<T>, Extent),
    input: (&Payload<T>, Extent),
) -> Result<()> {
    if target.0.ptr_eq(input.0) && target.1.intersects(&input.1) {
        return Err(Error::aliasing("dense product target overlaps an input"));
    }
    Ok(())
}

pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::shape_mismatch(&[expected], &[actual]))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_intersects() {
        let even = Extent::new(0, 5, 2);
        let odd = Extent::new(1, 5, 2);
        let reversed = Extent::new(8, 5, -2);
        let thirds = Extent::new(0, 4, 3);

        assert!(!even.intersects(&odd));
        assert!(even.intersects(&reversed));
        assert!(even.intersects(&thirds));
        assert!(!odd.intersects(&Extent::new(10, 3, 1)));
        assert!(!even.intersects(&Extent::new(0, 0, 1)));
    }

    #[test]
    fn test_elementwise_rules() {
        let payload = Payload::<f32>::construct(10).unwrap();
        let other = Payload::<f32>::construct(10).unwrap();
        let all = Extent::new(0, 10, 1);

        assert!(check_elementwise((&payload, all), (&payload, all)).is_ok());
        assert!(check_elementwise((&payload, all), (&other, all)).is_ok());
        let reversed = Extent::new(9, 10, -1);
        assert!(check_elementwise((&payload, all), (&payload, reversed)).is_err());

        let (even, odd) = (Extent::new(0, 5, 2), Extent::new(1, 5, 2));
        assert!(check_elementwise((&payload, even), (&payload, odd)).is_ok());

        let (lo, hi) = (Extent::new(0, 5, 1), Extent::new(5, 5, 1));
        assert!(check_dense((&payload, all), (&payload, all)).is_err());
        assert!(check_dense((&payload, lo), (&payload, hi)).is_ok());
    }
}
