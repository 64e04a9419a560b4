//! Kernel - Strided Numeric Primitives
//!
//! Defines the operand types and the `Kernel` trait through which views hand
//! (pointer, count, stride) triples to elementwise, reduction and dense
//! linear-algebra primitives.
//!
//! Operands are only created through bounds-checked constructors on a
//! leased payload base (or from borrowed slices and scalars), so every
//! element a kernel addresses is known to be in range. A zero stride
//! broadcasts a single element; negative strides walk backwards.
//!
//! # Key Features
//! - Lifetime-bound strided operands (`Strided`, `StridedMut`)
//! - Two-dimensional operands with independent row/column strides
//! - Transposition as a stride swap
//! - Pluggable kernel implementations behind one trait
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

pub mod cpu;

pub use cpu::CpuKernel;

use core::marker::PhantomData;
use core::ops::Range;

use crate::dtype::{Float, Scalar};
use crate::error::{Error, Result};

// =============================================================================
// Operation Selectors
// =============================================================================

/// Elementwise unary operations, `y[i] = f(x[i])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unary {
    /// Copy.
    Copy,
    /// Square root.
    Sqrt,
    /// Square.
    Square,
    /// Natural exponential.
    Exp,
    /// Natural logarithm.
    Ln,
    /// Base-2 logarithm.
    Log2,
    /// Reciprocal.
    Inv,
    /// Hyperbolic tangent.
    Tanh,
    /// Negation.
    Neg,
}

/// Elementwise binary operations, `y[i] = f(a[i], b[i])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binary {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Maximum.
    Max,
    /// Magnitude of `a` with the sign of `b`.
    CopySign,
}

impl Unary {
    /// Applies the operation to one element.
    #[inline]
    pub fn apply<T: Float>(self, x: T) -> T {
        match self {
            Self::Copy => x,
            Self::Sqrt => x.sqrt(),
            Self::Square => x * x,
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Log2 => x.log2(),
            Self::Inv => x.recip(),
            Self::Tanh => x.tanh(),
            Self::Neg => -x,
        }
    }
}

impl Binary {
    /// Applies the operation to one pair of elements.
    #[inline]
    pub fn apply<T: Float>(self, a: T, b: T) -> T {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Max => {
                if a >= b || b.is_nan() {
                    a
                } else {
                    b
                }
            }
            Self::CopySign => {
                if b.is_sign_negative() {
                    -a.abs()
                } else {
                    a.abs()
                }
            }
        }
    }
}

// =============================================================================
// Bounds Helpers
// =============================================================================

fn in_bounds(index: isize, len: usize) -> bool {
    index >= 0 && (index as usize) < len
}

/// Index of element `i` of a progression, if it does not overflow.
fn progression(offset: usize, i: usize, stride: isize) -> Option<isize> {
    let offset = isize::try_from(offset).ok()?;
    let i = isize::try_from(i).ok()?;
    i.checked_mul(stride)?.checked_add(offset)
}

fn check_strided(base_len: usize, offset: usize, count: usize, stride: isize) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let first = progression(offset, 0, stride);
    let last = progression(offset, count - 1, stride);
    match (first, last) {
        (Some(first), Some(last)) if in_bounds(first, base_len) && in_bounds(last, base_len) => {
            Ok(())
        }
        (_, last) => Err(Error::IndexOutOfBounds {
            index: last.unwrap_or(isize::MAX),
            size: base_len,
        }),
    }
}

fn check_matrix(
    base_len: usize,
    offset: usize,
    rows: usize,
    cols: usize,
    rs: isize,
    cs: isize,
) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let origin = isize::try_from(offset).map_err(|_| Error::IndexOutOfBounds {
        index: isize::MAX,
        size: base_len,
    })?;
    let corners = [
        Some(origin),
        progression(offset, rows - 1, rs),
        progression(offset, cols - 1, cs),
        progression(offset, rows - 1, rs)
            .and_then(|r| isize::try_from(cols - 1).ok()?.checked_mul(cs)?.checked_add(r)),
    ];
    for corner in corners {
        match corner {
            Some(index) if in_bounds(index, base_len) => {}
            other => {
                return Err(Error::IndexOutOfBounds {
                    index: other.unwrap_or(isize::MAX),
                    size: base_len,
                })
            }
        }
    }
    Ok(())
}

/// Address span (in elements) covered by a progression, as a half-open range.
fn span<T>(ptr: *const T, len: usize, stride: isize) -> Range<usize> {
    let start = ptr as usize;
    if len == 0 {
        return start..start;
    }
    let size = core::mem::size_of::<T>() as isize;
    let end = start as isize + (len as isize - 1) * stride * size;
    let (lo, hi) = if end < start as isize {
        (end as usize, start)
    } else {
        (start, end as usize)
    };
    lo..hi + size as usize
}

fn disjoint(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.end <= b.start || b.end <= a.start
}

// =============================================================================
// Leased Payload Bases
// =============================================================================

/// Read-only base of a leased payload buffer.
#[derive(Debug)]
pub struct Base<'a, T> {
    ptr: *const T,
    len: usize,
    _marker: PhantomData<&'a [T]>,
}

impl<T> Clone for Base<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Base<'_, T> {}

impl<'a, T: Scalar> Base<'a, T> {
    /// # Safety
    /// `ptr` must be valid for reads of `len` elements for `'a`.
    pub(crate) unsafe fn new(ptr: *const T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    /// Number of elements in the underlying payload.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the base holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Builds a bounds-checked one-dimensional operand.
    ///
    /// # Arguments
    /// * `offset` - Index of the first element
    /// * `count` - Number of elements
    /// * `stride` - Distance between consecutive elements
    pub fn strided(&self, offset: usize, count: usize, stride: isize) -> Result<Strided<'a, T>> {
        check_strided(self.len, offset, count, stride)?;
        Ok(Strided {
            // SAFETY: bounds were checked above; offset < len when count > 0.
            ptr: if count == 0 {
                self.ptr
            } else {
                unsafe { self.ptr.add(offset) }
            },
            len: count,
            stride,
            _marker: PhantomData,
        })
    }

    /// Builds a bounds-checked two-dimensional operand.
    pub fn matrix(
        &self,
        offset: usize,
        rows: usize,
        cols: usize,
        rs: isize,
        cs: isize,
    ) -> Result<Strided2<'a, T>> {
        check_matrix(self.len, offset, rows, cols, rs, cs)?;
        Ok(Strided2 {
            // SAFETY: bounds were checked above; offset < len when non-empty.
            ptr: if rows == 0 || cols == 0 {
                self.ptr
            } else {
                unsafe { self.ptr.add(offset) }
            },
            rows,
            cols,
            rs,
            cs,
            _marker: PhantomData,
        })
    }
}

/// Writable base of a leased payload buffer.
#[derive(Debug)]
pub struct BaseMut<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T: Scalar> BaseMut<'a, T> {
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` elements for `'a`.
    pub(crate) unsafe fn new(ptr: *mut T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    /// Number of elements in the underlying payload.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the base holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read-only view of the same buffer.
    #[must_use]
    pub fn as_base(&self) -> Base<'a, T> {
        // SAFETY: the write lease covers reads too.
        unsafe { Base::new(self.ptr, self.len) }
    }

    /// Builds a bounds-checked writable one-dimensional operand.
    pub fn strided_mut(
        &self,
        offset: usize,
        count: usize,
        stride: isize,
    ) -> Result<StridedMut<'a, T>> {
        check_strided(self.len, offset, count, stride)?;
        Ok(StridedMut {
            // SAFETY: bounds were checked above; offset < len when non-empty.
            ptr: if count == 0 {
                self.ptr
            } else {
                unsafe { self.ptr.add(offset) }
            },
            len: count,
            stride,
            _marker: PhantomData,
        })
    }

    /// Builds a bounds-checked writable two-dimensional operand.
    pub fn matrix_mut(
        &self,
        offset: usize,
        rows: usize,
        cols: usize,
        rs: isize,
        cs: isize,
    ) -> Result<Strided2Mut<'a, T>> {
        check_matrix(self.len, offset, rows, cols, rs, cs)?;
        Ok(Strided2Mut {
            // SAFETY: bounds were checked above; offset < len when non-empty.
            ptr: if rows == 0 || cols == 0 {
                self.ptr
            } else {
                unsafe { self.ptr.add(offset) }
            },
            rows,
            cols,
            rs,
            cs,
            _marker: PhantomData,
        })
    }
}

// =============================================================================
// One-Dimensional Operands
// =============================================================================

/// Read-only strided operand.
#[derive(Debug)]
pub struct Strided<'a, T> {
    ptr: *const T,
    len: usize,
    stride: isize,
    _marker: PhantomData<&'a T>,
}

impl<T> Clone for Strided<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Strided<'_, T> {}

impl<'a, T: Scalar> Strided<'a, T> {
    /// Operand over a borrowed contiguous slice.
    #[must_use]
    pub fn from_slice(data: &'a [T]) -> Self {
        Self {
            ptr: data.as_ptr(),
            len: data.len(),
            stride: 1,
            _marker: PhantomData,
        }
    }

    /// Operand repeating one value `len` times (stride 0).
    #[must_use]
    pub fn broadcast(value: &'a T, len: usize) -> Self {
        Self {
            ptr: value,
            len,
            stride: 0,
            _marker: PhantomData,
        }
    }

    /// Number of logical elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the operand has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distance between consecutive elements.
    #[must_use]
    pub const fn stride(&self) -> isize {
        self.stride
    }

    /// Reads element `i`.
    ///
    /// # Panics
    /// Panics if `i >= len`.
    #[must_use]
    pub fn get(&self, i: usize) -> T {
        assert!(i < self.len, "strided index {i} out of range {}", self.len);
        // SAFETY: construction guarantees every i < len is in bounds.
        unsafe { self.read(i) }
    }

    #[inline]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        *self.ptr.offset(i as isize * self.stride)
    }

    pub(crate) fn span(&self) -> Range<usize> {
        span(self.ptr, self.len, self.stride)
    }

    pub(crate) const fn is_unit(&self) -> bool {
        self.stride == 1 || self.len <= 1
    }

    /// # Safety
    /// No writable operand may overlap this one while the slice lives.
    pub(crate) unsafe fn as_slice(&self) -> &'a [T] {
        debug_assert!(self.is_unit());
        core::slice::from_raw_parts(self.ptr, self.len)
    }

    /// The operand viewed as a `len x 1` column.
    pub(crate) fn as_column(&self) -> Strided2<'a, T> {
        Strided2 {
            ptr: self.ptr,
            rows: self.len,
            cols: 1,
            rs: self.stride,
            cs: 1,
            _marker: PhantomData,
        }
    }
}

/// Writable strided operand.
#[derive(Debug)]
pub struct StridedMut<'a, T> {
    ptr: *mut T,
    len: usize,
    stride: isize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: Scalar> StridedMut<'a, T> {
    /// Operand over a borrowed contiguous slice.
    #[must_use]
    pub fn from_slice(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            stride: 1,
            _marker: PhantomData,
        }
    }

    /// Number of logical elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the operand has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distance between consecutive elements.
    #[must_use]
    pub const fn stride(&self) -> isize {
        self.stride
    }

    /// Read-only alias of this operand.
    #[must_use]
    pub fn as_strided(&self) -> Strided<'_, T> {
        Strided {
            ptr: self.ptr,
            len: self.len,
            stride: self.stride,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        *self.ptr.offset(i as isize * self.stride)
    }

    #[inline]
    pub(crate) unsafe fn write(&mut self, i: usize, value: T) {
        *self.ptr.offset(i as isize * self.stride) = value;
    }

    pub(crate) fn span(&self) -> Range<usize> {
        span(self.ptr, self.len, self.stride)
    }

    pub(crate) const fn is_unit(&self) -> bool {
        self.stride == 1 || self.len <= 1
    }

    /// # Safety
    /// No other operand may overlap this one while the slice lives.
    pub(crate) unsafe fn as_mut_slice(&mut self) -> &mut [T] {
        debug_assert!(self.is_unit());
        core::slice::from_raw_parts_mut(self.ptr, self.len)
    }

    pub(crate) fn as_column_mut(&mut self) -> Strided2Mut<'_, T> {
        Strided2Mut {
            ptr: self.ptr,
            rows: self.len,
            cols: 1,
            rs: self.stride,
            cs: 1,
            _marker: PhantomData,
        }
    }
}

// =============================================================================
// Two-Dimensional Operands
// =============================================================================

/// Read-only two-dimensional operand.
#[derive(Debug)]
pub struct Strided2<'a, T> {
    ptr: *const T,
    rows: usize,
    cols: usize,
    rs: isize,
    cs: isize,
    _marker: PhantomData<&'a T>,
}

impl<T> Clone for Strided2<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Strided2<'_, T> {}

impl<'a, T: Scalar> Strided2<'a, T> {
    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The transposed operand; no data moves.
    #[must_use]
    pub const fn t(self) -> Self {
        Self {
            ptr: self.ptr,
            rows: self.cols,
            cols: self.rows,
            rs: self.cs,
            cs: self.rs,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) unsafe fn read(&self, i: usize, j: usize) -> T {
        *self.ptr.offset(i as isize * self.rs + j as isize * self.cs)
    }

    pub(crate) const fn parts(&self) -> (*const T, isize, isize) {
        (self.ptr, self.rs, self.cs)
    }

    pub(crate) fn span(&self) -> Range<usize> {
        corner_span(self.ptr, self.rows, self.cols, self.rs, self.cs)
    }
}

/// Writable two-dimensional operand.
#[derive(Debug)]
pub struct Strided2Mut<'a, T> {
    ptr: *mut T,
    rows: usize,
    cols: usize,
    rs: isize,
    cs: isize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: Scalar> Strided2Mut<'a, T> {
    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The transposed operand; no data moves.
    #[must_use]
    pub fn t(self) -> Self {
        Self {
            ptr: self.ptr,
            rows: self.cols,
            cols: self.rows,
            rs: self.cs,
            cs: self.rs,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) unsafe fn write(&mut self, i: usize, j: usize, value: T) {
        *self.ptr.offset(i as isize * self.rs + j as isize * self.cs) = value;
    }

    pub(crate) const fn parts(&self) -> (*mut T, isize, isize) {
        (self.ptr, self.rs, self.cs)
    }

    pub(crate) fn span(&self) -> Range<usize> {
        corner_span(self.ptr, self.rows, self.cols, self.rs, self.cs)
    }
}

fn corner_span<T>(ptr: *const T, rows: usize, cols: usize, rs: isize, cs: isize) -> Range<usize> {
    let rows_span = span(ptr, rows, rs);
    if rows == 0 || cols == 0 {
        return rows_span;
    }
    let last_col = (cols as isize - 1) * cs * core::mem::size_of::<T>() as isize;
    let shifted = (rows_span.start as isize + last_col) as usize
        ..(rows_span.end as isize + last_col) as usize;
    rows_span.start.min(shifted.start)..rows_span.end.max(shifted.end)
}

// =============================================================================
// Kernel Trait
// =============================================================================

/// Elementwise, reduction and dense linear-algebra primitives over strided
/// operands.
///
/// Writable operands may coincide exactly with an input (in-place use);
/// dense products (`gemm`, `gemv`, `ger`, `transpose`) require outputs that
/// do not overlap their inputs.
pub trait Kernel<T: Float>: Send + Sync {
    /// `y[i] = op(x[i])`.
    fn unary(&self, op: Unary, x: Strided<'_, T>, y: StridedMut<'_, T>);

    /// `y[i] = op(a[i], b[i])`.
    fn binary(&self, op: Binary, a: Strided<'_, T>, b: Strided<'_, T>, y: StridedMut<'_, T>);

    /// Inner product of `x` and `y`.
    fn dot(&self, x: Strided<'_, T>, y: Strided<'_, T>) -> T;

    /// Sum of absolute values.
    fn asum(&self, x: Strided<'_, T>) -> T;

    /// Euclidean norm.
    fn nrm2(&self, x: Strided<'_, T>) -> T;

    /// `x = alpha * x`.
    fn scal(&self, alpha: T, x: StridedMut<'_, T>);

    /// `y = alpha * x + y`.
    fn axpy(&self, alpha: T, x: Strided<'_, T>, y: StridedMut<'_, T>);

    /// `c = alpha * a b + beta * c`.
    fn gemm(
        &self,
        alpha: T,
        a: Strided2<'_, T>,
        b: Strided2<'_, T>,
        beta: T,
        c: Strided2Mut<'_, T>,
    ) -> Result<()>;

    /// `y = alpha * a x + beta * y`.
    fn gemv(
        &self,
        alpha: T,
        a: Strided2<'_, T>,
        x: Strided<'_, T>,
        beta: T,
        y: StridedMut<'_, T>,
    ) -> Result<()>;

    /// `a = alpha * x y^T + a`.
    fn ger(
        &self,
        alpha: T,
        x: Strided<'_, T>,
        y: Strided<'_, T>,
        a: Strided2Mut<'_, T>,
    ) -> Result<()>;

    /// `b = a^T` (out of place).
    fn transpose(&self, a: Strided2<'_, T>, b: Strided2Mut<'_, T>) -> Result<()>;

    /// Transposes a contiguous `rows x cols` block in place, leaving it
    /// `cols x rows`.
    fn transpose_in_place(&self, data: StridedMut<'_, T>, rows: usize, cols: usize)
        -> Result<()>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strided_bounds() {
        let data = [0.0_f32; 7];
        let base = unsafe { Base::new(data.as_ptr(), data.len()) };

        assert!(base.strided(1, 3, 2).is_ok());
        assert!(base.strided(6, 7, -1).is_ok());
        assert!(base.strided(1, 4, 2).is_err());
        assert!(base.strided(0, 2, -1).is_err());
        assert!(base.strided(7, 1, 1).is_err());
        assert!(base.strided(100, 0, 1).is_ok());
    }

    #[test]
    fn test_matrix_bounds() {
        let data = [0.0_f64; 12];
        let base = unsafe { Base::new(data.as_ptr(), data.len()) };

        assert!(base.matrix(0, 3, 4, 4, 1).is_ok());
        assert!(base.matrix(1, 3, 4, 4, 1).is_err());
        assert!(base.matrix(0, 4, 3, 1, 4).is_ok());
    }

    #[test]
    fn test_strided_read() {
        let data = [-10.0_f32, -1.0, -10.0, 1.0, -10.0, 2.0, -10.0];
        let x = Strided::from_slice(&data);
        let base = unsafe { Base::new(data.as_ptr(), data.len()) };
        let view = base.strided(1, 3, 2).unwrap();

        assert_eq!(x.get(3), 1.0);
        assert_eq!((0..3).map(|i| view.get(i)).collect::<Vec<_>>(), vec![-1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_span_and_disjoint() {
        let data = [0.0_f32; 8];
        let base = unsafe { Base::new(data.as_ptr(), data.len()) };
        let lo = base.strided(0, 4, 1).unwrap().span();
        let hi = base.strided(7, 4, -1).unwrap().span();
        let mid = base.strided(3, 2, 1).unwrap().span();

        assert!(disjoint(&lo, &hi));
        assert!(!disjoint(&lo, &mid));
        assert_eq!(hi.end - hi.start, 4 * core::mem::size_of::<f32>());
    }

    #[test]
    fn test_ops_apply() {
        assert_eq!(Unary::Square.apply(3.0_f64), 9.0);
        assert_eq!(Unary::Inv.apply(4.0_f64), 0.25);
        assert_eq!(Binary::Max.apply(-1.0_f32, 0.0), 0.0);
        assert_eq!(Binary::CopySign.apply(0.5_f32, -3.0), -0.5);
        assert_eq!(Binary::CopySign.apply(-0.5_f32, 2.0), 0.5);
    }
}
