//! Matrix - Two-Dimensional Row-Major View
//!
//! A `Matrix` exposes a contiguous `rows x cols` block of a shared
//! `Payload` starting at `offset`; the row stride is always `cols`. Rows
//! and columns can be extracted as `Vector` views over the same payload,
//! so writes through one are visible through the other.
//!
//! # Key Features
//! - Contiguous row-major blocks over shared payloads
//! - Zero-copy row and column extraction (negative indices allowed)
//! - Sub-block views and in-place reinterpretation
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use lamina_core::kernel::{Base, BaseMut, Strided2, Strided2Mut};
use lamina_core::{Allocator, Error, Payload, Result, Scalar};

use crate::ops::Extent;
use crate::vector::Vector;

// =============================================================================
// Matrix Struct
// =============================================================================

/// A row-major matrix view over a shared payload.
#[derive(Debug, Clone)]
pub struct Matrix<T: Scalar> {
    pub(crate) payload: Payload<T>,
    pub(crate) offset: usize,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
}

impl<T: Scalar> Default for Matrix<T> {
    fn default() -> Self {
        Self::null()
    }
}

fn block_fits(size: usize, offset: usize, rows: usize, cols: usize) -> bool {
    rows > 0
        && cols > 0
        && rows
            .checked_mul(cols)
            .and_then(|n| n.checked_add(offset))
            .is_some_and(|end| end <= size)
}

impl<T: Scalar> Matrix<T> {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// The NULL matrix.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            payload: Payload::null(),
            offset: 0,
            rows: 0,
            cols: 0,
        }
    }

    /// Allocates a zero-filled `rows x cols` matrix on a private payload.
    pub fn construct(rows: usize, cols: usize) -> Result<Self> {
        let size = Self::checked_size(rows, cols)?;
        Ok(Self {
            payload: Payload::construct(size)?,
            offset: 0,
            rows,
            cols,
        })
    }

    /// Like [`Matrix::construct`], with an explicit allocation policy.
    pub fn construct_in(rows: usize, cols: usize, allocator: Arc<dyn Allocator>) -> Result<Self> {
        let size = Self::checked_size(rows, cols)?;
        Ok(Self {
            payload: Payload::construct_in(size, allocator)?,
            offset: 0,
            rows,
            cols,
        })
    }

    /// Allocates a matrix holding a copy of row-major `data`.
    ///
    /// # Arguments
    /// * `data` - Row-major elements, exactly `rows * cols` of them
    /// * `rows` - Number of rows
    /// * `cols` - Number of columns
    pub fn from_slice(data: &[T], rows: usize, cols: usize) -> Result<Self> {
        let size = Self::checked_size(rows, cols)?;
        if data.len() != size {
            return Err(Error::shape_mismatch(&[rows, cols], &[data.len()]));
        }
        Ok(Self {
            payload: Payload::from_slice(data)?,
            offset: 0,
            rows,
            cols,
        })
    }

    fn checked_size(rows: usize, cols: usize) -> Result<usize> {
        if rows == 0 || cols == 0 {
            return Err(Error::ZeroLength);
        }
        rows.checked_mul(cols)
            .ok_or_else(|| Error::invalid_view(format!("{rows} x {cols} overflows")))
    }

    /// Creates a matrix over an existing payload without allocating.
    ///
    /// Returns the NULL matrix if the payload is invalid or the block does
    /// not fit inside it.
    pub fn construct_prealloc(
        payload: &Payload<T>,
        offset: usize,
        rows: usize,
        cols: usize,
    ) -> Self {
        if !payload.is_valid() || !block_fits(payload.len(), offset, rows, cols) {
            tracing::debug!(
                offset,
                rows,
                cols,
                payload_len = payload.len(),
                "matrix extent rejected"
            );
            return Self::null();
        }
        Self {
            payload: payload.share(),
            offset,
            rows,
            cols,
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Views a contiguous `rows x cols` block of this matrix's elements.
    ///
    /// `offset` is relative to this matrix's first element in row-major
    /// order; a negative offset counts back from the end. Returns the NULL
    /// matrix if the block runs past this matrix.
    pub fn view(&self, offset: isize, rows: usize, cols: usize) -> Self {
        let size = self.size();
        let start = if offset < 0 {
            offset + size as isize
        } else {
            offset
        };
        if !self.is_valid() || start < 0 || !block_fits(size, start as usize, rows, cols) {
            tracing::debug!(offset, rows, cols, size, "matrix view rejected");
            return Self::null();
        }
        Self {
            payload: self.payload.share(),
            offset: self.offset + start as usize,
            rows,
            cols,
        }
    }

    /// Another handle to exactly this matrix; the payload gains an owner.
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// All elements as one contiguous vector view.
    pub fn flat(&self) -> Vector<T> {
        if !self.is_valid() {
            return Vector::null();
        }
        Vector::construct_prealloc(&self.payload, self.offset, self.size(), 1)
    }

    /// Row `i` as a vector view (step 1); negative `i` counts from the end.
    pub fn row_at(&self, i: isize) -> Vector<T> {
        let Some(i) = normalize(i, self.rows) else {
            tracing::debug!(row = i, rows = self.rows, "row index rejected");
            return Vector::null();
        };
        let cols = self.cols as isize;
        let start = i * cols;
        self.flat().view(start, start + cols, 1)
    }

    /// Column `j` as a vector view (step `cols`); negative `j` counts from
    /// the end.
    pub fn column_at(&self, j: isize) -> Vector<T> {
        let Some(j) = normalize(j, self.cols) else {
            tracing::debug!(column = j, cols = self.cols, "column index rejected");
            return Vector::null();
        };
        self.flat().view(j, j + self.size() as isize, self.cols as isize)
    }

    /// Reinterprets the same payload with a new block; nothing is
    /// reallocated.
    pub fn reform(&mut self, offset: usize, rows: usize, cols: usize) -> Result<()> {
        if self.payload.is_null() {
            return Err(Error::InvalidPayload);
        }
        if !block_fits(self.payload.len(), offset, rows, cols) {
            return Err(Error::invalid_view(format!(
                "block (offset {offset}, {rows} x {cols}) exceeds payload of {}",
                self.payload.len()
            )));
        }
        self.offset = offset;
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Releases the payload and resets this view to the NULL matrix.
    pub fn destruct(&mut self) {
        if !self.payload.is_null() {
            self.payload.release();
        }
        *self = Self::null();
    }

    // =========================================================================
    // Properties
    // =========================================================================

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

    /// `[rows, cols]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Total number of elements.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// Payload index of the first element.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The shared payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload<T> {
        &self.payload
    }

    /// Returns true for the NULL matrix.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.payload.is_null() && self.offset == 0 && self.rows == 0 && self.cols == 0
    }

    /// Returns true if the block lies inside a live payload.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.payload.is_valid()
            && block_fits(self.payload.len(), self.offset, self.rows, self.cols)
    }

    /// Returns true if both matrices share a payload and their blocks
    /// intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.payload.ptr_eq(&other.payload) && self.extent().intersects(&other.extent())
    }

    pub(crate) fn extent(&self) -> Extent {
        Extent::new(self.offset, self.size(), 1)
    }

    // =========================================================================
    // Element Access
    // =========================================================================

    /// Payload index of element `(i, j)`; negative indices count from the
    /// end.
    pub fn at(&self, i: isize, j: isize) -> Result<usize> {
        let row = normalize(i, self.rows).ok_or(Error::IndexOutOfBounds {
            index: i,
            size: self.rows,
        })?;
        let col = normalize(j, self.cols).ok_or(Error::IndexOutOfBounds {
            index: j,
            size: self.cols,
        })?;
        Ok(self.offset + row as usize * self.cols + col as usize)
    }

    /// Reads element `(i, j)`.
    pub fn get(&self, i: isize, j: isize) -> Result<T> {
        let index = self.at(i, j)?;
        let data = self.payload.read()?;
        data.get(index).copied().ok_or(Error::IndexOutOfBounds {
            index: index as isize,
            size: data.len(),
        })
    }

    /// Writes element `(i, j)`.
    pub fn set(&self, i: isize, j: isize, value: T) -> Result<()> {
        let index = self.at(i, j)?;
        let mut data = self.payload.write()?;
        let size = data.len();
        let slot = data.get_mut(index).ok_or(Error::IndexOutOfBounds {
            index: index as isize,
            size,
        })?;
        *slot = value;
        Ok(())
    }

    /// Copies the elements into a row-major vector.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        if !self.is_valid() {
            return Err(Error::InvalidPayload);
        }
        let data = self.payload.read()?;
        data.get(self.offset..self.offset + self.size())
            .map(<[T]>::to_vec)
            .ok_or_else(|| Error::invalid_view("matrix block exceeds its payload"))
    }

    /// Overwrites rows starting at `row` with the leading rows of `src`.
    ///
    /// Copies as many rows as fit below `row` and returns that count.
    /// Negative `row` counts from the end.
    pub fn insert_rows(&self, src: &Self, row: isize) -> Result<usize> {
        if self.cols != src.cols {
            return Err(Error::shape_mismatch(&[src.rows, self.cols], &src.shape()));
        }
        let row = normalize(row, self.rows).ok_or(Error::IndexOutOfBounds {
            index: row,
            size: self.rows,
        })? as usize;
        let count = src.rows.min(self.rows - row);
        let rows = src.view(0, count, src.cols).to_vec()?;
        let start = self.offset + row * self.cols;
        let mut data = self.payload.write()?;
        let size = data.len();
        data.get_mut(start..start + rows.len())
            .ok_or(Error::IndexOutOfBounds {
                index: (start + rows.len()) as isize,
                size,
            })?
            .copy_from_slice(&rows);
        Ok(count)
    }

    pub(crate) fn operand<'a>(&self, base: &Base<'a, T>) -> Result<Strided2<'a, T>> {
        base.matrix(self.offset, self.rows, self.cols, self.cols as isize, 1)
    }

    pub(crate) fn operand_mut<'a>(&self, base: &BaseMut<'a, T>) -> Result<Strided2Mut<'a, T>> {
        base.matrix_mut(self.offset, self.rows, self.cols, self.cols as isize, 1)
    }
}

/// Resolves a possibly negative index against `len`.
fn normalize(i: isize, len: usize) -> Option<isize> {
    let len = len as isize;
    let i = if i < 0 { i + len } else { i };
    (0..len).contains(&i).then_some(i)
}

// =============================================================================
// Tests
// =============================================================================
