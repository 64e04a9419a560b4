//! Vector - One-Dimensional Strided View
//!
//! A `Vector` exposes `len` elements of a shared `Payload`, starting at
//! `offset` and advancing by `step` (which may be negative). Views are cheap
//! to derive: slicing, row and column extraction all produce new vectors
//! over the same payload without copying.
//!
//! Construction from caller input that cannot be made consistent yields the
//! NULL vector rather than an error; check `is_null`/`is_valid` before use.
//!
//! # Key Features
//! - Zero-copy views with arbitrary (including negative) steps
//! - Python-style slicing against the view's own extent
//! - Shared ownership of the backing payload
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use lamina_core::kernel::{Base, BaseMut, Strided, StridedMut};
use lamina_core::{Allocator, Error, Payload, Result, Scalar};

use crate::ops::Extent;
use crate::slice::{Bound, Slice};

// =============================================================================
// Vector Struct
// =============================================================================

/// A one-dimensional strided view over a shared payload.
///
/// Cloning a vector shares its payload; the payload is released when the
/// last view over it goes away.
#[derive(Debug, Clone)]
pub struct Vector<T: Scalar> {
    pub(crate) payload: Payload<T>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) step: isize,
}

impl<T: Scalar> Default for Vector<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Returns true if `len` elements from `offset` by `step` fit in `size`.
fn fits(size: usize, offset: usize, len: usize, step: isize) -> bool {
    if len == 0 || offset >= size {
        return false;
    }
    let Ok(first) = isize::try_from(offset) else {
        return false;
    };
    let last = isize::try_from(len - 1)
        .ok()
        .and_then(|n| n.checked_mul(step))
        .and_then(|n| n.checked_add(first));
    matches!(last, Some(last) if last >= 0 && (last as usize) < size)
}

impl<T: Scalar> Vector<T> {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// The NULL vector: no payload, no elements.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            payload: Payload::null(),
            offset: 0,
            len: 0,
            step: 0,
        }
    }

    /// Allocates a zero-filled vector of `len` elements on a private payload.
    ///
    /// # Arguments
    /// * `len` - Number of elements, must be positive
    pub fn construct(len: usize) -> Result<Self> {
        Ok(Self::whole(Payload::construct(len)?))
    }

    /// Like [`Vector::construct`], with an explicit allocation policy.
    pub fn construct_in(len: usize, allocator: Arc<dyn Allocator>) -> Result<Self> {
        Ok(Self::whole(Payload::construct_in(len, allocator)?))
    }

    /// Allocates a vector holding a copy of `data`.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        Ok(Self::whole(Payload::from_slice(data)?))
    }

    fn whole(payload: Payload<T>) -> Self {
        let len = payload.len();
        Self {
            payload,
            offset: 0,
            len,
            step: 1,
        }
    }

    /// Creates a view over an existing payload without allocating.
    ///
    /// The payload gains an owner. Returns the NULL vector if the payload is
    /// invalid or the extent does not fit inside it.
    ///
    /// # Arguments
    /// * `payload` - Payload to share
    /// * `offset` - Payload index of the first element
    /// * `len` - Number of elements, must be positive
    /// * `step` - Distance between consecutive elements, must be nonzero
    pub fn construct_prealloc(
        payload: &Payload<T>,
        offset: usize,
        len: usize,
        step: isize,
    ) -> Self {
        if step == 0 || !fits(payload.len(), offset, len, step) {
            tracing::debug!(
                offset,
                len,
                step,
                payload_len = payload.len(),
                "vector extent rejected"
            );
            return Self::null();
        }
        Self {
            payload: payload.share(),
            offset,
            len,
            step,
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Derives a sub-view `self[start:stop:step]`.
    ///
    /// Negative `start`/`stop` count from the end of this view, the range is
    /// clamped to the view, and the result shares the payload. Returns the
    /// NULL vector when the range selects nothing or points the wrong way.
    ///
    /// # Arguments
    /// * `start` - First position within this view
    /// * `stop` - Exclusive stop position within this view
    /// * `step` - Step relative to this view's own step
    pub fn view(&self, start: isize, stop: isize, step: isize) -> Self {
        self.derive(Slice::resolve(start, Bound::At(stop), step, self.len))
    }

    /// Another handle to exactly this view; the payload gains an owner.
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Derives a sub-view selected by a slice expression.
    pub fn view_slice(&self, slice: &Slice) -> Self {
        self.derive(slice.regulate(self.len))
    }

    fn derive(&self, slice: Slice) -> Self {
        let Some(len) = slice.len().filter(|_| self.is_valid() && !slice.is_null()) else {
            tracing::debug!(?slice, len = self.len, "vector view rejected");
            return Self::null();
        };
        // A single element keeps the outer step; any other overflowing step
        // cannot fit the payload.
        let step = slice
            .step()
            .checked_mul(self.step)
            .or((len == 1).then_some(self.step));
        let Some(step) = step else {
            tracing::debug!(?slice, step = self.step, "vector view step overflows");
            return Self::null();
        };
        let offset = self.offset as isize + slice.start() * self.step;
        Self {
            payload: self.payload.share(),
            offset: offset as usize,
            len,
            step,
        }
    }

    /// Reinterprets the same payload with a new extent; nothing is
    /// reallocated.
    pub fn reform(&mut self, offset: usize, len: usize, step: isize) -> Result<()> {
        if self.payload.is_null() {
            return Err(Error::InvalidPayload);
        }
        if step == 0 || !fits(self.payload.len(), offset, len, step) {
            return Err(Error::invalid_view(format!(
                "extent (offset {offset}, len {len}, step {step}) exceeds payload of {}",
                self.payload.len()
            )));
        }
        self.offset = offset;
        self.len = len;
        self.step = step;
        Ok(())
    }

    /// Releases the payload and resets this view to the NULL vector.
    pub fn destruct(&mut self) {
        if !self.payload.is_null() {
            self.payload.release();
        }
        *self = Self::null();
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload index of the first element.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Distance between consecutive elements in the payload.
    #[must_use]
    pub const fn step(&self) -> isize {
        self.step
    }

    /// The shared payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload<T> {
        &self.payload
    }

    /// Returns true for the NULL vector.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.payload.is_null() && self.len == 0 && self.offset == 0 && self.step == 0
    }

    /// Returns true if the view addresses elements of a live payload.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.step != 0
            && self.payload.is_valid()
            && fits(self.payload.len(), self.offset, self.len, self.step)
    }

    /// Returns true if both views share a payload with the same extent.
    #[must_use]
    pub fn same_view(&self, other: &Self) -> bool {
        self.payload.ptr_eq(&other.payload) && self.extent() == other.extent()
    }

    /// Returns true if the views share at least one payload element.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.payload.ptr_eq(&other.payload) && self.extent().intersects(&other.extent())
    }

    pub(crate) fn extent(&self) -> Extent {
        Extent::new(self.offset, self.len, self.step)
    }

    // =========================================================================
    // Element Access
    // =========================================================================

    /// Payload index of element `i`; negative `i` counts from the end.
    pub fn at(&self, i: isize) -> Result<usize> {
        let len = self.len as isize;
        let j = if i < 0 { i + len } else { i };
        if j < 0 || j >= len {
            return Err(Error::IndexOutOfBounds {
                index: i,
                size: self.len,
            });
        }
        Ok((self.offset as isize + j * self.step) as usize)
    }

    /// Reads element `i`.
    pub fn get(&self, i: isize) -> Result<T> {
        let index = self.at(i)?;
        let data = self.payload.read()?;
        data.get(index).copied().ok_or(Error::IndexOutOfBounds {
            index: index as isize,
            size: data.len(),
        })
    }

    /// Writes element `i`. The write is visible through every view sharing
    /// the payload.
    pub fn set(&self, i: isize, value: T) -> Result<()> {
        let index = self.at(i)?;
        let mut data = self.payload.write()?;
        let size = data.len();
        let slot = data.get_mut(index).ok_or(Error::IndexOutOfBounds {
            index: index as isize,
            size,
        })?;
        *slot = value;
        Ok(())
    }

    /// Copies the logical elements into a vector.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Payload::lease(&[&self.payload], |bases| -> Result<Vec<T>> {
            let x = self.operand(&bases[0])?;
            Ok((0..x.len()).map(|i| x.get(i)).collect())
        })?
    }

    pub(crate) fn operand<'a>(&self, base: &Base<'a, T>) -> Result<Strided<'a, T>> {
        base.strided(self.offset, self.len, self.step)
    }

    pub(crate) fn operand_mut<'a>(&self, base: &BaseMut<'a, T>) -> Result<StridedMut<'a, T>> {
        base.strided_mut(self.offset, self.len, self.step)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Payload<f64> {
        Payload::from_slice(&[-10.0, -1.0, -10.0, 1.0, -10.0, 2.0, -10.0]).unwrap()
    }

    #[test]
    fn test_construct() {
        let v = Vector::<f32>::construct(4).unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v.step(), 1);
        assert!(v.is_valid());
        assert_eq!(v.to_vec().unwrap(), vec![0.0; 4]);
        assert!(Vector::<f32>::construct(0).is_err());
    }

    #[test]
    fn test_construct_prealloc() {
        let payload = scenario();
        let v = Vector::construct_prealloc(&payload, 1, 3, 2);
        assert_eq!(v.to_vec().unwrap(), vec![-1.0, 1.0, 2.0]);
        assert_eq!(payload.ref_count(), 2);

        let back = Vector::construct_prealloc(&payload, 5, 3, -2);
        assert_eq!(back.to_vec().unwrap(), vec![2.0, 1.0, -1.0]);
    }

    #[test]
    fn test_construct_prealloc_rejects() {
        let payload = scenario();
        assert!(Vector::construct_prealloc(&payload, 1, 4, 2).is_null());
        assert!(Vector::construct_prealloc(&payload, 7, 1, 1).is_null());
        assert!(Vector::construct_prealloc(&payload, 0, 2, -1).is_null());
        assert!(Vector::construct_prealloc(&payload, 0, 2, 0).is_null());
        assert!(Vector::construct_prealloc(&payload, 0, 0, 1).is_null());
        assert!(Vector::construct_prealloc(&Payload::<f64>::null(), 0, 1, 1).is_null());
        assert_eq!(payload.ref_count(), 1);
    }

    #[test]
    fn test_view() {
        let v = Vector::from_slice(&[0.0_f32, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(v.view(1, 5, 2).to_vec().unwrap(), vec![1.0, 3.0]);
        assert_eq!(v.view(-1, -7, -1).to_vec().unwrap(), vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
        assert_eq!(v.view(2, -1, 1).to_vec().unwrap(), vec![2.0, 3.0, 4.0]);
        assert_eq!(v.view(0, 100, 4).to_vec().unwrap(), vec![0.0, 4.0]);
        assert!(v.view(3, 3, 1).is_null());
        assert!(v.view(4, 1, 1).is_null());
        assert!(v.view(0, 3, 0).is_null());
    }

    #[test]
    fn test_view_of_view() {
        let v = Vector::from_slice(&[0.0_f64, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap();
        let odd = v.view(1, 8, 2);
        let rev = odd.view(-1, -5, -1);
        assert_eq!(rev.to_vec().unwrap(), vec![7.0, 5.0, 3.0, 1.0]);
        assert_eq!(rev.step(), -2);
        assert_eq!(rev.offset(), 7);

        let slice = Slice::range(1, 3, 1);
        assert_eq!(rev.view_slice(&slice).to_vec().unwrap(), vec![5.0, 3.0]);
        assert_eq!(v.payload().ref_count(), 3);

        let again = rev.share();
        assert!(again.same_view(&rev));
        assert_eq!(v.payload().ref_count(), 4);
    }

    #[test]
    fn test_view_extreme_step() {
        let v = Vector::from_slice(&[0.0_f64, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let odd = v.view(1, 5, 2);

        let single = odd.view_slice(&Slice::from(1, isize::MAX));
        assert_eq!(single.to_vec().unwrap(), vec![3.0]);
        assert_eq!(single.step(), 2);

        let every = v.view_slice(&Slice::range(0, isize::MAX, 2));
        assert_eq!(every.to_vec().unwrap(), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_view_shares_writes() {
        let v = Vector::from_slice(&[1.0_f32, 2.0, 3.0]).unwrap();
        let tail = v.view(1, 3, 1);
        tail.set(-1, 9.0).unwrap();
        assert_eq!(v.get(2).unwrap(), 9.0);
    }

    #[test]
    fn test_reform_and_destruct() {
        let payload = scenario();
        let mut v = Vector::construct_prealloc(&payload, 0, 7, 1);
        v.reform(1, 3, 2).unwrap();
        assert_eq!(v.to_vec().unwrap(), vec![-1.0, 1.0, 2.0]);
        assert!(v.reform(1, 4, 2).is_err());

        v.destruct();
        assert!(v.is_null());
        assert!(!v.is_valid());
        assert_eq!(payload.ref_count(), 1);

        v.destruct();
        assert!(v.is_null());
    }

    #[test]
    fn test_element_access() {
        let v = Vector::from_slice(&[1.0_f64, 2.0, 3.0]).unwrap();
        assert_eq!(v.at(-1).unwrap(), 2);
        assert_eq!(v.get(-3).unwrap(), 1.0);
        assert!(v.get(3).is_err());
        assert!(v.set(-4, 0.0).is_err());
        assert!(Vector::<f64>::null().get(0).is_err());
    }

    #[test]
    fn test_overlap_detection() {
        let v = Vector::from_slice(&[0.0_f32; 10]).unwrap();
        let even = v.view(0, 10, 2);
        let odd = v.view(1, 10, 2);
        let thirds = v.view(0, 10, 3);

        assert!(!even.overlaps(&odd));
        assert!(even.overlaps(&thirds));
        assert!(even.same_view(&v.view(0, 10, 2)));
        assert!(!even.same_view(&odd));
    }
}
