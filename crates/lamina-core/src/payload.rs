//! Payload - Reference-Counted Element Buffers
//!
//! Provides the shared backing buffer that every Lamina view is built on.
//! A payload is either allocated by Lamina (aligned, zero-initialized,
//! resizable, freed with its last owner) or wraps caller-supplied memory
//! (never resized, never freed here).
//!
//! # Key Features
//! - Shared ownership through `share`/`release` (an `Arc` underneath)
//! - Shrinking only for the sole owner
//! - Free exactly once, and never for external memory
//! - Leases handing bounds-checked bases to the kernels
//!
//! # Example
//! ```rust
//! use lamina_core::Payload;
//!
//! let payload = Payload::<f32>::construct(100).unwrap();
//! let shared = payload.share();
//! assert_eq!(payload.ref_count(), 2);
//! assert!(shared.ptr_eq(&payload));
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::alloc::Layout;
use core::ops::{BitOr, Deref, DerefMut};
use core::ptr::NonNull;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::allocator::{layout_for, Allocator, DefaultAllocator};
use crate::dtype::Scalar;
use crate::error::{Error, Result};
use crate::kernel::{Base, BaseMut};

// =============================================================================
// Flags
// =============================================================================

/// Lifecycle flags of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PayloadFlags(u8);

impl PayloadFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);
    /// Buffer was heap-allocated by Lamina.
    pub const NEWLY_ALLOCATED: Self = Self(1);
    /// Buffer was supplied by the caller and is never freed here.
    pub const PREALLOCATED: Self = Self(1 << 1);
    /// Buffer may be grown or shrunk.
    pub const RESIZABLE: Self = Self(1 << 2);
    /// Buffer may be shrunk right now (resizable and solely owned).
    pub const SHRINKABLE: Self = Self(1 << 3);

    /// Returns true if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for PayloadFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// =============================================================================
// Inner Buffer
// =============================================================================

#[derive(Debug)]
enum Origin {
    Owned {
        allocator: Arc<dyn Allocator>,
        layout: Layout,
    },
    External,
}

#[derive(Debug)]
struct PayloadInner<T: Scalar> {
    ptr: NonNull<T>,
    len: usize,
    origin: Origin,
}

// SAFETY: the inner buffer is uniquely owned (or exclusively lent to us by
// the caller of `wrap_external`) and all access goes through the RwLock.
unsafe impl<T: Scalar> Send for PayloadInner<T> {}
unsafe impl<T: Scalar> Sync for PayloadInner<T> {}

impl<T: Scalar> PayloadInner<T> {
    fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid for len initialized elements.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: ptr is valid for len initialized elements; &mut self is unique.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn reallocate(&mut self, new_len: usize) -> Result<()> {
        let Origin::Owned { allocator, layout } = &mut self.origin else {
            return Err(Error::NotResizable);
        };
        let new_layout = layout_for::<T>(new_len, allocator.alignment())?;
        // SAFETY: ptr and layout come from this allocator.
        let fresh = unsafe { allocator.reallocate(self.ptr.cast(), *layout, new_layout)? };
        self.ptr = fresh.cast();
        *layout = new_layout;
        self.len = new_len;
        Ok(())
    }
}

impl<T: Scalar> Drop for PayloadInner<T> {
    fn drop(&mut self) {
        match &self.origin {
            Origin::Owned { allocator, layout } => {
                tracing::trace!(len = self.len, dtype = T::DTYPE.name(), "freeing payload buffer");
                // SAFETY: last owner; ptr and layout come from this allocator.
                unsafe { allocator.deallocate(self.ptr.cast(), *layout) };
            }
            Origin::External => {
                tracing::trace!(len = self.len, "releasing external payload without freeing");
            }
        }
    }
}

// =============================================================================
// Payload Struct
// =============================================================================

/// Reference-counted buffer of scalar elements.
///
/// Every handle is one owner. `share` adds an owner, `release` (or dropping
/// the handle) removes one; the buffer goes away with the last owner. A
/// released handle is the NULL payload.
#[derive(Debug)]
pub struct Payload<T: Scalar> {
    inner: Option<Arc<RwLock<PayloadInner<T>>>>,
}

impl<T: Scalar> Payload<T> {
    /// Allocates a zero-initialized payload with the default allocator.
    ///
    /// # Arguments
    /// * `len` - Number of elements, must be positive
    pub fn construct(len: usize) -> Result<Self> {
        Self::construct_in(len, DefaultAllocator::shared())
    }

    /// Allocates a zero-initialized payload with an explicit allocator.
    ///
    /// # Arguments
    /// * `len` - Number of elements, must be positive
    /// * `allocator` - Allocation policy; also frees the buffer later
    pub fn construct_in(len: usize, allocator: Arc<dyn Allocator>) -> Result<Self> {
        if len == 0 {
            return Err(Error::ZeroLength);
        }
        let layout = layout_for::<T>(len, allocator.alignment())?;
        let ptr = allocator.allocate_zeroed(layout)?.cast::<T>();
        tracing::trace!(len, dtype = T::DTYPE.name(), align = layout.align(), "payload allocated");
        Ok(Self::from_inner(PayloadInner {
            ptr,
            len,
            origin: Origin::Owned { allocator, layout },
        }))
    }

    /// Allocates a payload holding a copy of `data`.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        let payload = Self::construct(data.len())?;
        payload.write()?.copy_from_slice(data);
        Ok(payload)
    }

    /// Wraps caller-owned memory without taking ownership of it.
    ///
    /// The payload never resizes or frees the buffer.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` initialized
    /// elements for as long as any handle to this payload exists, and must
    /// not be accessed through other paths in the meantime.
    pub unsafe fn wrap_external(ptr: NonNull<T>, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::ZeroLength);
        }
        tracing::trace!(len, dtype = T::DTYPE.name(), "wrapping external buffer");
        Ok(Self::from_inner(PayloadInner {
            ptr,
            len,
            origin: Origin::External,
        }))
    }

    /// Wraps a leaked or static buffer without taking ownership of it.
    pub fn from_static(data: &'static mut [T]) -> Result<Self> {
        let len = data.len();
        // SAFETY: the exclusive 'static borrow outlives every handle.
        unsafe { Self::wrap_external(NonNull::from(data).cast(), len) }
    }

    /// The NULL payload: no buffer, no owners.
    #[must_use]
    pub const fn null() -> Self {
        Self { inner: None }
    }

    fn from_inner(inner: PayloadInner<T>) -> Self {
        Self {
            inner: Some(Arc::new(RwLock::new(inner))),
        }
    }

    fn handle(&self) -> Result<&Arc<RwLock<PayloadInner<T>>>> {
        self.inner.as_ref().ok_or(Error::InvalidPayload)
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Adds an owner and returns its handle.
    ///
    /// Once more than one owner exists the payload is no longer shrinkable.
    /// Sharing the NULL payload yields the NULL payload.
    #[must_use]
    pub fn share(&self) -> Self {
        let inner = self.inner.clone();
        if let Some(arc) = &inner {
            tracing::trace!(owners = Arc::strong_count(arc), "payload shared");
        }
        Self { inner }
    }

    /// Gives up this handle's ownership and turns it into the NULL payload.
    ///
    /// The buffer is freed when the last owner releases it (unless it is
    /// external memory). Releasing a NULL handle only logs a warning.
    pub fn release(&mut self) {
        match self.inner.take() {
            Some(arc) => {
                let remaining = Arc::strong_count(&arc) - 1;
                tracing::trace!(remaining, "payload released");
                drop(arc);
            }
            None => tracing::warn!("release called on a null or already released payload"),
        }
    }

    /// Changes the number of elements.
    ///
    /// Growing zero-fills the new tail. Shrinking requires sole ownership.
    /// External payloads cannot be resized.
    ///
    /// # Arguments
    /// * `new_len` - New element count, must be positive
    pub fn resize(&self, new_len: usize) -> Result<()> {
        let handle = self.handle()?;
        if new_len == 0 {
            return Err(Error::ZeroLength);
        }
        let owners = Arc::strong_count(handle);
        let mut inner = handle.write();
        if matches!(inner.origin, Origin::External) {
            return Err(Error::NotResizable);
        }
        let len = inner.len;
        if new_len == len {
            return Ok(());
        }
        if new_len < len && owners > 1 {
            return Err(Error::ShrinkWhileShared {
                len,
                requested: new_len,
                owners,
            });
        }
        inner.reallocate(new_len)?;
        tracing::debug!(from = len, to = new_len, "payload resized");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of elements (0 for the NULL payload).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |h| h.read_recursive().len)
    }

    /// Returns true for the NULL payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live owners (0 for the NULL payload).
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    /// Returns true if this is the only owner.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.ref_count() == 1
    }

    /// Current lifecycle flags.
    #[must_use]
    pub fn flags(&self) -> PayloadFlags {
        let Some(handle) = &self.inner else {
            return PayloadFlags::EMPTY;
        };
        match handle.read_recursive().origin {
            Origin::External => PayloadFlags::PREALLOCATED,
            Origin::Owned { .. } if Arc::strong_count(handle) == 1 => {
                PayloadFlags::NEWLY_ALLOCATED | PayloadFlags::RESIZABLE | PayloadFlags::SHRINKABLE
            }
            Origin::Owned { .. } => PayloadFlags::NEWLY_ALLOCATED | PayloadFlags::RESIZABLE,
        }
    }

    /// Returns true if the payload has a buffer, elements and owners.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.len() > 0
    }

    /// Returns true for the NULL payload.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns true if both handles own the same buffer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Locks the buffer for reading.
    pub fn read(&self) -> Result<PayloadReadGuard<'_, T>> {
        Ok(PayloadReadGuard {
            guard: self.handle()?.read_recursive(),
        })
    }

    /// Locks the buffer for writing.
    pub fn write(&self) -> Result<PayloadWriteGuard<'_, T>> {
        Ok(PayloadWriteGuard {
            guard: self.handle()?.write(),
        })
    }

    /// Copies the whole buffer into a vector.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.read()?.to_vec())
    }

    /// Locks every payload in `sources` for reading and hands their bases
    /// to `f`.
    pub fn lease<R>(sources: &[&Self], f: impl FnOnce(&[Base<'_, T>]) -> R) -> Result<R> {
        let mut guards = Vec::with_capacity(sources.len());
        for source in sources {
            guards.push(source.handle()?.read_recursive());
        }
        let bases: Vec<Base<'_, T>> = guards
            .iter()
            // SAFETY: each guard keeps its buffer alive and unmodified.
            .map(|g| unsafe { Base::new(g.ptr.as_ptr(), g.len) })
            .collect();
        Ok(f(&bases))
    }

    /// Locks this payload for writing and every payload in `sources` for
    /// reading, then hands the bases to `f`.
    ///
    /// Each distinct buffer is locked once, in ascending address order, so
    /// concurrent calls with crossed targets and sources (`a += b` against
    /// `b += a`) cannot deadlock. A source that is this payload reuses the
    /// write lock, so in-place operations are allowed.
    pub fn lease_mut<R>(
        &self,
        sources: &[&Self],
        f: impl FnOnce(BaseMut<'_, T>, &[Base<'_, T>]) -> R,
    ) -> Result<R> {
        let handle = self.handle()?;
        let mut order = Vec::with_capacity(sources.len() + 1);
        order.push(handle);
        for source in sources {
            order.push(source.handle()?);
        }
        order.sort_by_key(|h| Arc::as_ptr(h));
        order.dedup_by(|a, b| Arc::ptr_eq(*a, *b));

        let mut target = None;
        let mut guards = Vec::with_capacity(order.len());
        for h in order {
            if Arc::ptr_eq(h, handle) {
                target = Some(h.write());
            } else {
                guards.push((h, h.read_recursive()));
            }
        }
        let Some(target) = target else {
            return Err(Error::InvalidPayload);
        };
        let (ptr, len) = (target.ptr.as_ptr(), target.len);

        let mut bases = Vec::with_capacity(sources.len());
        for source in sources {
            let source_handle = source.handle()?;
            if Arc::ptr_eq(source_handle, handle) {
                // SAFETY: covered by the write lock held above.
                bases.push(unsafe { Base::new(ptr.cast_const(), len) });
                continue;
            }
            let Some((_, guard)) = guards.iter().find(|(h, _)| Arc::ptr_eq(*h, source_handle))
            else {
                return Err(Error::InvalidPayload);
            };
            // SAFETY: the guard is held until `f` returns.
            bases.push(unsafe { Base::new(guard.ptr.as_ptr(), guard.len) });
        }
        // SAFETY: the write lock is held until `f` returns.
        let base = unsafe { BaseMut::new(ptr, len) };
        let out = f(base, &bases);
        drop(guards);
        drop(target);
        Ok(out)
    }
}

impl<T: Scalar> Clone for Payload<T> {
    fn clone(&self) -> Self {
        self.share()
    }
}

impl<T: Scalar> Default for Payload<T> {
    fn default() -> Self {
        Self::null()
    }
}

// =============================================================================
// Guard Types for Safe Access
// =============================================================================

/// Read guard for payload data.
pub struct PayloadReadGuard<'a, T: Scalar> {
    guard: RwLockReadGuard<'a, PayloadInner<T>>,
}

impl<T: Scalar> Deref for PayloadReadGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.guard.as_slice()
    }
}

/// Write guard for payload data.
pub struct PayloadWriteGuard<'a, T: Scalar> {
    guard: RwLockWriteGuard<'a, PayloadInner<T>>,
}

impl<T: Scalar> Deref for PayloadWriteGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.guard.as_slice()
    }
}

impl<T: Scalar> DerefMut for PayloadWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard.as_mut_slice()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::TrackingAllocator;

    #[test]
    fn test_construct_zeroed() {
        let payload = Payload::<f32>::construct(10).unwrap();
        assert_eq!(payload.len(), 10);
        assert_eq!(payload.ref_count(), 1);
        assert!(payload.is_valid());
        assert!(payload.read().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_construct_zero_length_fails() {
        assert_eq!(Payload::<f64>::construct(0).unwrap_err(), Error::ZeroLength);
    }

    #[test]
    fn test_share_clears_shrinkable() {
        let payload = Payload::<f32>::construct(4).unwrap();
        assert!(payload.flags().contains(PayloadFlags::SHRINKABLE));

        let mut other = payload.share();
        assert_eq!(payload.ref_count(), 2);
        assert!(!payload.flags().contains(PayloadFlags::SHRINKABLE));
        assert!(payload.flags().contains(PayloadFlags::RESIZABLE));

        other.release();
        assert!(other.is_null());
        assert_eq!(payload.ref_count(), 1);
        assert!(payload.flags().contains(PayloadFlags::SHRINKABLE));
    }

    #[test]
    fn test_release_null_is_noop() {
        let mut payload = Payload::<f32>::null();
        payload.release();
        payload.release();
        assert!(payload.is_null());
        assert_eq!(payload.ref_count(), 0);
        assert!(!payload.is_valid());
    }

    #[test]
    fn test_freed_exactly_once() {
        let alloc = Arc::new(TrackingAllocator::new());
        let mut payload = Payload::<f64>::construct_in(16, alloc.clone()).unwrap();
        let mut a = payload.share();
        let b = a.share();

        payload.release();
        a.release();
        assert_eq!(alloc.frees(), 0);
        drop(b);
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.frees(), 1);
    }

    #[test]
    fn test_external_never_freed() {
        let mut buffer = vec![1.0_f32, 2.0, 3.0];
        let ptr = NonNull::new(buffer.as_mut_ptr()).unwrap();
        {
            let payload = unsafe { Payload::wrap_external(ptr, 3) }.unwrap();
            assert_eq!(payload.flags(), PayloadFlags::PREALLOCATED);
            payload.write().unwrap()[1] = 20.0;
            assert_eq!(payload.resize(5).unwrap_err(), Error::NotResizable);
        }
        assert_eq!(buffer, vec![1.0, 20.0, 3.0]);
    }

    #[test]
    fn test_resize_grow_and_shrink() {
        let payload = Payload::from_slice(&[1.0_f32, 2.0, 3.0]).unwrap();
        payload.resize(5).unwrap();
        assert_eq!(payload.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 0.0, 0.0]);

        payload.resize(2).unwrap();
        assert_eq!(payload.to_vec().unwrap(), vec![1.0, 2.0]);
        payload.resize(2).unwrap();
    }

    #[test]
    fn test_shrink_while_shared_fails() {
        let payload = Payload::<f32>::construct(8).unwrap();
        let other = payload.share();

        let err = payload.resize(4).unwrap_err();
        assert!(matches!(err, Error::ShrinkWhileShared { owners: 2, .. }));
        assert_eq!(payload.len(), 8);

        payload.resize(12).unwrap();
        assert_eq!(other.len(), 12);

        drop(other);
        payload.resize(4).unwrap();
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn test_lease_in_place() {
        let payload = Payload::from_slice(&[1.0_f32, 2.0, 3.0]).unwrap();
        let total = payload
            .lease_mut(&[&payload], |dst, srcs| {
                assert_eq!(dst.len(), 3);
                srcs[0].strided(0, 3, 1).unwrap().get(2)
            })
            .unwrap();
        assert_eq!(total, 3.0);

        let null = Payload::<f32>::null();
        assert_eq!(
            null.lease_mut(&[], |_, _| ()).unwrap_err(),
            Error::InvalidPayload
        );
    }

    #[test]
    fn test_lease_mut_crossed_threads() {
        use crate::kernel::{CpuKernel, Kernel, Strided};

        let a = Payload::from_slice(&[1.0_f64; 4]).unwrap();
        let b = Payload::from_slice(&[1.0_f64; 4]).unwrap();
        let ones = [1.0_f64; 4];
        let accumulate = |dst: &Payload<f64>, src: &Payload<f64>| {
            for _ in 0..2000 {
                dst.lease_mut(&[src, dst], |out, srcs| {
                    assert_eq!(srcs.len(), 2);
                    let y = out.strided_mut(0, 4, 1).unwrap();
                    CpuKernel::global().axpy(1.0, Strided::from_slice(&ones), y);
                })
                .unwrap();
            }
        };

        std::thread::scope(|scope| {
            scope.spawn(|| accumulate(&a, &b));
            scope.spawn(|| accumulate(&b, &a));
        });
        assert_eq!(a.to_vec().unwrap(), vec![2001.0; 4]);
        assert_eq!(b.to_vec().unwrap(), vec![2001.0; 4]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ref_count_tracks_share_and_release(
                ops in proptest::collection::vec(any::<bool>(), 0..64),
            ) {
                let alloc = Arc::new(TrackingAllocator::new());
                let root = Payload::<f32>::construct_in(4, alloc.clone()).unwrap();
                let mut handles = Vec::new();
                let (mut shares, mut releases) = (0_usize, 0_usize);

                for share in ops {
                    if share || handles.is_empty() {
                        handles.push(root.share());
                        shares += 1;
                    } else {
                        let mut handle: Payload<f32> = handles.pop().unwrap();
                        handle.release();
                        releases += 1;
                    }
                    prop_assert_eq!(root.ref_count(), 1 + shares - releases);
                    prop_assert_eq!(alloc.frees(), 0);
                }

                drop(handles);
                prop_assert_eq!(root.ref_count(), 1);
                drop(root);
                prop_assert_eq!(alloc.frees(), 1);
            }
        }
    }
}
