//! Allocator - Payload Memory Allocation Policy
//!
//! Provides the allocation policy injected into payloads. Every payload
//! allocation is zero-initialized and aligned to a configurable boundary
//! (64 bytes unless configured otherwise).
//!
//! # Key Features
//! - Object-safe allocator trait shared by all payloads
//! - Configurable alignment instead of a fixed constant
//! - Tracking allocator for verifying allocation and free counts
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt::Debug;
use core::ptr::NonNull;
use std::alloc::{self, Layout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config;
use crate::dtype::Scalar;
use crate::error::{Error, Result};

// =============================================================================
// Allocator Trait
// =============================================================================

/// Allocation policy used by owning payloads.
pub trait Allocator: Debug + Send + Sync {
    /// Minimum byte alignment this allocator applies to every allocation.
    fn alignment(&self) -> usize;

    /// Allocates zero-initialized memory for `layout`.
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Releases memory previously returned by this allocator.
    ///
    /// # Safety
    /// `ptr` must come from `allocate_zeroed`/`reallocate` on this allocator
    /// with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Moves an allocation to `new_layout`, preserving the common prefix and
    /// zero-filling any growth.
    ///
    /// # Safety
    /// Same contract as `deallocate` for `ptr` and `old`; on success the old
    /// pointer is invalid.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<u8>> {
        let fresh = self.allocate_zeroed(new_layout)?;
        core::ptr::copy_nonoverlapping(
            ptr.as_ptr(),
            fresh.as_ptr(),
            old.size().min(new_layout.size()),
        );
        self.deallocate(ptr, old);
        Ok(fresh)
    }
}

/// Computes the layout for `len` elements of `T` under `alignment`.
pub fn layout_for<T: Scalar>(len: usize, alignment: usize) -> Result<Layout> {
    let align = alignment.max(core::mem::align_of::<T>());
    Layout::array::<T>(len)
        .and_then(|layout| layout.align_to(align))
        .map_err(|_| Error::InvalidLayout { len, align })
}

// =============================================================================
// Default Allocator
// =============================================================================

/// Default CPU allocator using the global system allocator.
#[derive(Debug, Clone, Copy)]
pub struct DefaultAllocator {
    alignment: usize,
}

impl DefaultAllocator {
    /// Creates an allocator with the globally configured alignment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alignment: config::global().alloc.alignment,
        }
    }

    /// Creates an allocator with an explicit alignment.
    ///
    /// # Arguments
    /// * `alignment` - Byte alignment, must be a power of two
    pub fn with_alignment(alignment: usize) -> Result<Self> {
        if !alignment.is_power_of_two() {
            return Err(Error::config(format!(
                "alignment must be a power of two, got {alignment}"
            )));
        }
        Ok(Self { alignment })
    }

    /// Returns a shared handle suitable for payload construction.
    #[must_use]
    pub fn shared() -> Arc<dyn Allocator> {
        Arc::new(Self::new())
    }
}

impl Default for DefaultAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for DefaultAllocator {
    fn alignment(&self) -> usize {
        self.alignment
    }

    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
        if layout.size() == 0 {
            return Err(Error::ZeroLength);
        }
        // SAFETY: layout has a nonzero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).ok_or(Error::AllocationFailed {
            size: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::dealloc(ptr.as_ptr(), layout);
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<u8>> {
        if old.align() != new_layout.align() || new_layout.size() == 0 {
            return self.reallocate_by_copy(ptr, old, new_layout);
        }
        let raw = alloc::realloc(ptr.as_ptr(), old, new_layout.size());
        let fresh = NonNull::new(raw).ok_or(Error::AllocationFailed {
            size: new_layout.size(),
            align: new_layout.align(),
        })?;
        if new_layout.size() > old.size() {
            core::ptr::write_bytes(
                fresh.as_ptr().add(old.size()),
                0,
                new_layout.size() - old.size(),
            );
        }
        Ok(fresh)
    }
}

impl DefaultAllocator {
    unsafe fn reallocate_by_copy(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<u8>> {
        let fresh = self.allocate_zeroed(new_layout)?;
        core::ptr::copy_nonoverlapping(
            ptr.as_ptr(),
            fresh.as_ptr(),
            old.size().min(new_layout.size()),
        );
        self.deallocate(ptr, old);
        Ok(fresh)
    }
}

// =============================================================================
// Tracking Allocator
// =============================================================================

/// Allocator wrapper that counts allocations and frees.
///
/// Used to verify that a payload's buffer is freed exactly once, and never
/// for wrapped external memory.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    inner: DefaultAllocator,
    allocations: AtomicUsize,
    frees: AtomicUsize,
    reallocations: AtomicUsize,
}

impl TrackingAllocator {
    /// Creates a tracking allocator over the default allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful allocations.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Number of frees.
    #[must_use]
    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Number of successful reallocations.
    #[must_use]
    pub fn reallocations(&self) -> usize {
        self.reallocations.load(Ordering::SeqCst)
    }

    /// Allocations not yet freed.
    #[must_use]
    pub fn live(&self) -> usize {
        self.allocations() - self.frees()
    }
}

impl Allocator for TrackingAllocator {
    fn alignment(&self) -> usize {
        self.inner.alignment()
    }

    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
        let ptr = self.inner.allocate_zeroed(layout)?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        self.inner.deallocate(ptr, layout);
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<u8>> {
        let fresh = self.inner.reallocate(ptr, old, new_layout)?;
        self.reallocations.fetch_add(1, Ordering::SeqCst);
        Ok(fresh)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_alignment() {
        let layout = layout_for::<f32>(10, 64).unwrap();
        assert_eq!(layout.align(), 64);
        assert_eq!(layout.size(), 40);

        let layout = layout_for::<f64>(3, 1).unwrap();
        assert_eq!(layout.align(), core::mem::align_of::<f64>());
    }

    #[test]
    fn test_allocate_zeroed_aligned() {
        let alloc = DefaultAllocator::with_alignment(128).unwrap();
        let layout = layout_for::<f32>(100, alloc.alignment()).unwrap();
        let ptr = alloc.allocate_zeroed(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 128, 0);

        unsafe {
            let data = core::slice::from_raw_parts(ptr.as_ptr().cast::<f32>(), 100);
            assert!(data.iter().all(|&x| x == 0.0));
            alloc.deallocate(ptr, layout);
        }
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(DefaultAllocator::with_alignment(24).is_err());
    }

    #[test]
    fn test_reallocate_zero_fills_growth() {
        let alloc = DefaultAllocator::with_alignment(64).unwrap();
        let old = layout_for::<f64>(2, 64).unwrap();
        let new = layout_for::<f64>(5, 64).unwrap();
        unsafe {
            let ptr = alloc.allocate_zeroed(old).unwrap();
            let data = core::slice::from_raw_parts_mut(ptr.as_ptr().cast::<f64>(), 2);
            data.copy_from_slice(&[1.5, 2.5]);

            let ptr = alloc.reallocate(ptr, old, new).unwrap();
            let data = core::slice::from_raw_parts(ptr.as_ptr().cast::<f64>(), 5);
            assert_eq!(data, &[1.5, 2.5, 0.0, 0.0, 0.0]);
            alloc.deallocate(ptr, new);
        }
    }

    #[test]
    fn test_tracking_counts() {
        let alloc = TrackingAllocator::new();
        let layout = layout_for::<f32>(8, alloc.alignment()).unwrap();
        let ptr = alloc.allocate_zeroed(layout).unwrap();
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.live(), 1);
        unsafe { alloc.deallocate(ptr, layout) };
        assert_eq!(alloc.frees(), 1);
        assert_eq!(alloc.live(), 0);
    }
}
