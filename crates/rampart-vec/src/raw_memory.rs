// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use alloc::alloc::{alloc, dealloc, handle_alloc_error};
use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use crate::error::VectorError;

/// An owned block of uninitialized slots for `T`.
///
/// `RawMemory` allocates room for exactly `capacity` values and frees it on
/// drop. It never constructs, reads, or drops a `T`: which slots hold live
/// values is known only to the owner (see [`Vector`](crate::Vector)), so the
/// block can be moved or swapped but never cloned.
///
/// A capacity of zero never allocates, and neither does a zero-sized `T`; in
/// both cases the base address is dangling (but well aligned).
///
/// # Example
///
/// ```rust
/// use rampart_vec::RawMemory;
///
/// let mut a = RawMemory::<u64>::with_capacity(4);
/// let mut b = RawMemory::<u64>::new();
///
/// a.swap(&mut b);
///
/// assert_eq!(a.capacity(), 0);
/// assert_eq!(b.capacity(), 4);
/// ```
pub struct RawMemory<T> {
    buffer: NonNull<T>,
    capacity: usize,
    _owns: PhantomData<T>,
}

// SAFETY: `RawMemory` uniquely owns its block; moving it to another thread
// moves every value the owner placed into it.
unsafe impl<T: Send> Send for RawMemory<T> {}

// SAFETY: shared access only hands out addresses, never `&T`.
unsafe impl<T: Sync> Sync for RawMemory<T> {}

impl<T> RawMemory<T> {
    /// Creates an empty block with zero capacity. Does not allocate.
    pub const fn new() -> Self {
        Self {
            buffer: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Allocates a block with room for `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics with `capacity overflow` if the block would exceed `isize::MAX`
    /// bytes, and aborts through [`handle_alloc_error`] if the allocator fails.
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(memory) => memory,
            Err(error) => handle_reserve_error(error),
        }
    }

    /// Allocates a block with room for `capacity` values.
    ///
    /// # Errors
    ///
    /// - [`VectorError::CapacityOverflow`] if the block would exceed `isize::MAX` bytes.
    /// - [`VectorError::AllocationFailed`] if the allocator returned null.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, VectorError> {
        let layout = Self::layout_for(capacity)?;

        if layout.size() == 0 {
            return Ok(Self {
                buffer: NonNull::dangling(),
                capacity,
                _owns: PhantomData,
            });
        }

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc(layout) };
        let buffer =
            NonNull::new(raw.cast::<T>()).ok_or(VectorError::AllocationFailed { layout })?;

        Ok(Self {
            buffer,
            capacity,
            _owns: PhantomData,
        })
    }

    /// Layout of a block holding `capacity` values of `T`.
    pub(crate) fn layout_for(capacity: usize) -> Result<Layout, VectorError> {
        Layout::array::<T>(capacity).map_err(|_| VectorError::CapacityOverflow {
            requested: capacity,
        })
    }

    /// Number of slots in the block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Address of slot `index`.
    ///
    /// `index == capacity` yields the one-past-the-end address. Computing the
    /// address is always safe; writing, reading, or dropping through it is
    /// only valid for `index < capacity`.
    #[inline]
    pub fn slot(&self, index: usize) -> *mut T {
        debug_assert!(
            index <= self.capacity,
            "slot {index} is outside a block of capacity {}",
            self.capacity
        );
        self.buffer.as_ptr().wrapping_add(index)
    }

    /// Base address of the block.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr()
    }

    /// Mutable base address of the block.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buffer.as_ptr()
    }

    /// Exchanges the blocks of `self` and `other`. Constant time, touches no values.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buffer, &mut other.buffer);
        mem::swap(&mut self.capacity, &mut other.capacity);
    }

    /// Moves the block out, leaving `self` empty with zero capacity.
    #[inline]
    pub fn take(&mut self) -> Self {
        let mut taken = Self::new();
        taken.swap(self);
        taken
    }
}

impl<T> Default for RawMemory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for RawMemory<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawMemory")
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T> Drop for RawMemory<T> {
    fn drop(&mut self) {
        let Ok(layout) = Self::layout_for(self.capacity) else {
            return;
        };

        if layout.size() == 0 {
            return;
        }

        // SAFETY: the block was allocated by `try_with_capacity` with this
        // same layout and has not been released.
        unsafe { dealloc(self.buffer.as_ptr().cast::<u8>(), layout) };
    }
}

/// Turns a reservation error into the abort/panic of the infallible API.
#[cold]
#[inline(never)]
pub(crate) fn handle_reserve_error(error: VectorError) -> ! {
    match error {
        VectorError::CapacityOverflow { .. } => panic!("capacity overflow"),
        VectorError::AllocationFailed { layout } => handle_alloc_error(layout),
    }
}
