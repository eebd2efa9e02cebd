// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::marker::PhantomData;
use core::ops::{Deref, DerefMut, Range};
use core::ptr;
use core::slice;

use crate::error::VectorError;
use crate::guards::{DropGuard, fill_with};
use crate::raw_memory::{RawMemory, handle_reserve_error};
use crate::relocation::{MoveRelocation, Relocation};
use crate::trace::trace_event;

/// Test behaviour for injecting failures in `Vector` operations.
///
/// Only available with the `test_utils` feature. The behaviour is sticky:
/// once set, it stays active until changed.
///
/// # Example
///
/// ```rust,ignore
/// // test_utils feature required in dev-dependencies
/// use rampart_vec::{Vector, VectorBehaviour, VectorError};
///
/// let mut vec = Vector::<u8>::new();
/// vec.change_behaviour(VectorBehaviour::FailAtAllocation);
///
/// assert!(matches!(
///     vec.try_push_back(1),
///     Err(VectorError::AllocationFailed { .. })
/// ));
/// ```
#[cfg(any(test, feature = "test_utils"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VectorBehaviour {
    /// Normal behaviour - no injected failures.
    #[default]
    None,
    /// Every allocation request reports `AllocationFailed`.
    FailAtAllocation,
}

/// A growable contiguous array.
///
/// `Vector` owns one [`RawMemory`] block and a length. Slots `[0, len)` hold
/// live values; slots `[len, capacity)` are uninitialized. Every mutating
/// operation restores that split before it returns, and also when it unwinds.
///
/// # Guarantees on failure
///
/// - Growth (`reserve`, `push_back`, `emplace*`, `insert` past capacity) and
///   the reallocating branch of `clone_from` either complete or leave the
///   vector exactly as it was.
/// - `with_len` and `clone` build all elements or none.
/// - The in-place branch of `clone_from` may stop halfway: see its docs.
///
/// # Relocation policy
///
/// `R` decides how values reach a new block when the vector grows. The
/// default, [`MoveRelocation`], moves bitwise and cannot fail.
/// [`CloneRelocation`](crate::CloneRelocation) clones and keeps the originals
/// alive until the new block is complete.
///
/// # Positions
///
/// Positions are indices. Raw ranges from [`as_ptr_range`](Self::as_ptr_range)
/// are invalidated by any capacity change and by any insert or erase that
/// shifts elements.
///
/// # Example
///
/// ```rust
/// use rampart_vec::Vector;
///
/// let mut vec = Vector::new();
/// vec.push_back(1);
/// vec.push_back(2);
/// vec.push_back(3);
/// assert_eq!(vec.capacity(), 4);
///
/// vec.insert(1, 99);
/// assert_eq!(vec.as_slice(), [1, 99, 2, 3]);
///
/// vec.erase(0);
/// assert_eq!(vec.as_slice(), [99, 2, 3]);
/// ```
pub struct Vector<T, R = MoveRelocation> {
    data: RawMemory<T>,
    len: usize,
    #[cfg(any(test, feature = "test_utils"))]
    behaviour: VectorBehaviour,
    _relocation: PhantomData<fn() -> R>,
}

impl<T> Vector<T> {
    /// Creates an empty vector with the default [`MoveRelocation`] policy.
    /// Does not allocate.
    pub const fn new() -> Self {
        Self::with_policy()
    }
}

impl<T, R> Vector<T, R> {
    /// Creates an empty vector that relocates with policy `R`. Does not allocate.
    ///
    /// ```rust
    /// use rampart_vec::{CloneRelocation, Vector};
    ///
    /// let vec = Vector::<u8, CloneRelocation<u8>>::with_policy();
    /// assert_eq!(vec.capacity(), 0);
    /// ```
    pub const fn with_policy() -> Self {
        Self {
            data: RawMemory::new(),
            len: 0,
            #[cfg(any(test, feature = "test_utils"))]
            behaviour: VectorBehaviour::None,
            _relocation: PhantomData,
        }
    }

    /// Creates a vector of `len` default values, with capacity exactly `len`.
    ///
    /// If `T::default()` panics, the values built so far are dropped and the
    /// block is released before the panic continues.
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let mut vec = Self::with_policy();
        vec.data = RawMemory::with_capacity(len);

        // SAFETY: the block is fresh, so all `len` slots are uninitialized.
        unsafe { fill_with(vec.data.slot(0), len, |_| T::default()) };
        vec.len = len;

        vec
    }

    /// Changes the failure injection behaviour.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn change_behaviour(&mut self, behaviour: VectorBehaviour) {
        self.behaviour = behaviour;
    }

    /// Returns the number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the current block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Returns the live elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is live and the base address is aligned and non-null.
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// Returns the live elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: `[0, len)` is live and uniquely borrowed through `self`.
        unsafe { slice::from_raw_parts_mut(self.data.as_mut_ptr(), self.len) }
    }

    /// Base address of the live range.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Mutable base address of the live range.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Begin/end addresses of the live range.
    ///
    /// Invalidated by any capacity change and by any insert or erase.
    #[inline]
    pub fn as_ptr_range(&self) -> Range<*const T> {
        self.as_slice().as_ptr_range()
    }

    /// Mutable begin/end addresses of the live range.
    #[inline]
    pub fn as_mut_ptr_range(&mut self) -> Range<*mut T> {
        self.as_mut_slice().as_mut_ptr_range()
    }

    /// Exchanges contents with `other` in constant time.
    ///
    /// This is move-assignment: `other` ends up owning (and eventually
    /// dropping) what `self` held.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.data.swap(&mut other.data);
        core::mem::swap(&mut self.len, &mut other.len);
    }

    /// Moves the contents out, leaving `self` empty with zero capacity.
    #[inline]
    pub fn take(&mut self) -> Self {
        let mut taken = Self::with_policy();
        taken.swap(self);
        taken
    }

    /// Removes and returns the last element, or `None` if empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        // SAFETY: slot `len` was the last live slot and is now outside the live range.
        Some(unsafe { self.data.slot(self.len).read() })
    }

    /// Drops the last element. Does nothing if the vector is empty.
    #[inline]
    pub fn pop_back(&mut self) {
        drop(self.pop());
    }

    /// Drops every element from `len` onwards. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let tail = ptr::slice_from_raw_parts_mut(self.data.slot(len), self.len - len);
        self.len = len;

        // SAFETY: the tail was live and is no longer reachable through `self`.
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Drops every element. Capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Removes and returns the element at `index`, shifting the rest toward the front.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index (is {index}) should be < len (is {})",
            self.len
        );

        // SAFETY: `index` is live. Reading it vacates the slot, the shift
        // refills it, and the last slot is vacated by the shift.
        unsafe {
            let removed = self.data.slot(index).read();
            self.shift_toward_front(index + 1, self.len);
            self.len -= 1;
            removed
        }
    }

    /// Drops the element at `index` and returns `index`, which now names the
    /// element that followed it (or the end).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    /// Moves `[from, to)` one slot toward the end, back to front.
    ///
    /// # Safety
    ///
    /// `[from, to)` must be live and slot `to` vacated. Afterwards slot `from`
    /// is vacated.
    unsafe fn shift_toward_end(&mut self, from: usize, to: usize) {
        debug_assert!(from <= to && to < self.data.capacity());

        for index in (from..to).rev() {
            // SAFETY: slot `index + 1` was vacated by the previous iteration
            // (or is `to` on the first one).
            unsafe { ptr::copy_nonoverlapping(self.data.slot(index), self.data.slot(index + 1), 1) };
        }
    }

    /// Moves `[from, to)` one slot toward the front, front to back.
    ///
    /// # Safety
    ///
    /// `[from, to)` must be live and slot `from - 1` vacated. Afterwards slot
    /// `to - 1` is vacated.
    unsafe fn shift_toward_front(&mut self, from: usize, to: usize) {
        debug_assert!(0 < from && from <= to && to <= self.data.capacity());

        for index in from..to {
            // SAFETY: slot `index - 1` was vacated by the previous iteration
            // (or is `from - 1` on the first one).
            unsafe { ptr::copy_nonoverlapping(self.data.slot(index), self.data.slot(index - 1), 1) };
        }
    }

    fn allocate(&self, capacity: usize) -> Result<RawMemory<T>, VectorError> {
        #[cfg(any(test, feature = "test_utils"))]
        if matches!(self.behaviour, VectorBehaviour::FailAtAllocation) {
            return Err(VectorError::AllocationFailed {
                layout: RawMemory::<T>::layout_for(capacity)?,
            });
        }

        RawMemory::try_with_capacity(capacity)
    }

    /// Capacity after one unplanned growth step: `max(1, 2 * capacity)`.
    fn grown_capacity(&self) -> Result<usize, VectorError> {
        match self.capacity() {
            0 => Ok(1),
            capacity => capacity
                .checked_mul(2)
                .ok_or(VectorError::CapacityOverflow {
                    requested: usize::MAX,
                }),
        }
    }
}

impl<T, R: Relocation<T>> Vector<T, R> {
    /// Grows the block to exactly `new_capacity` slots.
    ///
    /// Does nothing if `new_capacity <= capacity()`; element addresses are
    /// then unchanged.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow and aborts on allocation failure. If the
    /// relocation policy panics, the vector is unchanged.
    pub fn reserve(&mut self, new_capacity: usize) {
        if let Err(error) = self.try_reserve(new_capacity) {
            handle_reserve_error(error);
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    ///
    /// # Errors
    ///
    /// Returns a [`VectorError`] if the block cannot be allocated. The vector
    /// is unchanged.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), VectorError> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }

        let new_data = self.allocate(new_capacity)?;
        self.relocate_into(new_data);

        Ok(())
    }

    /// Resizes to `new_len`, filling new slots with `T::default()`.
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Resizes to `new_len`, filling new slots with values from `make`.
    ///
    /// Shrinking drops the tail. Growing reserves exactly `new_len` slots
    /// first; if `make` panics, the new values built so far are dropped and
    /// the length is unchanged (the capacity may have grown).
    pub fn resize_with<F>(&mut self, new_len: usize, mut make: F)
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }

        self.reserve(new_len);

        // SAFETY: `reserve` made `[len, new_len)` available and it is uninitialized.
        unsafe { fill_with(self.data.slot(self.len), new_len - self.len, |_| make()) };
        self.len = new_len;
    }

    /// Appends `value`.
    #[inline]
    pub fn push_back(&mut self, value: T) {
        self.emplace_back(value);
    }

    /// Fallible version of [`push_back`](Self::push_back).
    ///
    /// # Errors
    ///
    /// Returns a [`VectorError`] if growing fails; `value` is dropped and the
    /// vector is unchanged.
    pub fn try_push_back(&mut self, value: T) -> Result<(), VectorError> {
        let len = self.len;
        self.try_emplace_with(len, || value).map(|_| ())
    }

    /// Appends `value` and returns a reference to it.
    #[inline]
    pub fn emplace_back(&mut self, value: T) -> &mut T {
        let len = self.len;
        self.emplace(len, value)
    }

    /// Appends the value produced by `make` and returns a reference to it.
    #[inline]
    pub fn emplace_back_with<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let len = self.len;
        self.emplace_with(len, make)
    }

    /// Inserts `value` at `index` and returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        self.emplace(index, value);
        index
    }

    /// Inserts `value` at `index` and returns a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[inline]
    pub fn emplace(&mut self, index: usize, value: T) -> &mut T {
        self.emplace_with(index, || value)
    }

    /// Inserts the value produced by `make` at `index` and returns a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`, on capacity overflow, or if `make` panics
    /// (the vector is then unchanged). Aborts on allocation failure.
    pub fn emplace_with<F>(&mut self, index: usize, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        match self.try_emplace_with(index, make) {
            Ok(value) => value,
            Err(error) => handle_reserve_error(error),
        }
    }

    /// Fallible version of [`emplace_with`](Self::emplace_with).
    ///
    /// When the vector is full, the new block is allocated before `make` runs,
    /// so an allocation error means `make` was never called.
    ///
    /// # Errors
    ///
    /// Returns a [`VectorError`] if growing fails. The vector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn try_emplace_with<F>(&mut self, index: usize, make: F) -> Result<&mut T, VectorError>
    where
        F: FnOnce() -> T,
    {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );

        if self.len < self.capacity() {
            // SAFETY: there is a free slot and `index <= len`.
            unsafe { self.emplace_within_capacity(index, make) };
        } else {
            let new_data = self.allocate(self.grown_capacity()?)?;
            // SAFETY: `new_data` is fresh and larger than `len`, and `index <= len`.
            unsafe { self.emplace_reallocating(new_data, index, make) };
        }

        // SAFETY: `index` is live after either branch.
        Ok(unsafe { &mut *self.data.slot(index) })
    }

    /// Appends clones of every element of `other`.
    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        let Some(required) = self.len.checked_add(other.len()) else {
            handle_reserve_error(VectorError::CapacityOverflow {
                requested: usize::MAX,
            });
        };

        if required > self.capacity() {
            let grown = self.grown_capacity().unwrap_or(required);
            self.reserve(required.max(grown));
        }

        // SAFETY: `[len, required)` is available and uninitialized.
        unsafe { fill_with(self.data.slot(self.len), other.len(), |index| other[index].clone()) };
        self.len = required;
    }

    /// # Safety
    ///
    /// `len < capacity` and `index <= len`.
    unsafe fn emplace_within_capacity<F>(&mut self, index: usize, make: F)
    where
        F: FnOnce() -> T,
    {
        let end = self.len;

        if index == end {
            // SAFETY: slot `end` is free.
            unsafe { self.data.slot(end).write(make()) };
        } else {
            // Built before any slot is touched: if `make` or the relocation
            // below unwinds, the vector is unchanged.
            let value = make();

            // SAFETY: `end - 1` is live and `end` is free. After `retire`,
            // `end - 1` is vacated and the shift leaves `index` vacated.
            unsafe {
                R::relocate(self.data.slot(end - 1), self.data.slot(end), 1);
                R::retire(self.data.slot(end - 1), 1);
                self.shift_toward_end(index, end - 1);
                self.data.slot(index).write(value);
            }
        }

        self.len += 1;
    }

    /// # Safety
    ///
    /// `new_data.capacity() > len` and `index <= len`.
    unsafe fn emplace_reallocating<F>(&mut self, mut new_data: RawMemory<T>, index: usize, make: F)
    where
        F: FnOnce() -> T,
    {
        let len = self.len;
        let old = self.data.slot(0);
        let new = new_data.slot(0);

        // SAFETY: all slots of `new_data` are uninitialized and `index < capacity`.
        // Each completed step registers a guard, so an unwinding step drops
        // only what the new block holds; the old block is never modified
        // before `retire`.
        unsafe {
            new.add(index).write(make());
            let element = DropGuard::new(new.add(index), 1);

            R::relocate(old, new, index);
            let prefix = (!R::INFALLIBLE).then(|| DropGuard::new(new, index));

            R::relocate(old.add(index), new.add(index + 1), len - index);

            if let Some(prefix) = prefix {
                prefix.disarm();
            }
            element.disarm();

            R::retire(old, len);
        }

        trace_event!(
            old_capacity = self.data.capacity(),
            new_capacity = new_data.capacity(),
            len = len + 1,
            "vector reallocated"
        );

        self.data.swap(&mut new_data);
        self.len += 1;
    }

    /// Relocates every live element into `new_data` and adopts it.
    ///
    /// If the relocation unwinds, `new_data` is released and `self` is unchanged.
    fn relocate_into(&mut self, mut new_data: RawMemory<T>) {
        debug_assert!(new_data.capacity() >= self.len);

        // SAFETY: `[0, len)` is live in the old block and uninitialized in the new one.
        unsafe {
            R::relocate(self.data.slot(0), new_data.slot(0), self.len);
            R::retire(self.data.slot(0), self.len);
        }

        trace_event!(
            old_capacity = self.data.capacity(),
            new_capacity = new_data.capacity(),
            len = self.len,
            "vector reallocated"
        );

        self.data.swap(&mut new_data);
    }
}

impl<T, R> Drop for Vector<T, R> {
    fn drop(&mut self) {
        let live = ptr::slice_from_raw_parts_mut(self.data.as_mut_ptr(), self.len);

        // SAFETY: `[0, len)` is live; the block itself is released by `RawMemory`.
        unsafe { ptr::drop_in_place(live) };
    }
}

impl<T: Clone, R> Clone for Vector<T, R> {
    /// Deep copy of the live elements, with capacity exactly `len`.
    fn clone(&self) -> Self {
        let mut copy = Self::with_policy();
        copy.data = RawMemory::with_capacity(self.len);

        // SAFETY: the block is fresh.
        unsafe { fill_with(copy.data.slot(0), self.len, |index| self[index].clone()) };
        copy.len = self.len;

        copy
    }

    /// Copy-assignment.
    ///
    /// If `source` does not fit in the current capacity, a full copy is built
    /// and swapped in: a panicking `clone` leaves `self` unchanged.
    ///
    /// Otherwise the storage is reused. The overlapping prefix is assigned
    /// with `clone_from`, then the tail is dropped or cloned in place. A panic
    /// here leaves a consistent but mixed vector: the first elements carry new
    /// values, the rest keep old ones, and every element is still dropped
    /// exactly once.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut copy = source.clone();
            self.swap(&mut copy);
            return;
        }

        let overlap = self.len.min(source.len);

        for index in 0..overlap {
            self[index].clone_from(&source[index]);
        }

        if source.len <= self.len {
            self.truncate(source.len);
            return;
        }

        // SAFETY: `source.len <= capacity`, so `[len, source.len)` is available
        // and uninitialized.
        unsafe {
            fill_with(self.data.slot(self.len), source.len - self.len, |offset| {
                source[overlap + offset].clone()
            });
        }
        self.len = source.len;
    }
}

impl<T, R> Default for Vector<T, R> {
    fn default() -> Self {
        Self::with_policy()
    }
}

impl<T: core::fmt::Debug, R> core::fmt::Debug for Vector<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vector")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("data", &self.as_slice())
            .finish()
    }
}

impl<T: PartialEq, R> PartialEq for Vector<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, R> Eq for Vector<T, R> {}

impl<T, R> Deref for Vector<T, R> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, R> DerefMut for Vector<T, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, R> AsRef<[T]> for Vector<T, R> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, R> AsMut<[T]> for Vector<T, R> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T, R> IntoIterator for &'a Vector<T, R> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, R> IntoIterator for &'a mut Vector<T, R> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, R: Relocation<T>> Extend<T> for Vector<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T, R: Relocation<T>> FromIterator<T> for Vector<T, R> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::with_policy();
        vec.extend(iter);
        vec
    }
}

impl<T: Clone, R: Relocation<T>> From<&[T]> for Vector<T, R> {
    fn from(values: &[T]) -> Self {
        let mut vec = Self::with_policy();
        vec.extend_from_slice(values);
        vec
    }
}
