// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Scoped rollback for multi-step construction.
//!
//! Every step that places values into uninitialized slots holds a guard. If a
//! later step unwinds, the guard drops exactly what its step built and nothing
//! else. On success the guard is disarmed with `mem::forget`.

use core::mem;
use core::ptr;

use crate::trace::trace_event;

/// Tracks a run of values being built front to back into uninitialized slots.
pub(crate) struct InitGuard<T> {
    start: *mut T,
    initialized: usize,
}

impl<T> InitGuard<T> {
    pub(crate) fn new(start: *mut T) -> Self {
        Self {
            start,
            initialized: 0,
        }
    }

    /// Writes `value` into the next slot of the run.
    ///
    /// # Safety
    ///
    /// The next slot must be inside the block and uninitialized.
    #[inline]
    pub(crate) unsafe fn push(&mut self, value: T) {
        // SAFETY: guaranteed by the caller.
        unsafe { self.start.add(self.initialized).write(value) };
        self.initialized += 1;
    }

    /// Keeps the built values and returns how many there are.
    #[inline]
    pub(crate) fn finish(self) -> usize {
        let initialized = self.initialized;
        mem::forget(self);
        initialized
    }
}

impl<T> Drop for InitGuard<T> {
    fn drop(&mut self) {
        trace_event!(dropped = self.initialized, "partial build rolled back");

        // SAFETY: exactly `initialized` values were written starting at `start`
        // and nobody else owns them yet.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.start,
                self.initialized,
            ));
        }
    }
}

/// Rollback action over a run of values that are already live.
///
/// Registered after a step succeeds so that a failure in a later step
/// destroys this step's output.
pub(crate) struct DropGuard<T> {
    start: *mut T,
    len: usize,
}

impl<T> DropGuard<T> {
    /// # Safety
    ///
    /// `[start, start + len)` must hold live values owned by the caller, and
    /// nothing else may drop them while the guard is armed.
    #[inline]
    pub(crate) unsafe fn new(start: *mut T, len: usize) -> Self {
        Self { start, len }
    }

    /// The step's output is kept.
    #[inline]
    pub(crate) fn disarm(self) {
        mem::forget(self);
    }
}

impl<T> Drop for DropGuard<T> {
    fn drop(&mut self) {
        trace_event!(dropped = self.len, "relocation rolled back");

        // SAFETY: the run is live and exclusively owned by this guard (see `new`).
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.len));
        }
    }
}

/// Builds `count` values into the uninitialized run starting at `dst`.
///
/// `make(i)` produces the value for slot `i`. If it unwinds, the values
/// already built are dropped before the panic continues.
///
/// # Safety
///
/// `[dst, dst + count)` must be inside one block and uninitialized.
pub(crate) unsafe fn fill_with<T, F>(dst: *mut T, count: usize, mut make: F)
where
    F: FnMut(usize) -> T,
{
    let mut guard = InitGuard::new(dst);

    for index in 0..count {
        let value = make(index);
        // SAFETY: slot `index` of the run is uninitialized (see above).
        unsafe { guard.push(value) };
    }

    guard.finish();
}
