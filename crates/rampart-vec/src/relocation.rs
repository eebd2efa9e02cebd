// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Relocation policies: how values travel from an old block to a new one.
//!
//! A [`Vector`](crate::Vector) picks its policy through a type parameter, so
//! the move-vs-copy choice is made once per element type at compile time.
//!
//! | Policy              | Transfer      | `INFALLIBLE` | Source after `relocate` |
//! |---------------------|---------------|--------------|-------------------------|
//! | [`MoveRelocation`]  | bitwise move  | `true`       | uninitialized           |
//! | [`CloneRelocation`] | `Clone::clone`| `false`      | live until `retire`     |

use core::marker::PhantomData;
use core::ptr;

use crate::guards::fill_with;

/// Strategy for transferring live values into uninitialized slots.
///
/// A relocation is two-phase. `relocate` builds the destination values;
/// `retire` finishes off the sources once the enclosing operation can no
/// longer fail. Between the two phases the sources must be left untouched,
/// so an operation that fails after `relocate` only has to drop the
/// destination run to restore its starting state.
///
/// # Safety
///
/// Implementations must uphold:
/// - on return from `relocate`, `[dst, dst + count)` holds live values;
/// - if `relocate` unwinds, nothing in `dst` is live and the sources are
///   untouched;
/// - if `INFALLIBLE` is `true`, `relocate` never unwinds, and the sources are
///   logically moved out (dropping them or the destination run twice is a
///   double drop);
/// - `retire` leaves every source slot uninitialized and never unwinds.
pub unsafe trait Relocation<T> {
    /// Whether `relocate` is guaranteed not to unwind.
    const INFALLIBLE: bool;

    /// Transfers `count` values from `src` into the uninitialized run at `dst`.
    ///
    /// # Safety
    ///
    /// `[src, src + count)` must be live, `[dst, dst + count)` uninitialized,
    /// and the two runs must not overlap.
    unsafe fn relocate(src: *const T, dst: *mut T, count: usize);

    /// Ends the lifetime of `count` sources previously passed to `relocate`.
    ///
    /// # Safety
    ///
    /// `[src, src + count)` must be exactly a run that `relocate` returned
    /// from, and it must not be read again afterwards.
    unsafe fn retire(src: *mut T, count: usize);
}

/// Relocates by bitwise move. Never fails.
///
/// The default policy. A Rust move never runs user code, so this is always the
/// cheapest choice and it never needs rollback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveRelocation;

// SAFETY: `copy_nonoverlapping` cannot unwind, and after it the sources are
// bitwise duplicates that must be forgotten, which `retire` does by doing nothing.
unsafe impl<T> Relocation<T> for MoveRelocation {
    const INFALLIBLE: bool = true;

    #[inline]
    unsafe fn relocate(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: the runs are valid and disjoint (see trait contract).
        unsafe { ptr::copy_nonoverlapping(src, dst, count) };
    }

    #[inline]
    unsafe fn retire(_src: *mut T, _count: usize) {}
}

/// Relocates by cloning, then drops the originals once the operation commits.
///
/// Every original stays alive until the whole transfer has succeeded, so a
/// panicking `Clone` leaves the vector exactly as it was. Use it for element
/// types that must observe each relocation (instance registries, counters).
///
/// ```rust
/// use rampart_vec::{CloneRelocation, Vector};
///
/// let mut vec: Vector<String, CloneRelocation<String>> = Vector::with_policy();
/// vec.push_back("a".to_owned());
/// vec.push_back("b".to_owned());
///
/// assert_eq!(vec.as_slice(), ["a", "b"]);
/// ```
pub struct CloneRelocation<T>(PhantomData<fn() -> T>);

impl<T> core::fmt::Debug for CloneRelocation<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("CloneRelocation")
    }
}

// SAFETY: `fill_with` drops every clone it built if one unwinds, and the
// sources are only read. `retire` drops the sources, which must not panic.
unsafe impl<T: Clone> Relocation<T> for CloneRelocation<T> {
    const INFALLIBLE: bool = false;

    unsafe fn relocate(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: `dst` run is uninitialized and `src` run is live (see trait contract).
        unsafe { fill_with(dst, count, |index| (*src.add(index)).clone()) };
    }

    unsafe fn retire(src: *mut T, count: usize) {
        // SAFETY: the sources are live and no longer needed.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(src, count)) };
    }
}
