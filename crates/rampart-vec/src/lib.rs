// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Growable contiguous array with transactional growth.
//!
//! The crate is split in two layers:
//!
//! - [`RawMemory<T>`]: owns one allocated block of uninitialized slots. It can
//!   be moved and swapped, never cloned, and never touches a `T`.
//! - [`Vector<T, R>`]: owns a `RawMemory<T>` plus a length, and is the only
//!   place where values are constructed and dropped.
//!
//! # Core Guarantees
//!
//! - **Live prefix**: slots `[0, len)` are live, slots `[len, capacity)` are
//!   uninitialized, before and after every operation, including when an
//!   element's `Default`, `Clone`, or a user closure panics.
//! - **Strong growth**: growing the block (`reserve`, `push_back` and
//!   `emplace` past capacity, reallocating `clone_from`) either completes or
//!   leaves the vector exactly as it was.
//! - **Doubling**: unplanned growth goes `0 → 1 → 2 → 4 → 8 ...`.
//! - **Static relocation policy**: the move-vs-clone decision for relocation
//!   is a type parameter ([`MoveRelocation`] or [`CloneRelocation`]), not a
//!   runtime branch.
//!
//! # Example
//!
//! ```rust
//! use rampart_vec::{Vector, VectorError};
//!
//! fn example() -> Result<(), VectorError> {
//!     let mut vec = Vector::<u32>::new();
//!     vec.try_reserve(2)?;
//!
//!     vec.try_push_back(10)?;
//!     vec.try_push_back(20)?;
//!     assert_eq!(vec.capacity(), 2);
//!
//!     // Unplanned growth doubles.
//!     vec.try_push_back(30)?;
//!     assert_eq!(vec.capacity(), 4);
//!
//!     assert_eq!(vec.remove(1), 20);
//!     assert_eq!(vec.as_slice(), [10, 30]);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! # Features
//!
//! - `test_utils`: exposes [`VectorBehaviour`] to inject allocation failures.
//! - `tracing`: emits `trace!` events on reallocation and rollback.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

extern crate alloc;

mod error;
mod guards;
mod raw_memory;
mod relocation;
mod trace;
mod vector;

#[cfg(test)]
mod tests;

pub use error::VectorError;
pub use raw_memory::RawMemory;
pub use relocation::{CloneRelocation, MoveRelocation, Relocation};
pub use vector::Vector;

#[cfg(any(test, feature = "test_utils"))]
pub use vector::VectorBehaviour;
