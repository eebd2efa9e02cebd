// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for rampart-vec.

use core::alloc::Layout;

use thiserror::Error;

/// Error type for operations that request storage.
///
/// Returned by the `try_*` family ([`Vector::try_reserve`](crate::Vector::try_reserve),
/// [`Vector::try_push_back`](crate::Vector::try_push_back),
/// [`RawMemory::try_with_capacity`](crate::RawMemory::try_with_capacity), ...).
/// Whenever one of these errors is returned, the vector is exactly as it was
/// before the call.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum VectorError {
    /// The requested number of slots does not fit in `isize::MAX` bytes.
    ///
    /// Reported before the allocator is ever asked for memory.
    #[error("Capacity overflow: {requested} elements exceed isize::MAX bytes")]
    CapacityOverflow {
        /// Number of slots that was requested.
        requested: usize,
    },

    /// The global allocator could not satisfy the request.
    #[error("Allocation failed for layout {layout:?}")]
    AllocationFailed {
        /// Layout of the block that could not be allocated.
        layout: Layout,
    },
}
