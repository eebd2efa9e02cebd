// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::mem::{align_of, size_of};
use core::ptr::NonNull;

use crate::{RawMemory, VectorError};

// =============================================================================
// new() / default()
// =============================================================================

#[test]
fn test_new_is_empty() {
    let memory = RawMemory::<u64>::new();

    assert_eq!(memory.capacity(), 0);
    assert_eq!(memory.as_ptr(), NonNull::<u64>::dangling().as_ptr());
}

#[test]
fn test_default_is_empty() {
    let memory = RawMemory::<u64>::default();
    assert_eq!(memory.capacity(), 0);
}

// =============================================================================
// with_capacity() / try_with_capacity()
// =============================================================================

#[test]
fn test_with_capacity() {
    let memory = RawMemory::<u64>::with_capacity(4);

    assert_eq!(memory.capacity(), 4);
    assert_ne!(memory.as_ptr(), NonNull::<u64>::dangling().as_ptr());
    assert_eq!(memory.as_ptr() as usize % align_of::<u64>(), 0);
}

#[test]
fn test_with_capacity_zero_does_not_allocate() {
    let memory = RawMemory::<u64>::with_capacity(0);

    assert_eq!(memory.capacity(), 0);
    assert_eq!(memory.as_ptr(), NonNull::<u64>::dangling().as_ptr());
}

#[test]
fn test_zero_sized_type_tracks_capacity_without_allocating() {
    let memory = RawMemory::<()>::with_capacity(10);

    assert_eq!(memory.capacity(), 10);
    assert_eq!(memory.as_ptr(), NonNull::<()>::dangling().as_ptr());
}

#[test]
fn test_try_with_capacity_overflow() {
    let result = RawMemory::<u64>::try_with_capacity(usize::MAX);

    assert!(matches!(
        result,
        Err(VectorError::CapacityOverflow {
            requested: usize::MAX
        })
    ));
}

#[test]
#[should_panic(expected = "capacity overflow")]
fn test_with_capacity_panics_on_overflow() {
    let _ = RawMemory::<u64>::with_capacity(usize::MAX);
}

// =============================================================================
// slot()
// =============================================================================

#[test]
fn test_slot_addresses_are_contiguous() {
    let memory = RawMemory::<u32>::with_capacity(5);

    for index in 0..=memory.capacity() {
        let offset = memory.slot(index) as usize - memory.as_ptr() as usize;
        assert_eq!(offset, index * size_of::<u32>());
    }
}

#[test]
fn test_slots_hold_values_written_by_owner() {
    let memory = RawMemory::<u32>::with_capacity(3);

    unsafe {
        for index in 0..3 {
            memory.slot(index).write(index as u32 * 10);
        }

        assert_eq!(memory.slot(0).read(), 0);
        assert_eq!(memory.slot(1).read(), 10);
        assert_eq!(memory.slot(2).read(), 20);
    }
}

// =============================================================================
// swap() / take()
// =============================================================================

#[test]
fn test_swap_exchanges_blocks() {
    let mut a = RawMemory::<u64>::with_capacity(4);
    let mut b = RawMemory::<u64>::with_capacity(2);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    a.swap(&mut b);

    assert_eq!(a.capacity(), 2);
    assert_eq!(b.capacity(), 4);
    assert_eq!(a.as_ptr(), b_ptr);
    assert_eq!(b.as_ptr(), a_ptr);
}

#[test]
fn test_take_leaves_source_empty() {
    let mut source = RawMemory::<u64>::with_capacity(8);
    let source_ptr = source.as_ptr();

    let taken = source.take();

    assert_eq!(taken.capacity(), 8);
    assert_eq!(taken.as_ptr(), source_ptr);
    assert_eq!(source.capacity(), 0);
}

// =============================================================================
// Debug / VectorError
// =============================================================================

#[test]
fn test_debug_shows_capacity_only() {
    let memory = RawMemory::<u8>::with_capacity(3);
    assert_eq!(format!("{memory:?}"), "RawMemory { capacity: 3 }");
}

#[test]
fn test_error_display() {
    let overflow = VectorError::CapacityOverflow { requested: 5 };
    assert_eq!(
        overflow.to_string(),
        "Capacity overflow: 5 elements exceed isize::MAX bytes"
    );

    let layout = core::alloc::Layout::new::<u64>();
    let failed = VectorError::AllocationFailed { layout };
    assert!(failed.to_string().starts_with("Allocation failed for layout"));
}
