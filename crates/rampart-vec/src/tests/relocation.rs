// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

use rampart_test_utils::{Probe, ProbeBehaviour, assert_no_leaks, change_behaviour, ledger, reset};

use crate::RawMemory;
use crate::guards::fill_with;
use crate::{CloneRelocation, MoveRelocation, Relocation};

fn filled(values: &[i64]) -> RawMemory<Probe> {
    let memory = RawMemory::with_capacity(values.len());
    unsafe { fill_with(memory.slot(0), values.len(), |index| Probe::new(values[index])) };
    memory
}

fn read_values(memory: &RawMemory<Probe>, len: usize) -> Vec<i64> {
    (0..len).map(|index| unsafe { (*memory.slot(index)).value() }).collect()
}

fn drop_run(memory: &RawMemory<Probe>, len: usize) {
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(memory.slot(0), len)) };
}

#[test]
fn test_infallible_flags() {
    assert!(<MoveRelocation as Relocation<Probe>>::INFALLIBLE);
    assert!(!<CloneRelocation<Probe> as Relocation<Probe>>::INFALLIBLE);
}

// =============================================================================
// MoveRelocation
// =============================================================================

#[test]
fn test_move_relocation_never_constructs() {
    reset();
    let src = filled(&[1, 2, 3]);
    let dst = RawMemory::<Probe>::with_capacity(3);

    unsafe {
        MoveRelocation::relocate(src.as_ptr(), dst.slot(0), 3);
        MoveRelocation::retire(src.slot(0), 3);
    }

    assert_eq!(read_values(&dst, 3), [1, 2, 3]);
    assert_eq!(ledger().constructed, 3);
    assert_eq!(ledger().clones, 0);
    assert_eq!(ledger().dropped, 0);

    drop_run(&dst, 3);
    assert_no_leaks();
}

// =============================================================================
// CloneRelocation
// =============================================================================

#[test]
fn test_clone_relocation_keeps_sources_until_retire() {
    reset();
    let src = filled(&[1, 2, 3]);
    let dst = RawMemory::<Probe>::with_capacity(3);

    unsafe { CloneRelocation::<Probe>::relocate(src.as_ptr(), dst.slot(0), 3) };

    assert_eq!(ledger().clones, 3);
    assert_eq!(ledger().live(), 6);
    assert_eq!(read_values(&src, 3), [1, 2, 3]);
    assert_eq!(read_values(&dst, 3), [1, 2, 3]);

    unsafe { CloneRelocation::<Probe>::retire(src.slot(0), 3) };
    assert_eq!(ledger().live(), 3);

    drop_run(&dst, 3);
    assert_no_leaks();
}

#[test]
fn test_clone_relocation_rolls_back_on_panic() {
    reset();
    let src = filled(&[1, 2, 3]);
    let dst = RawMemory::<Probe>::with_capacity(3);

    change_behaviour(ProbeBehaviour::PanicAtClone(3));
    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        CloneRelocation::<Probe>::relocate(src.as_ptr(), dst.slot(0), 3);
    }));

    assert!(result.is_err());
    assert_eq!(ledger().clones, 2);
    assert_eq!(ledger().live(), 3);
    assert_eq!(read_values(&src, 3), [1, 2, 3]);

    drop_run(&src, 3);
    assert_no_leaks();
}
