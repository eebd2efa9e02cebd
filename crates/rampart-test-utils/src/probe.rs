// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Instrumented element type for lifetime and panic-safety tests.

use std::cell::Cell;

/// Failure injection for [`Probe`].
///
/// `PanicAtClone(n)` makes the n-th `clone()` from now panic (1-based), and
/// likewise for the other variants. Unlike most behaviours in this workspace
/// it is one-shot: it resets to `None` once it fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeBehaviour {
    /// Normal behaviour - no injected panics.
    #[default]
    None,
    /// The n-th `Probe::clone()` panics.
    PanicAtClone(usize),
    /// The n-th `Probe::default()` panics.
    PanicAtDefault(usize),
    /// The n-th `Probe::clone_from()` panics.
    PanicAtCloneFrom(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Clone,
    Default,
    CloneFrom,
}

impl ProbeBehaviour {
    fn armed(self) -> Option<(Operation, usize)> {
        match self {
            Self::None => None,
            Self::PanicAtClone(n) => Some((Operation::Clone, n)),
            Self::PanicAtDefault(n) => Some((Operation::Default, n)),
            Self::PanicAtCloneFrom(n) => Some((Operation::CloneFrom, n)),
        }
    }

    fn rearmed(operation: Operation, n: usize) -> Self {
        match operation {
            Operation::Clone => Self::PanicAtClone(n),
            Operation::Default => Self::PanicAtDefault(n),
            Operation::CloneFrom => Self::PanicAtCloneFrom(n),
        }
    }
}

/// Per-thread counters of `Probe` lifetimes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeLedger {
    /// Probes created by `new`, `default`, or `clone`.
    pub constructed: usize,
    /// Probes dropped.
    pub dropped: usize,
    /// Successful `clone()` calls.
    pub clones: usize,
    /// Successful `default()` calls.
    pub defaults: usize,
    /// Successful `clone_from()` calls.
    pub clone_froms: usize,
}

impl ProbeLedger {
    const EMPTY: Self = Self {
        constructed: 0,
        dropped: 0,
        clones: 0,
        defaults: 0,
        clone_froms: 0,
    };

    /// Probes currently alive.
    pub fn live(&self) -> usize {
        self.constructed - self.dropped
    }
}

thread_local! {
    static LEDGER: Cell<ProbeLedger> = const { Cell::new(ProbeLedger::EMPTY) };
    static BEHAVIOUR: Cell<ProbeBehaviour> = const { Cell::new(ProbeBehaviour::None) };
}

fn record(update: impl FnOnce(&mut ProbeLedger)) {
    LEDGER.with(|cell| {
        let mut ledger = cell.get();
        update(&mut ledger);
        cell.set(ledger);
    });
}

fn trips(operation: Operation) -> bool {
    BEHAVIOUR.with(|cell| {
        let Some((armed, remaining)) = cell.get().armed() else {
            return false;
        };

        if armed != operation {
            return false;
        }

        if remaining <= 1 {
            cell.set(ProbeBehaviour::None);
            return true;
        }

        cell.set(ProbeBehaviour::rearmed(armed, remaining - 1));
        false
    })
}

/// Returns a snapshot of this thread's ledger.
pub fn ledger() -> ProbeLedger {
    LEDGER.with(Cell::get)
}

/// Changes the failure injection behaviour for this thread.
pub fn change_behaviour(behaviour: ProbeBehaviour) {
    BEHAVIOUR.with(|cell| cell.set(behaviour));
}

/// Clears this thread's ledger and behaviour.
pub fn reset() {
    LEDGER.with(|cell| cell.set(ProbeLedger::EMPTY));
    change_behaviour(ProbeBehaviour::None);
}

/// Asserts that every probe constructed on this thread has been dropped exactly once.
///
/// # Panics
///
/// Panics with the ledger contents if a probe is still alive.
pub fn assert_no_leaks() {
    let ledger = ledger();
    assert_eq!(ledger.live(), 0, "probes still alive: {ledger:?}");
}

/// Collects the values of a run of probes.
pub fn values(probes: &[Probe]) -> Vec<i64> {
    probes.iter().map(Probe::value).collect()
}

/// An element that records its lifetime and can be made to panic.
///
/// # Example
///
/// ```
/// use rampart_test_utils::{Probe, ProbeBehaviour, change_behaviour, ledger};
///
/// let a = Probe::new(7);
/// change_behaviour(ProbeBehaviour::PanicAtClone(1));
///
/// let result = std::panic::catch_unwind(|| a.clone());
/// assert!(result.is_err());
///
/// drop(a);
/// assert_eq!(ledger().live(), 0);
/// ```
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Probe {
    value: i64,
}

impl Probe {
    /// Creates a probe carrying `value`.
    pub fn new(value: i64) -> Self {
        record(|ledger| ledger.constructed += 1);
        Self { value }
    }

    /// The carried value.
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Default for Probe {
    fn default() -> Self {
        if trips(Operation::Default) {
            panic!("Probe::default() failure injected");
        }

        record(|ledger| {
            ledger.constructed += 1;
            ledger.defaults += 1;
        });
        Self { value: 0 }
    }
}

impl Clone for Probe {
    fn clone(&self) -> Self {
        if trips(Operation::Clone) {
            panic!("Probe::clone() failure injected");
        }

        record(|ledger| {
            ledger.constructed += 1;
            ledger.clones += 1;
        });
        Self { value: self.value }
    }

    fn clone_from(&mut self, source: &Self) {
        if trips(Operation::CloneFrom) {
            panic!("Probe::clone_from() failure injected");
        }

        record(|ledger| ledger.clone_froms += 1);
        self.value = source.value;
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        record(|ledger| ledger.dropped += 1);
    }
}
