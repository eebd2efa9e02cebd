// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test utilities for Rampart crates.
//!
//! [`Probe`] is an element type that records every construction and drop in
//! a thread-local [`ProbeLedger`] and can be told to panic on its n-th
//! `default()`, `clone()`, or `clone_from()` through [`ProbeBehaviour`].
//! Each test runs on its own thread, so ledgers never leak between tests.
//!
//! ## License
//!
//! GPL-3.0-only

mod probe;

pub use probe::{
    Probe, ProbeBehaviour, ProbeLedger, assert_no_leaks, change_behaviour, ledger, reset, values,
};
