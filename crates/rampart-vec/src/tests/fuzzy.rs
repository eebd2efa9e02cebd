// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use proptest::prelude::*;
use rampart_test_utils::{Probe, ProbeBehaviour, assert_no_leaks, change_behaviour, reset, values};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{CloneRelocation, Vector};

#[derive(Debug, Clone)]
enum Op {
    PushBack(i32),
    PopBack,
    Insert(usize, i32),
    Erase(usize),
    Reserve(usize),
    Resize(usize),
    Truncate(usize),
    CloneFrom(Vec<i32>),
    Take,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::PushBack),
        1 => Just(Op::PopBack),
        3 => (any::<usize>(), any::<i32>()).prop_map(|(index, value)| Op::Insert(index, value)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => (0..64usize).prop_map(Op::Reserve),
        1 => (0..32usize).prop_map(Op::Resize),
        1 => (0..32usize).prop_map(Op::Truncate),
        1 => prop::collection::vec(any::<i32>(), 0..16).prop_map(Op::CloneFrom),
        1 => Just(Op::Take),
    ]
}

fn apply(vec: &mut Vector<i32>, model: &mut Vec<i32>, op: Op) {
    match op {
        Op::PushBack(value) => {
            vec.push_back(value);
            model.push(value);
        }
        Op::PopBack => {
            vec.pop_back();
            model.pop();
        }
        Op::Insert(index, value) => {
            let index = index % (model.len() + 1);
            vec.insert(index, value);
            model.insert(index, value);
        }
        Op::Erase(index) => {
            if !model.is_empty() {
                let index = index % model.len();
                vec.erase(index);
                model.remove(index);
            }
        }
        Op::Reserve(capacity) => {
            vec.reserve(capacity);
            assert!(vec.capacity() >= capacity);
        }
        Op::Resize(len) => {
            vec.resize(len);
            model.resize(len, 0);
        }
        Op::Truncate(len) => {
            vec.truncate(len);
            model.truncate(len);
        }
        Op::CloneFrom(source) => {
            let source: Vector<i32> = source.iter().copied().collect();
            vec.clone_from(&source);
            *model = source.to_vec();
        }
        Op::Take => {
            let taken = vec.take();
            assert_eq!(taken.as_slice(), model.as_slice());
            assert_eq!(vec.capacity(), 0);
            model.clear();
        }
    }
}

proptest! {
    #[test]
    fn fuzzy_matches_std_vec(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut vec = Vector::new();
        let mut model = Vec::new();

        for op in ops {
            apply(&mut vec, &mut model, op);

            prop_assert_eq!(vec.as_slice(), model.as_slice());
            prop_assert!(vec.len() <= vec.capacity());
        }
    }

    #[test]
    fn fuzzy_push_back_capacity_is_power_of_two(quantity in 0..=300usize) {
        let mut vec = Vector::new();

        for value in 0..quantity {
            vec.push_back(value);
        }

        let expected = if quantity == 0 { 0 } else { quantity.next_power_of_two() };
        prop_assert_eq!(vec.capacity(), expected);
    }

    #[test]
    fn fuzzy_failed_growth_is_unchanged(
        len in 1..=16usize,
        index in any::<usize>(),
        k in 1..=16usize
    ) {
        reset();
        let mut vec = Vector::<Probe, CloneRelocation<Probe>>::with_policy();
        vec.reserve(len);
        vec.extend((0..len as i64).map(Probe::new));

        let before = values(&vec);
        let buffer = vec.as_ptr();
        let index = index % (len + 1);

        change_behaviour(ProbeBehaviour::PanicAtClone(k.min(len)));
        let result = catch_unwind(AssertUnwindSafe(|| vec.insert(index, Probe::new(-1))));

        prop_assert!(result.is_err());
        prop_assert_eq!(values(&vec), before);
        prop_assert_eq!(vec.as_ptr(), buffer);
        prop_assert_eq!(vec.capacity(), len);

        drop(vec);
        assert_no_leaks();
    }
}
