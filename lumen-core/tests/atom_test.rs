// lumen-core - Atom integration tests
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Integration tests for atoms and volatiles.
//!
//! Tests for: swap!, swap-vals!, reset!, reset-vals!, compare-and-set!,
//! validators, watches, vswap!, vreset!

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{Error, Value, add_fn, int, ints, kw};
use lumen_core::{Atom, Volatile};

// =============================================================================
// Concurrent swaps
// =============================================================================

#[test]
fn test_concurrent_swaps_lose_no_updates() {
    let atom = Atom::new(int(0));
    let add = add_fn();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let atom = atom.clone();
            let add = add.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    atom.swap(&add, &[int(1)]).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(atom.deref(), int(4000));
}

#[test]
fn test_contended_swap_reruns_function() {
    let atom = Atom::new(int(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let atom = atom.clone();
            let calls = Arc::clone(&calls);
            thread::spawn(move || {
                for _ in 0..250 {
                    atom.swap_with(|current| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(int(current.as_int().unwrap_or(0) + 1))
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(atom.deref(), int(1000));
    assert!(calls.load(Ordering::SeqCst) >= 1000);
}

// =============================================================================
// swap-vals! / reset-vals!
// =============================================================================

#[test]
fn test_swap_vals_returns_old_and_new() {
    let atom = Atom::new(int(10));
    let (old, new) = atom.swap_vals(&add_fn(), &[int(5)]).unwrap();
    assert_eq!(old, int(10));
    assert_eq!(new, int(15));
}

#[test]
fn test_reset_vals_returns_old_and_new() {
    let atom = Atom::new(kw(":before"));
    let (old, new) = atom.reset_vals(kw(":after")).unwrap();
    assert_eq!(old, kw(":before"));
    assert_eq!(new, kw(":after"));
    assert_eq!(atom.deref(), kw(":after"));
}

#[test]
fn test_swap_propagates_function_error() {
    let atom = Atom::new(kw(":not-a-number"));
    assert!(atom.swap(&add_fn(), &[int(1)]).is_err());
    assert_eq!(atom.deref(), kw(":not-a-number"));
}

// =============================================================================
// compare-and-set!
// =============================================================================

#[test]
fn test_compare_and_set_uses_identity() {
    let original = ints(&[1, 2, 3]);
    let atom = Atom::new(original.clone());

    // Equal but not identical: no swap.
    assert!(!atom.compare_and_set(&ints(&[1, 2, 3]), int(0)).unwrap());
    assert_eq!(atom.deref(), original);

    assert!(atom.compare_and_set(&original, int(0)).unwrap());
    assert_eq!(atom.deref(), int(0));
}

#[test]
fn test_compare_and_set_immediates() {
    let atom = Atom::new(int(1));
    assert!(atom.compare_and_set(&int(1), int(2)).unwrap());
    assert!(!atom.compare_and_set(&int(1), int(3)).unwrap());
    assert_eq!(atom.deref(), int(2));
}

#[test]
fn test_compare_and_set_after_identical_reset() {
    let atom = Atom::new(int(2));
    atom.reset(int(2)).unwrap();
    assert!(atom.compare_and_set(&int(2), int(3)).unwrap());
    assert_eq!(atom.deref(), int(3));
}

#[test]
fn test_compare_and_set_under_concurrent_identical_resets() {
    let atom = Atom::new(int(2));
    let resetter = {
        let atom = atom.clone();
        thread::spawn(move || {
            for _ in 0..10_000 {
                atom.reset(int(2)).unwrap();
            }
        })
    };

    // The state is always 2, so every exchange must succeed.
    let succeeded = (0..1_000)
        .filter(|_| atom.compare_and_set(&int(2), int(2)).unwrap())
        .count();
    resetter.join().unwrap();

    assert_eq!(succeeded, 1_000);
    assert_eq!(atom.deref(), int(2));
}

// =============================================================================
// Validators
// =============================================================================

fn positive() -> Value {
    Value::native_fn("pos?", |args| {
        Ok(Value::bool(args[0].as_int().is_some_and(|n| n > 0)))
    })
}

#[test]
fn test_validator_rejects_swap() {
    let atom = Atom::new(int(1));
    atom.set_validator(Some(positive())).unwrap();

    let err = atom.swap(&add_fn(), &[int(-5)]).unwrap_err();
    assert!(matches!(err, Error::InvalidReferenceState));
    assert_eq!(atom.deref(), int(1));

    assert_eq!(atom.swap(&add_fn(), &[int(2)]).unwrap(), int(3));
}

#[test]
fn test_validator_rejects_reset_and_cas() {
    let atom = Atom::new(int(1));
    atom.set_validator(Some(positive())).unwrap();

    assert!(atom.reset(int(0)).is_err());
    assert!(atom.compare_and_set(&int(1), int(-1)).is_err());
    assert_eq!(atom.deref(), int(1));
}

#[test]
fn test_validator_must_accept_current_state() {
    let atom = Atom::new(int(-1));
    assert!(atom.set_validator(Some(positive())).is_err());
    assert!(atom.get_validator().is_none());
}

#[test]
fn test_clearing_validator() {
    let atom = Atom::new(int(1));
    atom.set_validator(Some(positive())).unwrap();
    atom.set_validator(None).unwrap();
    assert_eq!(atom.reset(int(-7)).unwrap(), int(-7));
}

// =============================================================================
// Watches
// =============================================================================

#[test]
fn test_watch_sees_old_and_new() {
    let atom = Atom::new(int(1));
    let log = Atom::new(Value::vector([]));

    let log_ref = log.clone();
    let watch = Value::native_fn("watch", move |args| {
        let entry = Value::vector([args[0].clone(), args[2].clone(), args[3].clone()]);
        log_ref.swap_with(|current| current.conj(entry.clone()))?;
        Ok(Value::Nil)
    });

    atom.add_watch(kw(":log"), watch);
    atom.reset(int(2)).unwrap();
    atom.swap(&add_fn(), &[int(3)]).unwrap();

    let expected = Value::vector([
        Value::vector([kw(":log"), int(1), int(2)]),
        Value::vector([kw(":log"), int(2), int(5)]),
    ]);
    assert_eq!(log.deref(), expected);
}

#[test]
fn test_remove_watch() {
    let atom = Atom::new(int(0));
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&fired);
    atom.add_watch(
        kw(":count"),
        Value::native_fn("watch", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Nil)
        }),
    );

    atom.reset(int(1)).unwrap();
    atom.remove_watch(&kw(":count"));
    atom.reset(int(2)).unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(atom.watches().is_empty());
}

// =============================================================================
// Atoms as values
// =============================================================================

#[test]
fn test_atom_identity_equality() {
    let a = Value::atom(int(1));
    let b = Value::atom(int(1));
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_eq!(a.deref().unwrap(), int(1));
}

// =============================================================================
// Volatiles
// =============================================================================

#[test]
fn test_volatile_set_and_vswap() {
    let vol = Volatile::new(int(1));
    assert_eq!(vol.set(int(10)), int(10));
    assert_eq!(vol.vswap(&add_fn(), &[int(5)]).unwrap(), int(15));
    assert_eq!(vol.deref(), int(15));
}

#[test]
fn test_volatile_deref_through_value() {
    let vol = Value::volatile(kw(":x"));
    assert_eq!(vol.deref().unwrap(), kw(":x"));
    assert_eq!(format!("{}", vol), "#<Volatile: :x>");
}
