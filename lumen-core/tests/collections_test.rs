// lumen-core - Collection integration tests
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Integration tests for persistent collections and sequences.
//!
//! Tests for: assoc, dissoc, conj, disj, peek, pop, seq, first, rest, cons,
//! lazy-seq, delay, equality across representations, meta, with-meta,
//! reset-meta!, reduce, reduced

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Error, Namespace, Value, add_fn, int, ints, kw, sym};
use lumen_core::set_print_length;

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_updates_leave_original_intact() {
    let map = Value::map([(kw(":a"), int(1))]);
    let grown = map.assoc(kw(":b"), int(2)).unwrap();
    let shrunk = grown.dissoc(&kw(":a")).unwrap();

    assert_eq!(map.count().unwrap(), 1);
    assert_eq!(grown.count().unwrap(), 2);
    assert_eq!(shrunk, Value::map([(kw(":b"), int(2))]));

    let v = ints(&[1, 2]);
    assert_eq!(v.conj(int(3)).unwrap(), ints(&[1, 2, 3]));
    assert_eq!(v, ints(&[1, 2]));
}

#[test]
fn test_sibling_array_maps_do_not_share_writes() {
    let base = Value::map([(kw(":a"), int(1))]);
    let left = base.assoc(kw(":b"), int(2)).unwrap();
    let right = base.assoc(kw(":c"), int(3)).unwrap();

    assert!(!left.contains_key(&kw(":c")));
    assert!(!right.contains_key(&kw(":b")));
    assert_eq!(base.count().unwrap(), 1);
}

#[test]
fn test_dissoc_missing_key_returns_same_map() {
    let map = Value::map([(kw(":a"), int(1))]);
    assert!(map.dissoc(&kw(":zzz")).unwrap().identical(&map));
}

// =============================================================================
// Equality across representations
// =============================================================================

#[test]
fn test_map_representations_compare_equal() {
    let pairs = || (0..5).map(|i| (int(i), kw(":v")));
    let array = Value::map(pairs());
    let hashed = Value::hash_map(pairs());
    let sorted = Value::sorted_map(pairs());

    assert_eq!(array, hashed);
    assert_eq!(hashed, sorted);
    assert_eq!(array.to_hash(), hashed.to_hash());
    assert_eq!(hashed.to_hash(), sorted.to_hash());
}

#[test]
fn test_sequential_equality() {
    assert_eq!(Value::list([int(1), int(2)]), ints(&[1, 2]));
    assert_eq!(
        Value::cons(int(1), Value::list([int(2)])),
        ints(&[1, 2])
    );
    assert_ne!(ints(&[1, 2]), ints(&[2, 1]));
    assert_ne!(ints(&[1, 2]), Value::hash_set([int(1), int(2)]));
}

#[test]
fn test_collections_as_keys() {
    let key = ints(&[1, 2]);
    let map = Value::hash_map([(key, kw(":found"))]);
    assert_eq!(map.get(&Value::list([int(1), int(2)])), kw(":found"));
}

// =============================================================================
// Stack and set operations
// =============================================================================

#[test]
fn test_peek_and_pop() {
    let list = Value::list([int(1), int(2), int(3)]);
    assert_eq!(list.peek().unwrap(), int(1));
    assert_eq!(list.pop().unwrap(), Value::list([int(2), int(3)]));

    let vector = ints(&[1, 2, 3]);
    assert_eq!(vector.peek().unwrap(), int(3));
    assert_eq!(vector.pop().unwrap(), ints(&[1, 2]));

    assert!(Value::vector([]).pop().is_err());
}

#[test]
fn test_set_operations() {
    let set = Value::hash_set([kw(":a")]);
    let more = set.conj(kw(":b")).unwrap();
    assert!(more.contains_key(&kw(":b")));
    assert_eq!(more.disj(&kw(":a")).unwrap(), Value::hash_set([kw(":b")]));
    assert_eq!(set.get(&kw(":a")), kw(":a"));
    assert_eq!(set.get(&kw(":z")), Value::Nil);
}

#[test]
fn test_nth_bounds() {
    let v = ints(&[5, 6]);
    assert_eq!(v.nth(1).unwrap(), int(6));
    assert!(matches!(
        v.nth(2).unwrap_err(),
        Error::IndexOutOfBounds { index: 2, length: 2 }
    ));
}

// =============================================================================
// Sequences
// =============================================================================

#[test]
fn test_seq_of_empty_is_nil() {
    assert!(Value::vector([]).seq().unwrap().is_nil());
    assert!(Value::map([]).seq().unwrap().is_nil());
    assert!(Value::Nil.seq().unwrap().is_nil());
    assert!(int(1).seq().is_err());
}

#[test]
fn test_map_seq_yields_entries() {
    let map = Value::map([(kw(":a"), int(1))]);
    assert_eq!(map.first().unwrap(), Value::vector([kw(":a"), int(1)]));
    assert!(map.next().unwrap().is_nil());
}

fn naturals(from: i64) -> Value {
    Value::lazy_seq(move || Ok(Value::cons(int(from), naturals(from + 1))))
}

#[test]
fn test_unbounded_lazy_seq() {
    let nats = naturals(0);
    assert_eq!(nats.nth(100).unwrap(), int(100));

    let first_five: Vec<_> = nats.iter_seq().take(5).map(|r| r.unwrap()).collect();
    assert_eq!(first_five, vec![int(0), int(1), int(2), int(3), int(4)]);
}

#[test]
fn test_lazy_seq_realizes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let lazy = Value::lazy_seq(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ints(&[1, 2, 3]))
    });

    assert!(!lazy.is_realized());
    assert_eq!(lazy.count().unwrap(), 3);
    assert_eq!(lazy.first().unwrap(), int(1));
    assert_eq!(lazy, ints(&[1, 2, 3]));
    assert!(lazy.is_realized());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lazy_seq_error_propagates() {
    let lazy = Value::lazy_seq(|| Err(Error::eval("no data")));
    assert!(lazy.seq().is_err());
    assert!(!lazy.is_realized());

    let chained = Value::cons(int(1), lazy);
    let items: Vec<_> = chained.iter_seq().collect();
    assert_eq!(items.len(), 2);
    assert!(items[1].is_err());
}

#[test]
fn test_dropping_long_realized_seq() {
    let nats = naturals(0);
    assert_eq!(nats.nth(200_000).unwrap(), int(200_000));
    drop(nats);
}

#[test]
fn test_dropping_long_cons_chain() {
    let mut chain = Value::Nil;
    for i in 0..200_000 {
        chain = Value::cons(int(i), chain);
    }
    assert_eq!(chain.first().unwrap(), int(199_999));
    drop(chain);
}

#[test]
fn test_retained_tail_outlives_head() {
    let nats = naturals(0);
    assert_eq!(nats.nth(1_000).unwrap(), int(1_000));

    let mut tail = nats.clone();
    for _ in 0..500 {
        tail = tail.next().unwrap();
    }
    drop(nats);

    assert_eq!(tail.first().unwrap(), int(500));
    assert_eq!(tail.nth(500).unwrap(), int(1_000));
}

#[test]
fn test_print_length_truncates_lazy_seq() {
    let previous = set_print_length(Some(3));
    let printed = format!("{}", naturals(1));
    set_print_length(previous);
    assert_eq!(printed, "(1 2 3 ...)");
}

// =============================================================================
// Delays
// =============================================================================

#[test]
fn test_delay_runs_once_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let delay = Value::delay(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(kw(":computed"))
    });

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let delay = delay.clone();
            std::thread::spawn(move || delay.deref().unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), kw(":computed"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(delay.is_realized());
    assert_eq!(format!("{}", delay), "#<Delay: :computed>");
}

#[test]
fn test_failed_delay_retries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let delay = Value::delay(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Error::eval("first attempt fails"))
        } else {
            Ok(int(7))
        }
    });

    assert!(delay.deref().is_err());
    assert!(!delay.is_realized());
    assert_eq!(delay.deref().unwrap(), int(7));
}

// =============================================================================
// Metadata
// =============================================================================

fn source_meta() -> Value {
    Value::map([(kw(":source"), kw(":test"))])
}

#[test]
fn test_metadata_ignored_by_equality_and_hashing() {
    let plain = ints(&[1, 2]);
    let tagged = plain.with_meta(source_meta()).unwrap();

    assert_eq!(tagged, plain);
    assert_eq!(tagged.to_hash(), plain.to_hash());
    assert!(!tagged.identical(&plain));
    assert_eq!(tagged.meta(), source_meta());
    assert!(plain.meta().is_nil());
}

#[test]
fn test_metadata_survives_updates() {
    let map = Value::map([(kw(":a"), int(1))])
        .with_meta(source_meta())
        .unwrap();
    assert_eq!(map.assoc(kw(":b"), int(2)).unwrap().meta(), source_meta());
    assert_eq!(map.dissoc(&kw(":a")).unwrap().meta(), source_meta());
    assert_eq!(
        map.conj(Value::vector([kw(":c"), int(3)])).unwrap().meta(),
        source_meta()
    );
    assert_eq!(map.empty().meta(), source_meta());

    // Promotion to a hash map keeps it too.
    let big = (0..10)
        .try_fold(map.clone(), |m, i| m.assoc(int(i), int(i)))
        .unwrap();
    assert!(matches!(big, Value::HashMap(..)));
    assert_eq!(big.meta(), source_meta());

    let set = Value::hash_set([int(1)]).with_meta(source_meta()).unwrap();
    assert_eq!(set.conj(int(2)).unwrap().meta(), source_meta());
    assert_eq!(set.disj(&int(1)).unwrap().meta(), source_meta());

    let list = Value::list([int(1), int(2)])
        .with_meta(source_meta())
        .unwrap();
    assert_eq!(list.pop().unwrap().meta(), source_meta());
    assert!(list.rest().unwrap().meta().is_nil());
}

#[test]
fn test_with_meta_validates_arguments() {
    assert!(ints(&[1]).with_meta(int(1)).is_err());
    assert!(int(1).with_meta(Value::map([])).is_err());
    assert!(kw(":k").with_meta(Value::map([])).is_err());

    let cleared = ints(&[1])
        .with_meta(source_meta())
        .unwrap()
        .with_meta(Value::Nil)
        .unwrap();
    assert!(cleared.meta().is_nil());
}

#[test]
fn test_symbol_metadata() {
    let tagged = Value::symbol("x")
        .with_meta(Value::map([(kw(":line"), int(3))]))
        .unwrap();
    assert_eq!(tagged, Value::symbol("x"));
    assert_eq!(tagged.meta().get(&kw(":line")), int(3));
}

#[test]
fn test_reset_meta_on_var() {
    let ns = Namespace::new(sym("app"));
    let var = Value::Var(ns.intern(sym("secret")).unwrap());
    let private = Value::map([(kw(":private"), Value::bool(true))]);

    assert_eq!(var.reset_meta(private.clone()).unwrap(), private);
    assert_eq!(var.meta(), private);
    assert!(!ns.publics().contains_key(&sym("secret")));

    assert!(var.reset_meta(int(1)).is_err());
    assert!(ints(&[1]).reset_meta(Value::map([])).is_err());
}

// =============================================================================
// Reduction
// =============================================================================

#[test]
fn test_reduce_sums() {
    assert_eq!(ints(&[1, 2, 3]).reduce(&add_fn(), int(0)).unwrap(), int(6));
    assert_eq!(ints(&[1, 2, 3]).reduce1(&add_fn()).unwrap(), int(6));
    assert_eq!(Value::Nil.reduce1(&add_fn()).unwrap(), int(0));
}

#[test]
fn test_reduced_stops_unbounded_reduction() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sum_past_ten = Value::native_fn("sum-past-ten", move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let total = args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0);
        if total > 10 {
            Ok(Value::reduced(int(total)))
        } else {
            Ok(int(total))
        }
    });

    let result = naturals(1).reduce(&sum_past_ten, int(0)).unwrap();
    assert_eq!(result, int(15));
    assert!(!result.is_reduced());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_reduce_over_map_entries() {
    let map = Value::map([(kw(":a"), int(1)), (kw(":b"), int(2))]);
    let sum_vals = Value::native_fn("sum-vals", |args| {
        let val = args[1].nth(1)?;
        Ok(int(args[0].as_int().unwrap_or(0) + val.as_int().unwrap_or(0)))
    });
    assert_eq!(map.reduce(&sum_vals, int(0)).unwrap(), int(3));
}

#[test]
fn test_reduce_propagates_errors() {
    let mixed = Value::vector([int(1), kw(":two")]);
    assert!(mixed.reduce(&add_fn(), int(0)).is_err());
    assert!(int(5).reduce(&add_fn(), int(0)).is_err());
}
