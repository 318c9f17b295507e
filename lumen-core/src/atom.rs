// lumen-core - Atoms and volatiles
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Mutable reference cells.
//!
//! An [`Atom`] changes state only through compare-and-swap on an
//! `arc_swap::ArcSwap`. `swap` reads the current state, computes the next
//! one, and retries from the read if another writer got there first. There
//! is no bound on retries: under sustained contention a slow updater can
//! starve.
//!
//! A [`Volatile`] is a plain cell. Its reads and writes are individually
//! atomic, but [`Volatile::vswap`] is not: it is only correct with a single
//! writer.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use im::OrdMap;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::value::Value;

struct AtomInner {
    state: ArcSwap<Value>,
    validator: RwLock<Option<Value>>,
    watches: RwLock<OrdMap<Value, Value>>,
}

/// A lock-free shared reference.
#[derive(Clone)]
pub struct Atom {
    inner: Arc<AtomInner>,
}

impl Atom {
    pub fn new(value: Value) -> Self {
        Atom {
            inner: Arc::new(AtomInner {
                state: ArcSwap::from_pointee(value),
                validator: RwLock::new(None),
                watches: RwLock::new(OrdMap::new()),
            }),
        }
    }

    pub fn deref(&self) -> Value {
        (**self.inner.state.load()).clone()
    }

    fn validate(&self, candidate: &Value) -> Result<()> {
        let validator = self.inner.validator.read().clone();
        if let Some(f) = validator
            && !f.call(std::slice::from_ref(candidate))?.is_truthy()
        {
            return Err(Error::InvalidReferenceState);
        }
        Ok(())
    }

    fn notify_watches(&self, old: &Value, new: &Value) -> Result<()> {
        let watches = self.inner.watches.read().clone();
        if watches.is_empty() {
            return Ok(());
        }
        let this = Value::Atom(self.clone());
        for (key, f) in watches.iter() {
            f.call(&[key.clone(), this.clone(), old.clone(), new.clone()])?;
        }
        Ok(())
    }

    /// Apply `f` to the current state until the compare-and-swap lands.
    /// Returns `(old, new)`.
    pub fn swap_with<F>(&self, mut f: F) -> Result<(Value, Value)>
    where
        F: FnMut(&Value) -> Result<Value>,
    {
        loop {
            let current = self.inner.state.load_full();
            let candidate = f(&current)?;
            self.validate(&candidate)?;

            let next = Arc::new(candidate);
            let prev = self
                .inner
                .state
                .compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&prev, &current) {
                let old = (*current).clone();
                let new = (*next).clone();
                self.notify_watches(&old, &new)?;
                return Ok((old, new));
            }
            tracing::trace!("atom swap lost a race, retrying");
        }
    }

    /// `swap!`: state becomes `f(state, args...)`. Returns the new state.
    pub fn swap(&self, f: &Value, args: &[Value]) -> Result<Value> {
        self.swap_vals(f, args).map(|(_, new)| new)
    }

    /// Like [`Atom::swap`] but returns `(old, new)`.
    pub fn swap_vals(&self, f: &Value, args: &[Value]) -> Result<(Value, Value)> {
        self.swap_with(|current| {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(current.clone());
            call_args.extend_from_slice(args);
            f.call(&call_args)
        })
    }

    /// Set to `new` only if the state is identical to `expected`.
    ///
    /// Identity is judged on the value, not the cell holding it: a concurrent
    /// reset to an identical immediate still lets the exchange go through.
    pub fn compare_and_set(&self, expected: &Value, new: Value) -> Result<bool> {
        self.validate(&new)?;
        let next = Arc::new(new);
        loop {
            let current = self.inner.state.load_full();
            if !current.identical(expected) {
                return Ok(false);
            }
            let prev = self
                .inner
                .state
                .compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&prev, &current) {
                self.notify_watches(&current, &next)?;
                return Ok(true);
            }
            tracing::trace!("atom compare-and-set lost a race, retrying");
        }
    }

    /// Set unconditionally. Returns the new state.
    pub fn reset(&self, new: Value) -> Result<Value> {
        self.reset_vals(new).map(|(_, new)| new)
    }

    /// Set unconditionally, returning the state it replaced alongside it.
    pub fn reset_vals(&self, new: Value) -> Result<(Value, Value)> {
        self.validate(&new)?;
        let old = self.inner.state.swap(Arc::new(new.clone()));
        let old = (*old).clone();
        self.notify_watches(&old, &new)?;
        Ok((old, new))
    }

    /// Install or clear the validator. A new validator must accept the
    /// current state.
    pub fn set_validator(&self, validator: Option<Value>) -> Result<()> {
        if let Some(f) = &validator
            && !f.call(&[self.deref()])?.is_truthy()
        {
            return Err(Error::InvalidReferenceState);
        }
        *self.inner.validator.write() = validator;
        Ok(())
    }

    pub fn get_validator(&self) -> Option<Value> {
        self.inner.validator.read().clone()
    }

    /// Register `f`, called as `(f key atom old new)` after every change.
    pub fn add_watch(&self, key: Value, f: Value) {
        self.inner.watches.write().insert(key, f);
    }

    pub fn remove_watch(&self, key: &Value) {
        self.inner.watches.write().remove(key);
    }

    pub fn watches(&self) -> OrdMap<Value, Value> {
        self.inner.watches.read().clone()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Atom: {}>", self.deref())
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// An unsynchronized cell for single-writer state.
#[derive(Clone)]
pub struct Volatile {
    cell: Arc<ArcSwap<Value>>,
}

impl Volatile {
    pub fn new(value: Value) -> Self {
        Volatile {
            cell: Arc::new(ArcSwap::from_pointee(value)),
        }
    }

    pub fn deref(&self) -> Value {
        (**self.cell.load()).clone()
    }

    /// `vreset!`: store and return `value`.
    pub fn set(&self, value: Value) -> Value {
        self.cell.store(Arc::new(value.clone()));
        value
    }

    /// `vswap!`: read, apply, store. Not atomic as a whole.
    pub fn vswap(&self, f: &Value, args: &[Value]) -> Result<Value> {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(self.deref());
        call_args.extend_from_slice(args);
        let next = f.call(&call_args)?;
        Ok(self.set(next))
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.cell) as usize
    }
}

impl fmt::Display for Volatile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Volatile: {}>", self.deref())
    }
}

impl fmt::Debug for Volatile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Value {
    pub fn atom(value: Value) -> Value {
        Value::Atom(Atom::new(value))
    }

    pub fn volatile(value: Value) -> Value {
        Value::Volatile(Volatile::new(value))
    }
}
