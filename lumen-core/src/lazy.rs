// lumen-core - Delays and lazy sequences
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Deferred computations realized at most once.
//!
//! Both [`Delay`] and [`LazySeq`] hold a thunk and a `OnceCell` for its
//! result. Concurrent forcers block on the cell, so the thunk runs once.
//! The thunk is dropped after a successful realization, releasing whatever
//! it captured; a failed realization keeps it so the next force retries.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::value::Value;

/// A zero-argument computation.
pub type Thunk = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

struct Realizer {
    thunk: Mutex<Option<Thunk>>,
    value: OnceCell<Value>,
}

impl Realizer {
    fn new(thunk: Thunk) -> Self {
        Realizer {
            thunk: Mutex::new(Some(thunk)),
            value: OnceCell::new(),
        }
    }

    fn realized(value: Value) -> Self {
        Realizer {
            thunk: Mutex::new(None),
            value: OnceCell::with_value(value),
        }
    }

    fn force_with<F>(&self, finish: F) -> Result<Value>
    where
        F: FnOnce(Value) -> Result<Value>,
    {
        self.value
            .get_or_try_init(|| {
                // Clone out so the lock is not held while the thunk runs
                let thunk = self.thunk.lock().clone();
                let thunk = thunk.ok_or_else(|| Error::eval("thunk already consumed"))?;
                let value = finish(thunk()?)?;
                self.thunk.lock().take();
                Ok(value)
            })
            .cloned()
    }

    fn is_realized(&self) -> bool {
        self.value.get().is_some()
    }

    fn cached(&self) -> Option<&Value> {
        self.value.get()
    }
}

/// A value computed on first [`Delay::force`] and cached after.
#[derive(Clone)]
pub struct Delay {
    inner: Arc<Realizer>,
}

impl Delay {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Delay {
            inner: Arc::new(Realizer::new(Arc::new(thunk))),
        }
    }

    pub fn force(&self) -> Result<Value> {
        self.inner.force_with(Ok)
    }

    pub fn is_realized(&self) -> bool {
        self.inner.is_realized()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.cached() {
            None => write!(f, "#<Delay: pending>"),
            Some(val) => write!(f, "#<Delay: {}>", val),
        }
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A sequence whose body runs on first access.
///
/// The body may return anything seqable, including another lazy seq; the
/// cached result is always nil or a realized seq. Building the rest of a
/// cons cell as another `LazySeq` gives unbounded sequences.
#[derive(Clone)]
pub struct LazySeq {
    inner: Arc<Realizer>,
}

impl LazySeq {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        LazySeq {
            inner: Arc::new(Realizer::new(Arc::new(body))),
        }
    }

    /// Wrap a function value as the body.
    pub fn from_fn(body: Value) -> Self {
        LazySeq::new(move || body.call(&[]))
    }

    /// A lazy seq that is already realized to `seq`.
    pub fn realized(seq: Value) -> Self {
        LazySeq {
            inner: Arc::new(Realizer::realized(seq)),
        }
    }

    /// Realize the body and return nil or a seq.
    pub fn seq(&self) -> Result<Value> {
        self.inner.force_with(|body| body.seq())
    }

    pub fn is_realized(&self) -> bool {
        self.inner.is_realized()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// The realized seq, when this handle is the last one and the body has
    /// run. Otherwise the handle is simply released.
    pub(crate) fn into_realized_if_unique(self) -> Option<Value> {
        Arc::try_unwrap(self.inner).ok()?.value.into_inner()
    }
}

impl fmt::Debug for LazySeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.cached() {
            None => write!(f, "#<LazySeq: pending>"),
            Some(seq) => write!(f, "{:?}", seq),
        }
    }
}

impl Value {
    pub fn lazy_seq<F>(body: F) -> Value
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Value::LazySeq(LazySeq::new(body))
    }

    pub fn delay<F>(thunk: F) -> Value
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Value::Delay(Delay::new(thunk))
    }

    /// Current value of a reference: vars, atoms, volatiles and delays.
    /// Dereferencing a reduced value unwraps it.
    pub fn deref(&self) -> Result<Value> {
        match self {
            Value::Reduced(inner) => Ok((**inner).clone()),
            Value::Var(var) => var.deref(),
            Value::Atom(atom) => Ok(atom.deref()),
            Value::Volatile(vol) => Ok(vol.deref()),
            Value::Delay(delay) => delay.force(),
            other => Err(Error::type_error_in("deref", "reference", other.type_name())),
        }
    }

    /// Whether a delay or lazy seq has run; other values are always realized.
    pub fn is_realized(&self) -> bool {
        match self {
            Value::Delay(d) => d.is_realized(),
            Value::LazySeq(ls) => ls.is_realized(),
            _ => true,
        }
    }
}
