// lumen-core - Native functions and the call protocol
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Callable values.
//!
//! The runtime core never evaluates code itself; it receives functions that
//! the surrounding compiler built and calls them with argument slices.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::Value;

/// Signature of every native function.
pub type NativeFnPtr = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A named native (Rust) function.
#[derive(Clone)]
pub struct NativeFn {
    name: Arc<str>,
    func: Arc<NativeFnPtr>,
}

impl NativeFn {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        NativeFn {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.func).cast::<()>() as usize
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<fn {}>", self.name)
    }
}

impl fmt::Display for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<fn {}>", self.name)
    }
}

impl Value {
    /// Wrap a Rust closure as a function value.
    pub fn native_fn<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(NativeFn::new(name, func))
    }

    /// Invoke this value as a function.
    ///
    /// Functions and multimethods are called directly, vars call their
    /// current value, keywords look themselves up in their first argument,
    /// and maps and sets look up their argument.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(nf) => nf.call(args),
            Value::Multimethod(mm) => mm.invoke(args),
            Value::Var(var) => var.deref()?.call(args),
            Value::Keyword(_) => match args {
                [coll] => Ok(coll.get(self)),
                [coll, default] => Ok(coll.get_or(self, default.clone())),
                _ => Err(Error::arity_named(self.to_string(), 1, args.len())),
            },
            Value::ArrayMap(..) | Value::HashMap(..) | Value::SortedMap(..) => match args {
                [key] => Ok(self.get(key)),
                [key, default] => Ok(self.get_or(key, default.clone())),
                _ => Err(Error::arity_named("map lookup", 1, args.len())),
            },
            Value::HashSet(..) | Value::SortedSet(..) => match args {
                [key] => Ok(self.get(key)),
                _ => Err(Error::arity_named("set lookup", 1, args.len())),
            },
            _ => Err(Error::NotCallable(self.to_string())),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::Multimethod(_)
                | Value::Var(_)
                | Value::Keyword(_)
                | Value::ArrayMap(..)
                | Value::HashMap(..)
                | Value::SortedMap(..)
                | Value::HashSet(..)
                | Value::SortedSet(..)
        )
    }
}
