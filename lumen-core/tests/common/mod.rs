// lumen-core - Common test utilities
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Shared helpers for the lumen-core integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

pub use lumen_core::{Error, Namespace, Symbol, Value, Var};

pub fn kw(name: &str) -> Value {
    Value::keyword(name)
}

pub fn sym(name: &str) -> Symbol {
    Symbol::parse(name)
}

pub fn int(n: i64) -> Value {
    Value::int(n)
}

pub fn ints(items: &[i64]) -> Value {
    Value::vector(items.iter().copied().map(Value::int))
}

/// Native `+` over integers.
pub fn add_fn() -> Value {
    Value::native_fn("+", |args| {
        let mut total = 0;
        for arg in args {
            match arg.as_int() {
                Some(n) => total += n,
                None => return Err(Error::type_error("integer", arg.type_name())),
            }
        }
        Ok(Value::int(total))
    })
}

/// A function that returns `value` whatever it is called with.
pub fn constantly(value: Value) -> Value {
    Value::native_fn("constantly", move |_| Ok(value.clone()))
}

/// Intern a dynamic var with a root value in a fresh namespace.
pub fn dynamic_var(ns: &str, name: &str, root: Value) -> Var {
    let ns = Namespace::new(Symbol::new(ns));
    ns.intern_dynamic(Symbol::new(name), root)
        .expect("intern dynamic var")
}
