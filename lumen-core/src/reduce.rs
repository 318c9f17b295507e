// lumen-core - Reduction with early termination
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! `reduce`, `reduced` and `reduced?`.
//!
//! A reducing function stops a reduction by returning a value wrapped with
//! [`Value::reduced`]. The wrapper is removed before the result is returned,
//! so it never escapes `reduce`.

use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

impl Value {
    /// Wrap `value` so a reduction stops with it.
    pub fn reduced(value: Value) -> Value {
        Value::Reduced(Arc::new(value))
    }

    pub fn is_reduced(&self) -> bool {
        matches!(self, Value::Reduced(_))
    }

    /// The wrapped value of a reduced value, anything else unchanged.
    pub fn unreduced(self) -> Value {
        match self {
            Value::Reduced(inner) => Arc::unwrap_or_clone(inner),
            other => other,
        }
    }

    /// Fold `f` over the elements of this seqable, starting from `init`.
    ///
    /// Maps reduce over `[k v]` entry vectors. Lazy seqs are realized only
    /// as far as the reduction reads.
    pub fn reduce(&self, f: &Value, init: Value) -> Result<Value> {
        reduce_iter(self.iter_seq(), f, init)
    }

    /// Fold without an initial value: `(f)` for an empty collection, the
    /// only element for a single one, otherwise starting from the first.
    pub fn reduce1(&self, f: &Value) -> Result<Value> {
        let mut items = self.iter_seq();
        match items.next() {
            None => f.call(&[]),
            Some(first) => reduce_iter(items, f, first?),
        }
    }
}

fn reduce_iter<I>(items: I, f: &Value, init: Value) -> Result<Value>
where
    I: Iterator<Item = Result<Value>>,
{
    let mut acc = init;
    for item in items {
        acc = f.call(&[acc, item?])?;
        if acc.is_reduced() {
            tracing::trace!("reduction stopped early");
            return Ok(acc.unreduced());
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn plus() -> Value {
        Value::native_fn("+", |args| {
            let mut total = 0;
            for arg in args {
                match arg {
                    Value::Integer(n) => total += n,
                    other => return Err(Error::type_error_in("+", "integer", other.type_name())),
                }
            }
            Ok(Value::int(total))
        })
    }

    #[test]
    fn test_reduce_with_init() {
        let v = Value::vector((1..=4).map(Value::int));
        assert_eq!(v.reduce(&plus(), Value::int(10)).unwrap(), Value::int(20));
        assert_eq!(Value::Nil.reduce(&plus(), Value::int(3)).unwrap(), Value::int(3));
    }

    #[test]
    fn test_reduce_without_init() {
        assert_eq!(Value::vector([]).reduce1(&plus()).unwrap(), Value::int(0));
        assert_eq!(
            Value::list([Value::int(7)]).reduce1(&plus()).unwrap(),
            Value::int(7)
        );
        assert_eq!(
            Value::list((1..=3).map(Value::int)).reduce1(&plus()).unwrap(),
            Value::int(6)
        );
    }

    #[test]
    fn test_reduced_stops_early() {
        let stop_at_three = Value::native_fn("stop", |args| match args {
            [_, Value::Integer(3)] => Ok(Value::reduced(Value::keyword("stopped"))),
            [_, item] => Ok(item.clone()),
            _ => Err(Error::arity(2, args.len())),
        });
        let v = Value::vector((1..=10).map(Value::int));
        assert_eq!(
            v.reduce(&stop_at_three, Value::Nil).unwrap(),
            Value::keyword("stopped")
        );
    }

    #[test]
    fn test_reduced_wrapper() {
        let r = Value::reduced(Value::int(1));
        assert!(r.is_reduced());
        assert!(!Value::int(1).is_reduced());
        assert_eq!(r.deref().unwrap(), Value::int(1));
        assert_eq!(format!("{}", r), "#<Reduced: 1>");
        assert_eq!(r.unreduced(), Value::int(1));
    }
}
