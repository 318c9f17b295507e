// lumen-core - The sequence abstraction
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! `first`/`rest`/`next` over every collection.
//!
//! `seq` turns any seqable value into either nil (empty) or a value whose
//! first element is directly available: a non-empty list, a cons cell, or a
//! realized lazy seq. Vectors become lists sharing the same `im` tree, maps
//! yield `[k v]` vectors and strings yield characters.

use std::fmt;
use std::sync::Arc;

use im::Vector;

use crate::error::{Error, Result};
use crate::value::Value;

/// A cell prepending `first` to any seqable `rest`.
pub struct Cons {
    first: Value,
    rest: Value,
}

impl Cons {
    pub fn first(&self) -> &Value {
        &self.first
    }

    pub fn rest(&self) -> &Value {
        &self.rest
    }
}

// Dropping the head of a long realized chain would otherwise recurse once
// per cell. Cells and realized lazy seqs nobody else holds are unlinked in a
// loop; the walk stops at the first shared link.
impl Drop for Cons {
    fn drop(&mut self) {
        let mut next = std::mem::replace(&mut self.rest, Value::Nil);
        loop {
            next = match next {
                Value::Cons(cell) => match Arc::try_unwrap(cell) {
                    Ok(mut cell) => std::mem::replace(&mut cell.rest, Value::Nil),
                    Err(_) => break,
                },
                Value::LazySeq(ls) => match ls.into_realized_if_unique() {
                    Some(seq) => seq,
                    None => break,
                },
                _ => break,
            };
        }
    }
}

impl fmt::Debug for Cons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?} . {:?})", self.first, self.rest)
    }
}

fn entry_vector(k: &Value, v: &Value) -> Value {
    Value::vector([k.clone(), v.clone()])
}

fn non_empty_list(items: Vector<Value>) -> Value {
    if items.is_empty() {
        Value::Nil
    } else {
        Value::List(Arc::new(items), None)
    }
}

impl Value {
    /// Prepend `first` to `rest` without realizing `rest`.
    pub fn cons(first: Value, rest: Value) -> Value {
        Value::Cons(Arc::new(Cons { first, rest }))
    }

    /// Nil for empty collections, otherwise a seq over the elements.
    pub fn seq(&self) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::Nil),
            Value::List(items, _) if items.is_empty() => Ok(Value::Nil),
            Value::List(..) | Value::Cons(_) => Ok(self.clone()),
            Value::Vector(items, _) => Ok(non_empty_list((**items).clone())),
            Value::String(s) => Ok(non_empty_list(s.chars().map(Value::Char).collect())),
            Value::LazySeq(ls) => ls.seq(),
            _ => {
                if let Some(map) = self.as_map() {
                    return Ok(non_empty_list(
                        map.iter().map(|(k, v)| entry_vector(k, v)).collect(),
                    ));
                }
                if let Some(set) = self.as_set() {
                    return Ok(non_empty_list(set.iter().cloned().collect()));
                }
                Err(Error::type_error_in("seq", "seqable", self.type_name()))
            }
        }
    }

    /// First element, or nil when empty.
    pub fn first(&self) -> Result<Value> {
        match self.seq()? {
            Value::List(items, _) => Ok(items.front().cloned().unwrap_or(Value::Nil)),
            Value::Cons(cell) => Ok(cell.first.clone()),
            _ => Ok(Value::Nil),
        }
    }

    /// Everything after the first element; the empty list when nothing is
    /// left. The rest of a cons cell is returned unrealized.
    pub fn rest(&self) -> Result<Value> {
        match self.seq()? {
            Value::List(items, _) => Ok(Value::List(Arc::new(items.skip(1)), None)),
            Value::Cons(cell) => match &cell.rest {
                Value::Nil => Ok(Value::List(Arc::default(), None)),
                rest => Ok(rest.clone()),
            },
            _ => Ok(Value::List(Arc::default(), None)),
        }
    }

    /// `seq` of `rest`: nil when nothing is left.
    pub fn next(&self) -> Result<Value> {
        self.rest()?.seq()
    }

    /// Iterate the elements of any seqable value, realizing lazily.
    pub fn iter_seq(&self) -> SeqIter {
        SeqIter {
            state: IterState::Pending(self.clone()),
        }
    }

    /// Realize every element into a `Vec`.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        self.iter_seq().collect()
    }
}

enum IterState {
    /// Not yet turned into a seq
    Pending(Value),
    /// Walking an indexed list
    Indexed(Arc<Vector<Value>>, usize),
    Done,
}

/// Iterator over a seqable value.
///
/// Yields `Err` once and then stops if realizing a lazy seq fails.
pub struct SeqIter {
    state: IterState,
}

impl Iterator for SeqIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, IterState::Done) {
                IterState::Done => return None,
                IterState::Indexed(items, idx) => {
                    let item = items.get(idx).cloned()?;
                    self.state = IterState::Indexed(items, idx + 1);
                    return Some(Ok(item));
                }
                IterState::Pending(value) => match value {
                    Value::List(items, _) | Value::Vector(items, _) => {
                        self.state = IterState::Indexed(items, 0);
                    }
                    other => match other.seq() {
                        Err(err) => return Some(Err(err)),
                        Ok(Value::Nil) => return None,
                        Ok(Value::Cons(cell)) => {
                            self.state = IterState::Pending(cell.rest.clone());
                            return Some(Ok(cell.first.clone()));
                        }
                        Ok(seq @ Value::List(..)) => self.state = IterState::Pending(seq),
                        Ok(other) => {
                            return Some(Err(Error::type_error_in(
                                "seq",
                                "seq",
                                other.type_name(),
                            )));
                        }
                    },
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_of_empty_is_nil() {
        assert_eq!(Value::list([]).seq().unwrap(), Value::Nil);
        assert_eq!(Value::vector([]).seq().unwrap(), Value::Nil);
        assert_eq!(Value::map([]).seq().unwrap(), Value::Nil);
        assert_eq!(Value::string("").seq().unwrap(), Value::Nil);
    }

    #[test]
    fn test_first_rest_next() {
        let v = Value::vector([Value::int(1), Value::int(2)]);
        assert_eq!(v.first().unwrap(), Value::int(1));
        assert_eq!(v.rest().unwrap(), Value::list([Value::int(2)]));
        assert_eq!(v.next().unwrap().next().unwrap(), Value::Nil);
        assert_eq!(Value::Nil.rest().unwrap(), Value::list([]));
    }

    #[test]
    fn test_cons_chain() {
        let c = Value::cons(Value::int(0), Value::vector([Value::int(1), Value::int(2)]));
        assert_eq!(c.first().unwrap(), Value::int(0));
        assert_eq!(
            c.to_vec().unwrap(),
            vec![Value::int(0), Value::int(1), Value::int(2)]
        );
        assert_eq!(c, Value::list([Value::int(0), Value::int(1), Value::int(2)]));
        assert_eq!(format!("{}", c), "(0 1 2)");
    }

    #[test]
    fn test_map_seq_yields_entries() {
        let m = Value::map([(Value::keyword("a"), Value::int(1))]);
        assert_eq!(
            m.first().unwrap(),
            Value::vector([Value::keyword("a"), Value::int(1)])
        );
    }

    #[test]
    fn test_string_seq() {
        let s = Value::string("ab");
        assert_eq!(s.to_vec().unwrap(), vec![Value::char('a'), Value::char('b')]);
    }

    #[test]
    fn test_non_seqable() {
        assert!(Value::int(3).seq().is_err());
        let mut iter = Value::int(3).iter_seq();
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none());
    }
}
