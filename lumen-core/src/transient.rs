// lumen-core - Transient collections
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Single-owner mutable views over persistent collections.
//!
//! [`Value::transient`] copies the collection's root into a [`Transient`]
//! that mutates in place, and [`Transient::persistent`] seals it back into an
//! ordinary value. After sealing, every operation on the handle fails with
//! [`Error::TransientSealed`].
//!
//! A transient array map starts from an exactly-sized copy reserved to the
//! top tier, so it owns its block outright and appends never reallocate until
//! it is promoted to a hash map.

use std::fmt;
use std::sync::Arc;

use im::{OrdMap, OrdSet, Vector};
use parking_lot::Mutex;

use crate::array_map::{MAX_PAIRS, PersistentArrayMap};
use crate::collections::{MapRepr, array_map_assoc};
use crate::error::{Error, Result};
use crate::value::Value;

enum Editable {
    ArrayMap(PersistentArrayMap),
    HashMap(im::HashMap<Value, Value>),
    SortedMap(OrdMap<Value, Value>),
    Vector(Vector<Value>),
    HashSet(im::HashSet<Value>),
    SortedSet(OrdSet<Value>),
}

impl Editable {
    fn kind(&self) -> &'static str {
        match self {
            Editable::ArrayMap(_) => "array-map",
            Editable::HashMap(_) => "hash-map",
            Editable::SortedMap(_) => "sorted-map",
            Editable::Vector(_) => "vector",
            Editable::HashSet(_) => "hash-set",
            Editable::SortedSet(_) => "sorted-set",
        }
    }

    fn count(&self) -> usize {
        match self {
            Editable::ArrayMap(m) => m.len(),
            Editable::HashMap(m) => m.len(),
            Editable::SortedMap(m) => m.len(),
            Editable::Vector(v) => v.len(),
            Editable::HashSet(s) => s.len(),
            Editable::SortedSet(s) => s.len(),
        }
    }

    fn get(&self, key: &Value) -> Option<Value> {
        match self {
            Editable::ArrayMap(m) => m.find(key).cloned(),
            Editable::HashMap(m) => m.get(key).cloned(),
            Editable::SortedMap(m) => m.get(key).cloned(),
            Editable::Vector(v) => match key {
                Value::Integer(i) if *i >= 0 => v.get(*i as usize).cloned(),
                _ => None,
            },
            Editable::HashSet(s) => s.contains(key).then(|| key.clone()),
            Editable::SortedSet(s) => s.contains(key).then(|| key.clone()),
        }
    }

    fn assoc(&mut self, key: Value, val: Value) -> Result<()> {
        match self {
            Editable::ArrayMap(m) => {
                if m.len() < MAX_PAIRS || m.contains_key(&key) {
                    return m.insert_or_assign(key, val);
                }
                match array_map_assoc(std::mem::take(m), key, val) {
                    MapRepr::Small(small) => *m = small,
                    MapRepr::Hash(promoted) => *self = Editable::HashMap(promoted),
                }
                Ok(())
            }
            Editable::HashMap(m) => {
                m.insert(key, val);
                Ok(())
            }
            Editable::SortedMap(m) => {
                m.insert(key, val);
                Ok(())
            }
            Editable::Vector(v) => match key {
                Value::Integer(i) if i >= 0 && (i as usize) < v.len() => {
                    v.set(i as usize, val);
                    Ok(())
                }
                Value::Integer(i) if i >= 0 && (i as usize) == v.len() => {
                    v.push_back(val);
                    Ok(())
                }
                Value::Integer(i) => Err(Error::IndexOutOfBounds {
                    index: i,
                    length: v.len(),
                }),
                other => Err(Error::type_error_in("assoc!", "integer", other.type_name())),
            },
            other => Err(Error::type_error_in("assoc!", "map or vector", other.kind())),
        }
    }

    fn conj(&mut self, item: Value) -> Result<()> {
        match self {
            Editable::Vector(v) => {
                v.push_back(item);
                Ok(())
            }
            Editable::HashSet(s) => {
                s.insert(item);
                Ok(())
            }
            Editable::SortedSet(s) => {
                s.insert(item);
                Ok(())
            }
            _ => match item {
                Value::Vector(pair, _) if pair.len() == 2 => {
                    self.assoc(pair[0].clone(), pair[1].clone())
                }
                other => match other.as_map() {
                    Some(entries) => {
                        for (k, v) in entries.iter() {
                            self.assoc(k.clone(), v.clone())?;
                        }
                        Ok(())
                    }
                    None => Err(Error::type_error_in(
                        "conj!",
                        "map entry vector",
                        other.type_name(),
                    )),
                },
            },
        }
    }

    fn dissoc(&mut self, key: &Value) -> Result<()> {
        match self {
            Editable::ArrayMap(m) => {
                m.erase(key);
                Ok(())
            }
            Editable::HashMap(m) => {
                m.remove(key);
                Ok(())
            }
            Editable::SortedMap(m) => {
                m.remove(key);
                Ok(())
            }
            other => Err(Error::type_error_in("dissoc!", "map", other.kind())),
        }
    }

    fn disj(&mut self, item: &Value) -> Result<()> {
        match self {
            Editable::HashSet(s) => {
                s.remove(item);
                Ok(())
            }
            Editable::SortedSet(s) => {
                s.remove(item);
                Ok(())
            }
            other => Err(Error::type_error_in("disj!", "set", other.kind())),
        }
    }

    fn pop(&mut self) -> Result<()> {
        match self {
            Editable::Vector(v) => match v.pop_back() {
                Some(_) => Ok(()),
                None => Err(Error::eval("Can't pop empty vector")),
            },
            other => Err(Error::type_error_in("pop!", "vector", other.kind())),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Editable::ArrayMap(m) => Value::ArrayMap(Arc::new(m), None),
            Editable::HashMap(m) => Value::HashMap(Arc::new(m), None),
            Editable::SortedMap(m) => Value::SortedMap(Arc::new(m), None),
            Editable::Vector(v) => Value::Vector(Arc::new(v), None),
            Editable::HashSet(s) => Value::HashSet(Arc::new(s), None),
            Editable::SortedSet(s) => Value::SortedSet(Arc::new(s), None),
        }
    }
}

/// A mutable handle over a collection being built in place.
///
/// Cloning the handle aliases it. The lock only turns misuse from several
/// threads into serialized access; transients are meant for one owner.
#[derive(Clone)]
pub struct Transient {
    inner: Arc<Mutex<Option<Editable>>>,
}

impl Transient {
    fn with_editable<T>(&self, f: impl FnOnce(&mut Editable) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.lock();
        match guard.as_mut() {
            Some(editable) => f(editable),
            None => Err(Error::TransientSealed),
        }
    }

    pub fn conj_in_place(&self, item: Value) -> Result<()> {
        self.with_editable(|e| e.conj(item))
    }

    pub fn assoc_in_place(&self, key: Value, val: Value) -> Result<()> {
        self.with_editable(|e| e.assoc(key, val))
    }

    pub fn dissoc_in_place(&self, key: &Value) -> Result<()> {
        self.with_editable(|e| e.dissoc(key))
    }

    pub fn disj_in_place(&self, item: &Value) -> Result<()> {
        self.with_editable(|e| e.disj(item))
    }

    /// Remove the last element of a transient vector.
    pub fn pop_in_place(&self) -> Result<()> {
        self.with_editable(|e| e.pop())
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>> {
        self.with_editable(|e| Ok(e.get(key)))
    }

    pub fn count(&self) -> Result<usize> {
        self.with_editable(|e| Ok(e.count()))
    }

    /// Seal into a persistent value. The handle is unusable afterwards.
    pub fn persistent(&self) -> Result<Value> {
        self.inner
            .lock()
            .take()
            .map(Editable::into_value)
            .ok_or(Error::TransientSealed)
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().is_none()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Display for Transient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.lock().as_ref() {
            Some(e) => write!(f, "#<Transient {}>", e.kind()),
            None => write!(f, "#<Transient sealed>"),
        }
    }
}

impl fmt::Debug for Transient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Value {
    /// Open a transient over a map, set or vector.
    pub fn transient(&self) -> Result<Transient> {
        let editable = match self {
            Value::ArrayMap(m, _) => {
                let mut owned = m.clone_exact();
                owned.reserve(MAX_PAIRS)?;
                Editable::ArrayMap(owned)
            }
            Value::HashMap(m, _) => Editable::HashMap((**m).clone()),
            Value::SortedMap(m, _) => Editable::SortedMap((**m).clone()),
            Value::Vector(v, _) => Editable::Vector((**v).clone()),
            Value::HashSet(s, _) => Editable::HashSet((**s).clone()),
            Value::SortedSet(s, _) => Editable::SortedSet((**s).clone()),
            other => {
                return Err(Error::type_error_in(
                    "transient",
                    "map, set or vector",
                    other.type_name(),
                ));
            }
        };
        Ok(Transient {
            inner: Arc::new(Mutex::new(Some(editable))),
        })
    }
}
