// lumen-core - Persistent collection operations
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Constructors and the persistent update API shared by every collection.
//!
//! Each "modifying" operation returns a new value. Blocks reachable from the
//! receiver are never written: `im` structures share internally and copy on
//! write, and array maps copy any block still referenced elsewhere.

use std::sync::Arc;

use im::{OrdMap, OrdSet};

use crate::array_map::{MAX_PAIRS, PersistentArrayMap};
use crate::error::{Error, Result};
use crate::value::{Meta, Value};

/// Read-only view over any map representation.
#[derive(Clone, Copy)]
pub enum MapView<'a> {
    Array(&'a PersistentArrayMap),
    Hash(&'a im::HashMap<Value, Value>),
    Sorted(&'a OrdMap<Value, Value>),
}

impl<'a> MapView<'a> {
    pub fn len(&self) -> usize {
        match *self {
            MapView::Array(m) => m.len(),
            MapView::Hash(m) => m.len(),
            MapView::Sorted(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Value) -> Option<&'a Value> {
        match *self {
            MapView::Array(m) => m.find(key),
            MapView::Hash(m) => m.get(key),
            MapView::Sorted(m) => m.get(key),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&'a Value, &'a Value)> + 'a> {
        match *self {
            MapView::Array(m) => Box::new(m.iter()),
            MapView::Hash(m) => Box::new(m.iter()),
            MapView::Sorted(m) => Box::new(m.iter()),
        }
    }
}

/// Read-only view over any set representation.
#[derive(Clone, Copy)]
pub enum SetView<'a> {
    Hash(&'a im::HashSet<Value>),
    Sorted(&'a OrdSet<Value>),
}

impl<'a> SetView<'a> {
    pub fn len(&self) -> usize {
        match *self {
            SetView::Hash(s) => s.len(),
            SetView::Sorted(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &Value) -> bool {
        match *self {
            SetView::Hash(s) => s.contains(item),
            SetView::Sorted(s) => s.contains(item),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        match *self {
            SetView::Hash(s) => Box::new(s.iter()),
            SetView::Sorted(s) => Box::new(s.iter()),
        }
    }
}

/// Result of growing an owned array map by one entry.
pub(crate) enum MapRepr {
    Small(PersistentArrayMap),
    Hash(im::HashMap<Value, Value>),
}

impl MapRepr {
    pub(crate) fn into_value(self, meta: Option<Meta>) -> Value {
        match self {
            MapRepr::Small(m) => Value::ArrayMap(Arc::new(m), meta),
            MapRepr::Hash(m) => Value::HashMap(Arc::new(m), meta),
        }
    }
}

pub(crate) fn promote(map: &PersistentArrayMap) -> im::HashMap<Value, Value> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Associate into an array map, promoting to a hash map when the top tier
/// is full and `key` is new.
pub(crate) fn array_map_assoc(mut map: PersistentArrayMap, key: Value, val: Value) -> MapRepr {
    if map.len() < MAX_PAIRS || map.contains_key(&key) {
        // Below the top tier or overwriting: cannot overflow
        if map.insert_or_assign(key.clone(), val.clone()).is_ok() {
            return MapRepr::Small(map);
        }
    }
    tracing::trace!(pairs = map.len(), "promoting array map to hash map");
    let mut promoted = promote(&map);
    promoted.insert(key, val);
    MapRepr::Hash(promoted)
}

fn vector_index(index: &Value, length: usize, op: &str) -> Result<usize> {
    match index {
        Value::Integer(i) if *i >= 0 && (*i as usize) <= length => Ok(*i as usize),
        Value::Integer(i) => Err(Error::IndexOutOfBounds { index: *i, length }),
        other => Err(Error::type_error_in(op, "integer", other.type_name())),
    }
}

impl Value {
    /// Create a list from items in order.
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::List(Arc::new(items.into_iter().collect()), None)
    }

    pub fn vector<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Vector(Arc::new(items.into_iter().collect()), None)
    }

    /// Create a map, as an array map while it fits and a hash map beyond.
    /// Later duplicates of a key win.
    pub fn map<I: IntoIterator<Item = (Value, Value)>>(pairs: I) -> Self {
        let mut repr = MapRepr::Small(PersistentArrayMap::new());
        for (k, v) in pairs {
            repr = match repr {
                MapRepr::Small(m) => array_map_assoc(m, k, v),
                MapRepr::Hash(mut m) => {
                    m.insert(k, v);
                    MapRepr::Hash(m)
                }
            };
        }
        repr.into_value(None)
    }

    pub fn hash_map<I: IntoIterator<Item = (Value, Value)>>(pairs: I) -> Self {
        Value::HashMap(Arc::new(pairs.into_iter().collect()), None)
    }

    pub fn sorted_map<I: IntoIterator<Item = (Value, Value)>>(pairs: I) -> Self {
        Value::SortedMap(Arc::new(pairs.into_iter().collect()), None)
    }

    pub fn hash_set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::HashSet(Arc::new(items.into_iter().collect()), None)
    }

    pub fn sorted_set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::SortedSet(Arc::new(items.into_iter().collect()), None)
    }

    pub fn as_map(&self) -> Option<MapView<'_>> {
        match self {
            Value::ArrayMap(m, _) => Some(MapView::Array(m)),
            Value::HashMap(m, _) => Some(MapView::Hash(m)),
            Value::SortedMap(m, _) => Some(MapView::Sorted(m)),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<SetView<'_>> {
        match self {
            Value::HashSet(s, _) => Some(SetView::Hash(s)),
            Value::SortedSet(s, _) => Some(SetView::Sorted(s)),
            _ => None,
        }
    }

    /// Number of elements. Walks (and realizes) lazy and cons seqs.
    pub fn count(&self) -> Result<usize> {
        match self {
            Value::Nil => Ok(0),
            Value::String(s) => Ok(s.chars().count()),
            Value::List(items, _) | Value::Vector(items, _) => Ok(items.len()),
            Value::ArrayMap(m, _) => Ok(m.len()),
            Value::HashMap(m, _) => Ok(m.len()),
            Value::SortedMap(m, _) => Ok(m.len()),
            Value::HashSet(s, _) => Ok(s.len()),
            Value::SortedSet(s, _) => Ok(s.len()),
            Value::Cons(_) | Value::LazySeq(_) => {
                let mut n = 0;
                for item in self.iter_seq() {
                    item?;
                    n += 1;
                }
                Ok(n)
            }
            Value::Transient(t) => t.count(),
            other => Err(Error::type_error_in("count", "collection", other.type_name())),
        }
    }

    /// Look up `key`; nil when absent or when the receiver is not associative.
    pub fn get(&self, key: &Value) -> Value {
        self.get_or(key, Value::Nil)
    }

    pub fn get_or(&self, key: &Value, default: Value) -> Value {
        if let Some(map) = self.as_map() {
            return map.get(key).cloned().unwrap_or(default);
        }
        match self {
            Value::HashSet(s, _) if s.contains(key) => key.clone(),
            Value::SortedSet(s, _) if s.contains(key) => key.clone(),
            Value::Vector(items, _) => match key {
                Value::Integer(i) if *i >= 0 => items.get(*i as usize).cloned().unwrap_or(default),
                _ => default,
            },
            Value::Transient(t) => t.get(key).ok().flatten().unwrap_or(default),
            _ => default,
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        if let Some(map) = self.as_map() {
            return map.get(key).is_some();
        }
        match self {
            Value::HashSet(s, _) => s.contains(key),
            Value::SortedSet(s, _) => s.contains(key),
            Value::Vector(items, _) => {
                matches!(key, Value::Integer(i) if *i >= 0 && (*i as usize) < items.len())
            }
            _ => false,
        }
    }

    /// Associate `key` with `val`. Array maps promote past eight pairs.
    pub fn assoc(&self, key: Value, val: Value) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::map([(key, val)])),
            Value::ArrayMap(m, meta) => {
                Ok(array_map_assoc((**m).clone(), key, val).into_value(meta.clone()))
            }
            Value::HashMap(m, meta) => {
                let mut m = (**m).clone();
                m.insert(key, val);
                Ok(Value::HashMap(Arc::new(m), meta.clone()))
            }
            Value::SortedMap(m, meta) => {
                let mut m = (**m).clone();
                m.insert(key, val);
                Ok(Value::SortedMap(Arc::new(m), meta.clone()))
            }
            Value::Vector(items, meta) => {
                let idx = vector_index(&key, items.len(), "assoc")?;
                let mut items = (**items).clone();
                if idx == items.len() {
                    items.push_back(val);
                } else {
                    items.set(idx, val);
                }
                Ok(Value::Vector(Arc::new(items), meta.clone()))
            }
            other => Err(Error::type_error_in(
                "assoc",
                "map or vector",
                other.type_name(),
            )),
        }
    }

    pub fn dissoc(&self, key: &Value) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::Nil),
            Value::ArrayMap(m, meta) => {
                if !m.contains_key(key) {
                    return Ok(self.clone());
                }
                let mut m = (**m).clone();
                m.erase(key);
                Ok(Value::ArrayMap(Arc::new(m), meta.clone()))
            }
            Value::HashMap(m, meta) => Ok(Value::HashMap(Arc::new(m.without(key)), meta.clone())),
            Value::SortedMap(m, meta) => {
                Ok(Value::SortedMap(Arc::new(m.without(key)), meta.clone()))
            }
            other => Err(Error::type_error_in("dissoc", "map", other.type_name())),
        }
    }

    /// Add `item` where the collection adds naturally: the front of lists
    /// and seqs, the end of vectors. Maps take `[k v]` vectors or maps.
    pub fn conj(&self, item: Value) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::list([item])),
            Value::List(items, meta) => {
                let mut items = (**items).clone();
                items.push_front(item);
                Ok(Value::List(Arc::new(items), meta.clone()))
            }
            Value::Vector(items, meta) => {
                let mut items = (**items).clone();
                items.push_back(item);
                Ok(Value::Vector(Arc::new(items), meta.clone()))
            }
            Value::Cons(_) | Value::LazySeq(_) => Ok(Value::cons(item, self.clone())),
            Value::ArrayMap(..) | Value::HashMap(..) | Value::SortedMap(..) => {
                match &item {
                    Value::Vector(pair, _) if pair.len() == 2 => {
                        self.assoc(pair[0].clone(), pair[1].clone())
                    }
                    other => match other.as_map() {
                        Some(entries) => entries
                            .iter()
                            .try_fold(self.clone(), |acc, (k, v)| acc.assoc(k.clone(), v.clone())),
                        None => Err(Error::type_error_in(
                            "conj",
                            "map entry vector",
                            other.type_name(),
                        )),
                    },
                }
            }
            Value::HashSet(s, meta) => Ok(Value::HashSet(Arc::new(s.update(item)), meta.clone())),
            Value::SortedSet(s, meta) => {
                Ok(Value::SortedSet(Arc::new(s.update(item)), meta.clone()))
            }
            other => Err(Error::type_error_in("conj", "collection", other.type_name())),
        }
    }

    pub fn disj(&self, item: &Value) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::Nil),
            Value::HashSet(s, meta) => Ok(Value::HashSet(Arc::new(s.without(item)), meta.clone())),
            Value::SortedSet(s, meta) => {
                Ok(Value::SortedSet(Arc::new(s.without(item)), meta.clone()))
            }
            other => Err(Error::type_error_in("disj", "set", other.type_name())),
        }
    }

    /// The element `pop` would remove.
    pub fn peek(&self) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::Nil),
            Value::List(items, _) => Ok(items.front().cloned().unwrap_or(Value::Nil)),
            Value::Vector(items, _) => Ok(items.back().cloned().unwrap_or(Value::Nil)),
            other => Err(Error::type_error_in("peek", "list or vector", other.type_name())),
        }
    }

    pub fn pop(&self) -> Result<Value> {
        match self {
            Value::Nil => Ok(Value::Nil),
            Value::List(items, _) if items.is_empty() => Err(Error::eval("Can't pop empty list")),
            Value::List(items, meta) => Ok(Value::List(Arc::new(items.skip(1)), meta.clone())),
            Value::Vector(items, _) if items.is_empty() => {
                Err(Error::eval("Can't pop empty vector"))
            }
            Value::Vector(items, meta) => {
                let mut items = (**items).clone();
                items.pop_back();
                Ok(Value::Vector(Arc::new(items), meta.clone()))
            }
            other => Err(Error::type_error_in("pop", "list or vector", other.type_name())),
        }
    }

    /// An empty collection of the same kind, or nil for non-collections.
    /// Metadata carries over.
    pub fn empty(&self) -> Value {
        let meta = self.meta_ref().cloned();
        match self {
            Value::List(..) | Value::Cons(_) | Value::LazySeq(_) => {
                Value::List(Arc::default(), meta)
            }
            Value::Vector(..) => Value::Vector(Arc::default(), meta),
            Value::ArrayMap(..) => Value::ArrayMap(Arc::default(), meta),
            Value::HashMap(..) => Value::HashMap(Arc::default(), meta),
            Value::SortedMap(..) => Value::SortedMap(Arc::default(), meta),
            Value::HashSet(..) => Value::HashSet(Arc::default(), meta),
            Value::SortedSet(..) => Value::SortedSet(Arc::default(), meta),
            _ => Value::Nil,
        }
    }

    pub fn nth(&self, index: usize) -> Result<Value> {
        let out_of_bounds = |length| Error::IndexOutOfBounds {
            index: index as i64,
            length,
        };
        match self {
            Value::List(items, _) | Value::Vector(items, _) => items
                .get(index)
                .cloned()
                .ok_or_else(|| out_of_bounds(items.len())),
            Value::Cons(_) | Value::LazySeq(_) => {
                let mut seen = 0;
                for item in self.iter_seq() {
                    let item = item?;
                    if seen == index {
                        return Ok(item);
                    }
                    seen += 1;
                }
                Err(out_of_bounds(seen))
            }
            other => Err(Error::type_error_in("nth", "sequential", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectType;

    fn kw(name: &str) -> Value {
        Value::keyword(name)
    }

    #[test]
    fn test_assoc_is_persistent() {
        let m1 = Value::map([(kw("a"), Value::int(1))]);
        let m2 = m1.assoc(kw("b"), Value::int(2)).unwrap();
        assert_eq!(m1.count().unwrap(), 1);
        assert_eq!(m2.count().unwrap(), 2);
        assert_eq!(m1.get(&kw("b")), Value::Nil);
        assert_eq!(m2.get(&kw("b")), Value::int(2));
    }

    #[test]
    fn test_array_map_promotes_past_eight() {
        let mut m = Value::map([]);
        for i in 0..8 {
            m = m.assoc(Value::int(i), Value::int(i)).unwrap();
        }
        assert_eq!(m.object_type(), ObjectType::ArrayMap);
        // Overwriting at the top tier stays small
        let same = m.assoc(Value::int(3), Value::int(33)).unwrap();
        assert_eq!(same.object_type(), ObjectType::ArrayMap);
        let bigger = m.assoc(Value::int(8), Value::int(8)).unwrap();
        assert_eq!(bigger.object_type(), ObjectType::HashMap);
        assert_eq!(bigger.count().unwrap(), 9);
        assert_eq!(m.count().unwrap(), 8);
    }

    #[test]
    fn test_map_constructor_promotes() {
        let m = Value::map((0..20).map(|i| (Value::int(i), Value::int(i * 2))));
        assert_eq!(m.object_type(), ObjectType::HashMap);
        assert_eq!(m.get(&Value::int(19)), Value::int(38));
    }

    #[test]
    fn test_dissoc() {
        let m = Value::map([(kw("a"), Value::int(1)), (kw("b"), Value::int(2))]);
        let d = m.dissoc(&kw("a")).unwrap();
        assert_eq!(d, Value::map([(kw("b"), Value::int(2))]));
        assert_eq!(m.count().unwrap(), 2);
        assert!(m.dissoc(&kw("zz")).unwrap().identical(&m));
    }

    #[test]
    fn test_conj_positions() {
        let l = Value::list([Value::int(2)]).conj(Value::int(1)).unwrap();
        assert_eq!(l.peek().unwrap(), Value::int(1));
        let v = Value::vector([Value::int(1)]).conj(Value::int(2)).unwrap();
        assert_eq!(v.peek().unwrap(), Value::int(2));
        let m = Value::map([])
            .conj(Value::vector([kw("k"), Value::int(1)]))
            .unwrap();
        assert_eq!(m.get(&kw("k")), Value::int(1));
        assert!(Value::map([]).conj(Value::int(1)).is_err());
    }

    #[test]
    fn test_sets() {
        let s = Value::hash_set([Value::int(1)]);
        let s2 = s.conj(Value::int(2)).unwrap();
        assert!(s2.contains_key(&Value::int(2)));
        assert!(!s.contains_key(&Value::int(2)));
        assert_eq!(s2.disj(&Value::int(1)).unwrap(), Value::hash_set([Value::int(2)]));
    }

    #[test]
    fn test_vector_assoc_bounds() {
        let v = Value::vector([Value::int(0)]);
        assert_eq!(
            v.assoc(Value::int(1), Value::int(1)).unwrap(),
            Value::vector([Value::int(0), Value::int(1)])
        );
        assert!(matches!(
            v.assoc(Value::int(5), Value::Nil),
            Err(Error::IndexOutOfBounds { index: 5, length: 1 })
        ));
    }

    #[test]
    fn test_pop_empty_fails() {
        assert!(Value::list([]).pop().is_err());
        assert!(Value::vector([]).pop().is_err());
        assert_eq!(Value::Nil.pop().unwrap(), Value::Nil);
    }

    #[test]
    fn test_empty_keeps_kind() {
        let sorted = Value::sorted_set([Value::int(1)]);
        assert_eq!(sorted.empty().object_type(), ObjectType::SortedSet);
        assert_eq!(Value::int(1).empty(), Value::Nil);
    }
}
