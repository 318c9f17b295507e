// lumen-core - Multimethods
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Multimethods dispatch on the result of a dispatch function.
//!
//! The method for a dispatch value is, in order:
//! 1. the method registered for exactly that value,
//! 2. the dominant method among those whose dispatch value the actual value
//!    `isa?` in the multimethod's hierarchy, where `x` dominates `y` if `x`
//!    is preferred over `y` or `x` `isa?` `y`,
//! 3. the method registered for the default dispatch value.
//!
//! Resolved methods are cached per dispatch value. The cache is flushed on
//! any method or preference change, and whenever the hierarchy's version
//! moves on.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::hierarchy::HierarchyRef;
use crate::symbol::Symbol;
use crate::value::Value;

#[derive(Default)]
struct Tables {
    methods: HashMap<Value, Value>,
    /// x -> the values x is preferred over
    prefers: HashMap<Value, HashSet<Value>>,
    cache: HashMap<Value, Value>,
    cached_version: u64,
}

impl Tables {
    fn reset_cache(&mut self) {
        self.cache.clear();
    }

    /// True if `x` is preferred over `y`, directly or through the parents of
    /// either side.
    fn prefers(&self, hierarchy: &HierarchyRef, x: &Value, y: &Value) -> bool {
        if self.prefers.get(x).is_some_and(|ys| ys.contains(y)) {
            return true;
        }
        if hierarchy
            .parents(y)
            .iter()
            .any(|p| self.prefers(hierarchy, x, p))
        {
            return true;
        }
        hierarchy
            .parents(x)
            .iter()
            .any(|p| self.prefers(hierarchy, p, y))
    }

    fn dominates(&self, hierarchy: &HierarchyRef, x: &Value, y: &Value) -> bool {
        self.prefers(hierarchy, x, y) || hierarchy.isa(x, y)
    }

    fn find_best(
        &self,
        name: &Symbol,
        hierarchy: &HierarchyRef,
        dispatch_value: &Value,
    ) -> Result<Option<Value>> {
        if let Some(method) = self.methods.get(dispatch_value) {
            return Ok(Some(method.clone()));
        }

        let mut best: Option<(&Value, &Value)> = None;
        for (key, method) in &self.methods {
            if !hierarchy.isa(dispatch_value, key) {
                continue;
            }
            let replace = match best {
                None => true,
                Some((best_key, _)) => self.dominates(hierarchy, key, best_key),
            };
            if replace {
                best = Some((key, method));
            }
            let Some((current, _)) = best else {
                continue;
            };
            if !self.dominates(hierarchy, current, key) {
                return Err(Error::AmbiguousDispatch {
                    multimethod: name.to_string(),
                    dispatch_value: dispatch_value.to_string(),
                    first: current.to_string(),
                    second: key.to_string(),
                });
            }
        }
        Ok(best.map(|(_, method)| method.clone()))
    }
}

struct MultimethodInner {
    name: Symbol,
    dispatch_fn: Value,
    default_dispatch: Value,
    hierarchy: HierarchyRef,
    tables: RwLock<Tables>,
}

/// A function dispatching to methods by the value of a dispatch function.
#[derive(Clone)]
pub struct Multimethod {
    inner: Arc<MultimethodInner>,
}

impl Multimethod {
    pub fn new(
        name: Symbol,
        dispatch_fn: Value,
        default_dispatch: Value,
        hierarchy: HierarchyRef,
    ) -> Self {
        Multimethod {
            inner: Arc::new(MultimethodInner {
                name,
                dispatch_fn,
                default_dispatch,
                hierarchy,
                tables: RwLock::new(Tables::default()),
            }),
        }
    }

    pub fn name(&self) -> &Symbol {
        &self.inner.name
    }

    pub fn dispatch_fn(&self) -> &Value {
        &self.inner.dispatch_fn
    }

    pub fn default_dispatch_value(&self) -> &Value {
        &self.inner.default_dispatch
    }

    pub fn hierarchy(&self) -> &HierarchyRef {
        &self.inner.hierarchy
    }

    /// Call the dispatch function on `args` and apply the selected method.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        let dispatch_value = self.inner.dispatch_fn.call(args)?;
        match self.get_method(&dispatch_value)? {
            Some(method) => method.call(args),
            None => Err(Error::NoMethod {
                multimethod: self.inner.name.to_string(),
                dispatch_value: dispatch_value.to_string(),
            }),
        }
    }

    /// The method `invoke` would use for `dispatch_value`, including the
    /// default. Fails only when the choice is ambiguous.
    pub fn get_method(&self, dispatch_value: &Value) -> Result<Option<Value>> {
        let version = self.inner.hierarchy.version();
        {
            let tables = self.inner.tables.read();
            if tables.cached_version == version
                && let Some(method) = tables.cache.get(dispatch_value)
            {
                return Ok(Some(method.clone()));
            }
        }

        let mut tables = self.inner.tables.write();
        if tables.cached_version != version {
            tables.reset_cache();
            tables.cached_version = version;
        }

        let found = tables
            .find_best(&self.inner.name, &self.inner.hierarchy, dispatch_value)?
            .or_else(|| tables.methods.get(&self.inner.default_dispatch).cloned());
        if let Some(method) = &found {
            tables.cache.insert(dispatch_value.clone(), method.clone());
        }
        Ok(found)
    }

    // ========================================================================
    // Method table
    // ========================================================================

    pub fn add_method(&self, dispatch_value: Value, method: Value) {
        let mut tables = self.inner.tables.write();
        tracing::debug!(multimethod = %self.inner.name, dispatch_value = %dispatch_value, "added method");
        tables.methods.insert(dispatch_value, method);
        tables.reset_cache();
    }

    /// Returns true if a method was registered for `dispatch_value`.
    pub fn remove_method(&self, dispatch_value: &Value) -> bool {
        let mut tables = self.inner.tables.write();
        let removed = tables.methods.remove(dispatch_value).is_some();
        if removed {
            tracing::debug!(multimethod = %self.inner.name, dispatch_value = %dispatch_value, "removed method");
            tables.reset_cache();
        }
        removed
    }

    /// Drop every method and preference.
    pub fn remove_all_methods(&self) {
        let mut tables = self.inner.tables.write();
        tracing::debug!(multimethod = %self.inner.name, "removed all methods");
        tables.methods.clear();
        tables.prefers.clear();
        tables.reset_cache();
    }

    /// Alias of [`Multimethod::remove_all_methods`].
    pub fn reset(&self) {
        self.remove_all_methods();
    }

    /// Prefer `x` over `y` when both match. Fails if `y` is already preferred
    /// over `x`.
    pub fn prefer_method(&self, x: Value, y: Value) -> Result<()> {
        let mut tables = self.inner.tables.write();
        if tables.prefers(&self.inner.hierarchy, &y, &x) {
            return Err(Error::PreferenceConflict {
                multimethod: self.inner.name.to_string(),
                preferred: y.to_string(),
                other: x.to_string(),
            });
        }
        tracing::debug!(multimethod = %self.inner.name, preferred = %x, over = %y, "added preference");
        tables.prefers.entry(x).or_default().insert(y);
        tables.reset_cache();
        Ok(())
    }

    /// The method table as a map from dispatch value to method.
    pub fn methods(&self) -> Value {
        let tables = self.inner.tables.read();
        Value::map(
            tables
                .methods
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// The preference table as a map from value to the set of values it is
    /// preferred over.
    pub fn prefers(&self) -> Value {
        let tables = self.inner.tables.read();
        Value::map(
            tables
                .prefers
                .iter()
                .map(|(x, ys)| (x.clone(), Value::hash_set(ys.iter().cloned()))),
        )
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Display for Multimethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Multimethod {}>", self.inner.name)
    }
}

impl fmt::Debug for Multimethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Value {
    pub fn multimethod(name: &str, dispatch_fn: Value, hierarchy: HierarchyRef) -> Value {
        Value::Multimethod(Multimethod::new(
            Symbol::parse(name),
            dispatch_fn,
            Value::keyword("default"),
            hierarchy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(s: &str) -> Value {
        Value::keyword(s)
    }

    /// Dispatch on the first argument itself
    fn identity_dispatch() -> Value {
        Value::native_fn("identity", |args| Ok(args.first().cloned().unwrap_or(Value::Nil)))
    }

    fn constant(name: &str) -> Value {
        let out = Value::string(name);
        Value::native_fn(name, move |_| Ok(out.clone()))
    }

    fn make(hierarchy: &HierarchyRef) -> Multimethod {
        Multimethod::new(
            Symbol::new("area"),
            identity_dispatch(),
            kw("default"),
            hierarchy.clone(),
        )
    }

    #[test]
    fn test_exact_and_default() {
        let mm = make(&HierarchyRef::new());
        mm.add_method(kw("square"), constant("square"));
        assert_eq!(mm.invoke(&[kw("square")]).unwrap(), Value::string("square"));
        assert!(matches!(mm.invoke(&[kw("circle")]), Err(Error::NoMethod { .. })));

        mm.add_method(kw("default"), constant("default"));
        assert_eq!(mm.invoke(&[kw("circle")]).unwrap(), Value::string("default"));
    }

    #[test]
    fn test_most_specific_wins() {
        let h = HierarchyRef::new();
        h.derive(kw("square"), kw("rect")).unwrap();
        h.derive(kw("rect"), kw("shape")).unwrap();
        let mm = make(&h);
        mm.add_method(kw("shape"), constant("shape"));
        mm.add_method(kw("rect"), constant("rect"));
        assert_eq!(mm.invoke(&[kw("square")]).unwrap(), Value::string("rect"));
    }

    #[test]
    fn test_ambiguity_resolved_by_preference() {
        let h = HierarchyRef::new();
        h.derive(kw("c"), kw("a")).unwrap();
        h.derive(kw("c"), kw("b")).unwrap();
        let mm = make(&h);
        mm.add_method(kw("a"), constant("a"));
        mm.add_method(kw("b"), constant("b"));

        assert!(matches!(
            mm.invoke(&[kw("c")]),
            Err(Error::AmbiguousDispatch { .. })
        ));
        mm.prefer_method(kw("a"), kw("b")).unwrap();
        assert_eq!(mm.invoke(&[kw("c")]).unwrap(), Value::string("a"));
        assert!(matches!(
            mm.prefer_method(kw("b"), kw("a")),
            Err(Error::PreferenceConflict { .. })
        ));
    }

    #[test]
    fn test_cache_follows_hierarchy_changes() {
        let h = HierarchyRef::new();
        let mm = make(&h);
        mm.add_method(kw("shape"), constant("shape"));
        mm.add_method(kw("default"), constant("default"));
        assert_eq!(mm.invoke(&[kw("circle")]).unwrap(), Value::string("default"));

        h.derive(kw("circle"), kw("shape")).unwrap();
        assert_eq!(mm.invoke(&[kw("circle")]).unwrap(), Value::string("shape"));
    }

    #[test]
    fn test_remove_methods() {
        let mm = make(&HierarchyRef::new());
        mm.add_method(kw("a"), constant("a"));
        mm.add_method(kw("b"), constant("b"));
        assert_eq!(mm.invoke(&[kw("a")]).unwrap(), Value::string("a"));

        assert!(mm.remove_method(&kw("a")));
        assert!(!mm.remove_method(&kw("a")));
        assert!(mm.invoke(&[kw("a")]).is_err());
        assert_eq!(mm.methods().count().unwrap(), 1);

        mm.reset();
        assert_eq!(mm.methods().count().unwrap(), 0);
    }

    #[test]
    fn test_tables_as_values() {
        let mm = make(&HierarchyRef::new());
        let method = constant("a");
        mm.add_method(kw("a"), method.clone());
        mm.prefer_method(kw("a"), kw("b")).unwrap();
        assert_eq!(mm.methods().get(&kw("a")), method);
        assert_eq!(mm.prefers().get(&kw("a")), Value::hash_set([kw("b")]));
        assert_eq!(format!("{}", mm), "#<Multimethod area>");
    }

    #[test]
    fn test_callable_as_value() {
        let h = HierarchyRef::new();
        let mm = Value::multimethod("greet", identity_dispatch(), h);
        if let Value::Multimethod(m) = &mm {
            m.add_method(kw("en"), constant("hello"));
        }
        assert_eq!(mm.call(&[kw("en")]).unwrap(), Value::string("hello"));
    }
}
