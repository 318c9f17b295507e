// lumen-core - Vars
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Vars: named, namespace-owned references with an optional root value and
//! optional per-thread dynamic bindings.
//!
//! A var starts unbound. `bind_root` and `alter_root` give it a root value
//! visible to every thread. A dynamic var can additionally be rebound per
//! thread with [`crate::bindings::push_thread_bindings`]; while the calling
//! thread has such a binding, `deref` and `set` see that instead of the root.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;

use crate::bindings;
use crate::error::{Error, Result};
use crate::keyword::Keyword;
use crate::namespace::{Namespace, NamespaceInner};
use crate::symbol::Symbol;
use crate::value::Value;

pub(crate) struct VarInner {
    ns: Weak<NamespaceInner>,
    ns_name: Symbol,
    name: Symbol,
    root: ArcSwapOption<Value>,
    dynamic: AtomicBool,
    /// Set once the var has ever been pushed in a binding frame. Vars that
    /// were never dynamically bound skip the thread-local lookup.
    thread_bound: AtomicBool,
    meta: RwLock<Option<Value>>,
}

/// A named reference interned in a namespace.
///
/// Cloning is cheap and yields a handle to the same var. Equality and
/// hashing are by identity.
#[derive(Clone)]
pub struct Var {
    inner: Arc<VarInner>,
}

impl Var {
    pub(crate) fn new(ns: &Namespace, name: Symbol) -> Self {
        Var {
            inner: Arc::new(VarInner {
                ns: ns.downgrade(),
                ns_name: ns.name().clone(),
                name,
                root: ArcSwapOption::empty(),
                dynamic: AtomicBool::new(false),
                thread_bound: AtomicBool::new(false),
                meta: RwLock::new(None),
            }),
        }
    }

    /// The owning namespace, if it is still alive.
    pub fn namespace(&self) -> Option<Namespace> {
        self.inner.ns.upgrade().map(Namespace::from_inner)
    }

    pub fn ns_name(&self) -> &Symbol {
        &self.inner.ns_name
    }

    pub fn name(&self) -> &Symbol {
        &self.inner.name
    }

    /// `ns/name`
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.inner.ns_name, self.inner.name)
    }

    pub fn to_symbol(&self) -> Symbol {
        Symbol::with_namespace(self.inner.ns_name.name(), self.inner.name.name())
    }

    // ========================================================================
    // Root value
    // ========================================================================

    /// Current value: this thread's binding, else the root.
    pub fn deref(&self) -> Result<Value> {
        if let Some(val) = bindings::get_thread_binding(self) {
            return Ok(val);
        }
        self.get_root()
            .ok_or_else(|| Error::UnboundVar(self.qualified_name()))
    }

    pub fn get_root(&self) -> Option<Value> {
        self.inner.root.load_full().map(|v| (*v).clone())
    }

    pub fn has_root(&self) -> bool {
        self.inner.root.load().is_some()
    }

    /// True if the var has a root or a binding on this thread.
    pub fn is_bound(&self) -> bool {
        self.has_root() || bindings::has_thread_binding(self)
    }

    pub fn bind_root(&self, value: Value) {
        self.inner.root.store(Some(Arc::new(value)));
    }

    /// Clear the root, making the var unbound again.
    pub fn unbind_root(&self) {
        self.inner.root.store(None);
    }

    /// `alter-var-root`: root becomes `f(root, args...)`. An unbound root is
    /// passed as nil. Concurrent alters are not serialized; the last store
    /// wins.
    pub fn alter_root(&self, f: &Value, args: &[Value]) -> Result<Value> {
        self.alter_root_with(|root| {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(root.clone());
            call_args.extend_from_slice(args);
            f.call(&call_args)
        })
    }

    pub fn alter_root_with<F>(&self, f: F) -> Result<Value>
    where
        F: FnOnce(&Value) -> Result<Value>,
    {
        let root = self.get_root().unwrap_or(Value::Nil);
        let next = f(&root)?;
        self.bind_root(next.clone());
        Ok(next)
    }

    // ========================================================================
    // Dynamic binding
    // ========================================================================

    pub fn is_dynamic(&self) -> bool {
        self.inner.dynamic.load(Ordering::Acquire)
    }

    pub fn set_dynamic(&self, dynamic: bool) -> &Self {
        self.inner.dynamic.store(dynamic, Ordering::Release);
        self
    }

    /// True if this thread currently has a binding for the var.
    pub fn is_thread_bound(&self) -> bool {
        bindings::has_thread_binding(self)
    }

    /// False if no thread has ever bound this var.
    pub(crate) fn maybe_thread_bound(&self) -> bool {
        self.inner.thread_bound.load(Ordering::Acquire)
    }

    pub(crate) fn mark_thread_bound(&self) {
        self.inner.thread_bound.store(true, Ordering::Release);
    }

    /// `set!`: assign the current thread binding.
    pub fn set(&self, value: Value) -> Result<Value> {
        bindings::set_thread_binding(self, value.clone())?;
        Ok(value)
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn meta(&self) -> Option<Value> {
        self.inner.meta.read().clone()
    }

    pub fn set_meta(&self, meta: Option<Value>) {
        *self.inner.meta.write() = meta;
    }

    /// False when the metadata carries a truthy `:private`.
    pub fn is_public(&self) -> bool {
        match self.inner.meta.read().as_ref() {
            Some(meta) => !meta.get(&Value::Keyword(Keyword::new("private"))).is_truthy(),
            None => true,
        }
    }

    /// True if `ns` is the namespace this var was interned in.
    pub(crate) fn belongs_to(&self, ns: &Namespace) -> bool {
        std::ptr::eq(self.inner.ns.as_ptr(), ns.inner_ptr())
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#'{}/{}", self.inner.ns_name, self.inner.name)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> (Namespace, Var) {
        let ns = Namespace::new(Symbol::new("test.var"));
        let var = ns.intern(Symbol::new(name)).unwrap();
        (ns, var)
    }

    #[test]
    fn test_unbound_var_deref_fails() {
        let (_ns, v) = var("x");
        assert!(!v.is_bound());
        let err = v.deref().unwrap_err();
        assert!(matches!(&err, Error::UnboundVar(name) if name == "test.var/x"));
        assert_eq!(err.to_string(), "Var test.var/x is unbound");
    }

    #[test]
    fn test_bind_root() {
        let (_ns, v) = var("x");
        v.bind_root(Value::int(1));
        assert!(v.is_bound());
        assert_eq!(v.deref().unwrap(), Value::int(1));
        v.unbind_root();
        assert!(v.deref().is_err());
    }

    #[test]
    fn test_alter_root() {
        let (_ns, v) = var("x");
        let inc = Value::native_fn("inc", |args| match args {
            [Value::Integer(n)] => Ok(Value::int(n + 1)),
            [Value::Nil] => Ok(Value::int(0)),
            _ => Err(Error::arity(1, args.len())),
        });
        assert_eq!(v.alter_root(&inc, &[]).unwrap(), Value::int(0));
        assert_eq!(v.alter_root(&inc, &[]).unwrap(), Value::int(1));
        assert_eq!(v.get_root(), Some(Value::int(1)));
    }

    #[test]
    fn test_set_without_binding_fails() {
        let (_ns, v) = var("x");
        v.set_dynamic(true);
        v.bind_root(Value::int(1));
        assert!(matches!(v.set(Value::int(2)), Err(Error::VarNotThreadBound(_))));
        assert_eq!(v.deref().unwrap(), Value::int(1));
    }

    #[test]
    fn test_private_meta() {
        let (_ns, v) = var("x");
        assert!(v.is_public());
        v.set_meta(Some(Value::map([(Value::keyword("private"), Value::bool(true))])));
        assert!(!v.is_public());
    }

    #[test]
    fn test_display_and_namespace_link() {
        let (ns, v) = var("x");
        assert_eq!(format!("{}", v), "#'test.var/x");
        assert_eq!(v.qualified_name(), "test.var/x");
        assert_eq!(v.to_symbol(), Symbol::parse("test.var/x"));
        assert_eq!(v.namespace(), Some(ns.clone()));
        drop(ns);
        assert!(v.namespace().is_none());
    }
}
