// lumen-core - Runtime: namespace registry and resolution
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! The namespace registry.
//!
//! A [`Runtime`] owns every namespace it has created, the core namespace
//! holding `*ns*` and `*print-length*`, and the global hierarchy that
//! multimethods defined through it dispatch on. It is cheap to clone and can
//! be shared between threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::hierarchy::HierarchyRef;
use crate::multimethod::Multimethod;
use crate::namespace::Namespace;
use crate::symbol::Symbol;
use crate::value::{self, Value};
use crate::var::Var;

struct RuntimeInner {
    namespaces: RwLock<HashMap<Symbol, Namespace>>,
    core: Namespace,
    current_ns_var: Var,
    print_length_var: Var,
    global_hierarchy: HierarchyRef,
    config: RuntimeConfig,
}

impl Drop for RuntimeInner {
    fn drop(&mut self) {
        // The root of *ns* holds a namespace whose mappings refer back to it
        self.current_ns_var.unbind_root();
    }
}

#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    pub fn new() -> Result<Self> {
        Runtime::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with the given settings. The print length is also
    /// applied to the calling thread.
    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        let core_name = Symbol::new(&config.core_ns);
        let core = Namespace::new(core_name.clone());

        let current_ns_var = core.intern_dynamic(Symbol::new("*ns*"), Value::Nil)?;
        let print_length = config
            .print_length
            .map_or(Value::Nil, |n| Value::int(n as i64));
        let print_length_var = core.intern_dynamic(Symbol::new("*print-length*"), print_length)?;
        value::set_print_length(config.print_length);

        let mut namespaces = HashMap::new();
        namespaces.insert(core_name, core.clone());

        let runtime = Runtime {
            inner: Arc::new(RuntimeInner {
                namespaces: RwLock::new(namespaces),
                core,
                current_ns_var,
                print_length_var,
                global_hierarchy: HierarchyRef::new(),
                config,
            }),
        };

        let user = runtime.intern_ns(&Symbol::new(&runtime.inner.config.user_ns));
        runtime.inner.current_ns_var.bind_root(Value::Namespace(user));
        tracing::debug!(
            core = %runtime.inner.core.name(),
            user = %runtime.inner.config.user_ns,
            "runtime initialized"
        );
        Ok(runtime)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn core_ns(&self) -> &Namespace {
        &self.inner.core
    }

    /// The `*ns*` var.
    pub fn current_ns_var(&self) -> &Var {
        &self.inner.current_ns_var
    }

    /// The `*print-length*` var.
    pub fn print_length_var(&self) -> &Var {
        &self.inner.print_length_var
    }

    pub fn global_hierarchy(&self) -> &HierarchyRef {
        &self.inner.global_hierarchy
    }

    // ========================================================================
    // Namespace registry
    // ========================================================================

    /// `create-ns`: find or create the namespace. New namespaces refer every
    /// public var of the core namespace.
    pub fn intern_ns(&self, name: &Symbol) -> Namespace {
        if let Some(ns) = self.find_ns(name) {
            return ns;
        }

        let mut namespaces = self.inner.namespaces.write();
        if let Some(ns) = namespaces.get(name) {
            return ns.clone();
        }
        let ns = Namespace::new(name.clone());
        if let Err(err) = ns.refer_all(&self.inner.core) {
            tracing::warn!(namespace = %name, error = %err, "failed to refer core namespace");
        }
        tracing::debug!(namespace = %name, "created namespace");
        namespaces.insert(name.clone(), ns.clone());
        ns
    }

    pub fn find_ns(&self, name: &Symbol) -> Option<Namespace> {
        self.inner.namespaces.read().get(name).cloned()
    }

    /// Remove a namespace from the registry, returning it. Neither the core
    /// namespace nor the current one can be removed.
    pub fn remove_ns(&self, name: &Symbol) -> Result<Option<Namespace>> {
        if name == self.inner.core.name() {
            return Err(Error::eval(format!("Cannot remove namespace {}", name)));
        }
        if self.current_ns()?.name() == name {
            return Err(Error::eval(format!("Cannot remove current namespace {}", name)));
        }
        let removed = self.inner.namespaces.write().remove(name);
        if removed.is_some() {
            tracing::debug!(namespace = %name, "removed namespace");
        }
        Ok(removed)
    }

    pub fn all_ns(&self) -> Vec<Namespace> {
        self.inner.namespaces.read().values().cloned().collect()
    }

    /// The value of `*ns*` on the calling thread.
    pub fn current_ns(&self) -> Result<Namespace> {
        match self.inner.current_ns_var.deref()? {
            Value::Namespace(ns) => Ok(ns),
            other => Err(Error::type_error_in("*ns*", "namespace", other.type_name())),
        }
    }

    /// Switch `*ns*` to the named namespace, creating it if needed. Sets the
    /// thread binding when `*ns*` is bound on this thread, else the root.
    pub fn in_ns(&self, name: &Symbol) -> Result<Namespace> {
        let ns = self.intern_ns(name);
        let var = &self.inner.current_ns_var;
        if var.is_thread_bound() {
            var.set(Value::Namespace(ns.clone()))?;
        } else {
            var.bind_root(Value::Namespace(ns.clone()));
        }
        Ok(ns)
    }

    fn namespace_for(&self, sym: &Symbol) -> Result<Namespace> {
        match sym.namespace_symbol() {
            Some(ns_name) => self.find_ns(&ns_name).ok_or(Error::NoNamespace(ns_name)),
            None => self.current_ns(),
        }
    }

    // ========================================================================
    // Vars
    // ========================================================================

    /// Intern a var. A qualified symbol names its namespace, which must
    /// exist; an unqualified one interns into the current namespace.
    pub fn intern_var(&self, sym: &Symbol) -> Result<Var> {
        self.namespace_for(sym)?.intern(sym.unqualified())
    }

    /// `find-var`: the var a fully qualified symbol names, if interned.
    pub fn find_var(&self, sym: &Symbol) -> Result<Option<Var>> {
        if !sym.has_namespace() {
            return Err(Error::eval(format!(
                "Symbol must be namespace-qualified: {}",
                sym
            )));
        }
        Ok(self.namespace_for(sym)?.find_var(&sym.unqualified()))
    }

    /// Resolve a symbol in the current namespace.
    ///
    /// Qualified symbols are looked up in the namespace of that name, then
    /// through the current namespace's aliases.
    pub fn resolve(&self, sym: &Symbol) -> Result<Var> {
        let current = self.current_ns()?;
        let found = match sym.namespace_symbol() {
            Some(ns_name) => match self.find_ns(&ns_name) {
                Some(ns) => ns.find_var(&sym.unqualified()),
                None => current.resolve(sym),
            },
            None => current.resolve(sym),
        };
        found.ok_or_else(|| Error::UndefinedSymbol(sym.clone()))
    }

    /// Like [`Runtime::resolve`] but returns the var's current value.
    pub fn lookup(&self, sym: &Symbol) -> Result<Value> {
        self.resolve(sym)?.deref()
    }

    /// Define `name` as a multimethod on the global hierarchy with `:default`
    /// as the default dispatch value. An existing multimethod under that name
    /// is kept as is.
    pub fn defmulti(&self, name: &Symbol, dispatch_fn: Value) -> Result<Var> {
        let var = self.intern_var(name)?;
        if let Some(Value::Multimethod(_)) = var.get_root() {
            return Ok(var);
        }
        let multimethod = Multimethod::new(
            var.to_symbol(),
            dispatch_fn,
            Value::keyword("default"),
            self.inner.global_hierarchy.clone(),
        );
        var.bind_root(Value::Multimethod(multimethod));
        Ok(var)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("namespaces", &self.inner.namespaces.read().len())
            .finish()
    }
}
