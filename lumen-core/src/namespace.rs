// lumen-core - Namespaces
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Namespaces map symbols to vars.
//!
//! A namespace owns the vars interned in it and may also map symbols to
//! vars referred from other namespaces. Aliases give other namespaces short
//! names for qualified resolution. Both tables sit behind their own
//! `parking_lot::RwLock`, so namespaces can be shared and mutated across
//! threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use crate::value::Value;
use crate::var::Var;

pub(crate) struct NamespaceInner {
    name: Symbol,
    /// Interned and referred vars
    mappings: RwLock<HashMap<Symbol, Var>>,
    aliases: RwLock<HashMap<Symbol, Namespace>>,
}

/// A named table of vars.
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<NamespaceInner>,
}

impl Namespace {
    /// Create a detached namespace. Use [`crate::Runtime::intern_ns`] to
    /// create one that the runtime can find by name.
    pub fn new(name: Symbol) -> Self {
        Namespace {
            inner: Arc::new(NamespaceInner {
                name,
                mappings: RwLock::new(HashMap::new()),
                aliases: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<NamespaceInner>) -> Self {
        Namespace { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<NamespaceInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn inner_ptr(&self) -> *const NamespaceInner {
        Arc::as_ptr(&self.inner)
    }

    pub fn name(&self) -> &Symbol {
        &self.inner.name
    }

    // ========================================================================
    // Interning
    // ========================================================================

    /// Find or create the var named `name` in this namespace.
    ///
    /// A mapping that refers a var from another namespace is replaced by a
    /// fresh local var.
    pub fn intern(&self, name: Symbol) -> Result<Var> {
        if name.has_namespace() {
            return Err(Error::eval(format!(
                "Can't intern namespace-qualified symbol: {}",
                name
            )));
        }

        let mut mappings = self.inner.mappings.write();
        if let Some(existing) = mappings.get(&name) {
            if existing.belongs_to(self) {
                return Ok(existing.clone());
            }
            tracing::warn!(
                symbol = %name,
                namespace = %self.inner.name,
                replaced = %existing,
                "interned var shadows a referred var"
            );
        }

        let var = Var::new(self, name.clone());
        tracing::debug!(var = %var, "interned var");
        mappings.insert(name, var.clone());
        Ok(var)
    }

    /// Intern `name` and set its root to `value`.
    pub fn intern_with_value(&self, name: Symbol, value: Value) -> Result<Var> {
        let var = self.intern(name)?;
        var.bind_root(value);
        Ok(var)
    }

    /// Intern a dynamic var with root `value`.
    pub fn intern_dynamic(&self, name: Symbol, value: Value) -> Result<Var> {
        let var = self.intern_with_value(name, value)?;
        var.set_dynamic(true);
        Ok(var)
    }

    /// Map `name` to a var from another namespace.
    pub fn refer(&self, name: Symbol, var: Var) -> Result<()> {
        let mut mappings = self.inner.mappings.write();
        if let Some(existing) = mappings.get(&name)
            && existing.belongs_to(self)
            && *existing != var
        {
            return Err(Error::ReferConflict {
                symbol: name,
                existing: existing.to_string(),
                namespace: self.inner.name.clone(),
            });
        }
        mappings.insert(name, var);
        Ok(())
    }

    /// Refer every public var of `from`.
    pub fn refer_all(&self, from: &Namespace) -> Result<()> {
        for (name, var) in from.publics() {
            self.refer(name, var)?;
        }
        Ok(())
    }

    /// Remove the mapping for `name`. Returns true if there was one.
    pub fn unmap(&self, name: &Symbol) -> bool {
        let removed = self.inner.mappings.write().remove(name).is_some();
        if removed {
            tracing::debug!(symbol = %name, namespace = %self.inner.name, "unmapped symbol");
        }
        removed
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// The var interned here under `name`. Referred vars are not returned.
    pub fn find_var(&self, name: &Symbol) -> Option<Var> {
        self.inner
            .mappings
            .read()
            .get(name)
            .filter(|var| var.belongs_to(self))
            .cloned()
    }

    /// The var mapped to `name`, interned or referred.
    pub fn lookup(&self, name: &Symbol) -> Option<Var> {
        self.inner.mappings.read().get(name).cloned()
    }

    /// Resolve a symbol against this namespace.
    ///
    /// Unqualified symbols go through the mappings. Qualified symbols are
    /// looked up in the namespace named by an alias, or in this namespace when
    /// the qualifier is its own name.
    pub fn resolve(&self, sym: &Symbol) -> Option<Var> {
        let Some(qualifier) = sym.namespace_symbol() else {
            return self.lookup(sym);
        };
        let name = sym.unqualified();
        if qualifier == self.inner.name {
            return self.find_var(&name);
        }
        self.lookup_alias(&qualifier)?.find_var(&name)
    }

    /// Every mapping, interned and referred.
    pub fn mappings(&self) -> HashMap<Symbol, Var> {
        self.inner.mappings.read().clone()
    }

    /// Vars interned in this namespace, public and private.
    pub fn interns(&self) -> HashMap<Symbol, Var> {
        self.inner
            .mappings
            .read()
            .iter()
            .filter(|(_, var)| var.belongs_to(self))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Interned vars without `:private` metadata.
    pub fn publics(&self) -> HashMap<Symbol, Var> {
        self.interns()
            .into_iter()
            .filter(|(_, var)| var.is_public())
            .collect()
    }

    /// Mappings to vars from other namespaces.
    pub fn refers(&self) -> HashMap<Symbol, Var> {
        self.inner
            .mappings
            .read()
            .iter()
            .filter(|(_, var)| !var.belongs_to(self))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // ========================================================================
    // Aliases
    // ========================================================================

    /// Alias `ns` as `alias`. Re-aliasing the same namespace is a no-op.
    pub fn add_alias(&self, alias: Symbol, ns: Namespace) -> Result<()> {
        let mut aliases = self.inner.aliases.write();
        if let Some(existing) = aliases.get(&alias) {
            if *existing == ns {
                return Ok(());
            }
            return Err(Error::AliasConflict {
                alias,
                namespace: self.inner.name.clone(),
                existing: existing.name().clone(),
            });
        }
        tracing::debug!(alias = %alias, target = %ns.name(), namespace = %self.inner.name, "added alias");
        aliases.insert(alias, ns);
        Ok(())
    }

    pub fn remove_alias(&self, alias: &Symbol) -> bool {
        let removed = self.inner.aliases.write().remove(alias).is_some();
        if removed {
            tracing::debug!(alias = %alias, namespace = %self.inner.name, "removed alias");
        }
        removed
    }

    pub fn lookup_alias(&self, alias: &Symbol) -> Option<Namespace> {
        self.inner.aliases.read().get(alias).cloned()
    }

    pub fn aliases(&self) -> HashMap<Symbol, Namespace> {
        self.inner.aliases.read().clone()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Namespace {}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#namespace[{}]", self.inner.name)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
