// lumen-core - Symbol type with interning
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Symbols are identifiers that may be optionally namespaced.
//!
//! Symbols are interned the same way keywords are (see [`crate::keyword`]),
//! so equality is a pointer comparison. Namespaces key their var mappings
//! and alias tables by symbol.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::hash;

/// A symbol with optional namespace.
#[derive(Clone)]
pub struct Symbol {
    inner: Arc<SymbolInner>,
}

#[derive(Debug)]
struct SymbolInner {
    namespace: Option<Arc<str>>,
    name: Arc<str>,
    hash: u32,
}

static SYMBOL_INTERNER: OnceLock<Mutex<SymbolInterner>> = OnceLock::new();

/// Key type for the interner: (namespace, name)
type InternerKey = (Option<Arc<str>>, Arc<str>);

struct SymbolInterner {
    symbols: HashMap<InternerKey, Arc<SymbolInner>>,
    strings: HashMap<String, Arc<str>>,
}

impl SymbolInterner {
    fn new() -> Self {
        SymbolInterner {
            symbols: HashMap::new(),
            strings: HashMap::new(),
        }
    }

    fn intern_string(&mut self, s: &str) -> Arc<str> {
        if let Some(interned) = self.strings.get(s) {
            Arc::clone(interned)
        } else {
            let interned: Arc<str> = Arc::from(s);
            self.strings.insert(s.to_string(), Arc::clone(&interned));
            interned
        }
    }

    fn intern(&mut self, namespace: Option<&str>, name: &str) -> Arc<SymbolInner> {
        let ns = namespace.map(|s| self.intern_string(s));
        let n = self.intern_string(name);

        let key = (ns.clone(), n.clone());
        if let Some(existing) = self.symbols.get(&key) {
            return Arc::clone(existing);
        }

        let hash = match &ns {
            Some(ns) => hash::combine(hash::string(&n), hash::string(ns)),
            None => hash::string(&n),
        };
        let inner = Arc::new(SymbolInner {
            namespace: ns,
            name: n,
            hash,
        });
        self.symbols.insert(key, Arc::clone(&inner));
        inner
    }
}

fn get_interner() -> &'static Mutex<SymbolInterner> {
    SYMBOL_INTERNER.get_or_init(|| Mutex::new(SymbolInterner::new()))
}

impl Symbol {
    /// Create a new symbol with no namespace.
    pub fn new(name: &str) -> Self {
        let inner = get_interner().lock().intern(None, name);
        Symbol { inner }
    }

    /// Create a new symbol with a namespace.
    pub fn with_namespace(namespace: &str, name: &str) -> Self {
        let inner = get_interner().lock().intern(Some(namespace), name);
        Symbol { inner }
    }

    /// Parse a symbol from a string like "foo" or "ns/foo".
    pub fn parse(s: &str) -> Self {
        match s.find('/') {
            Some(slash_pos) if slash_pos > 0 && slash_pos + 1 < s.len() => {
                Symbol::with_namespace(&s[..slash_pos], &s[slash_pos + 1..])
            }
            _ => Symbol::new(s),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn has_namespace(&self) -> bool {
        self.inner.namespace.is_some()
    }

    /// The same name with the namespace part dropped.
    #[must_use]
    pub fn unqualified(&self) -> Symbol {
        if self.has_namespace() {
            Symbol::new(self.name())
        } else {
            self.clone()
        }
    }

    /// The namespace part as a symbol of its own, e.g. `a.b` for `a.b/c`.
    #[must_use]
    pub fn namespace_symbol(&self) -> Option<Symbol> {
        self.namespace().map(Symbol::new)
    }

    #[inline]
    #[must_use]
    pub fn to_hash(&self) -> u32 {
        self.inner.hash
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.inner.namespace {
            write!(f, "{}/{}", ns, self.inner.name)
        } else {
            write!(f, "{}", self.inner.name)
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Symbol {}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (&self.inner.namespace, &other.inner.namespace) {
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, None) => self.inner.name.cmp(&other.inner.name),
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.inner.name.cmp(&other.inner.name)),
        }
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.inner.hash);
    }
}
