// lumen-core - Keyword type with interning
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Keywords are self-evaluating identifiers that may be optionally namespaced.
//!
//! # Interning
//!
//! Keywords are interned in a global table, so two keywords with the same
//! namespace and name share one allocation. That makes keyword equality a
//! pointer comparison, which is what the array map relies on when it scans
//! keyword keys by identity.
//!
//! Interned keywords are never deallocated. Programs that mint unbounded
//! numbers of keywords from input data will grow the table monotonically.
//!
//! # Thread Safety
//!
//! The interner sits behind a `parking_lot::Mutex`; creating a keyword takes
//! the lock, comparing and hashing keywords does not.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::hash;

/// A keyword with optional namespace.
///
/// They always print with a leading colon.
#[derive(Clone)]
pub struct Keyword {
    inner: Arc<KeywordInner>,
}

#[derive(Debug)]
struct KeywordInner {
    namespace: Option<Arc<str>>,
    name: Arc<str>,
    hash: u32,
}

static KEYWORD_INTERNER: OnceLock<Mutex<KeywordInterner>> = OnceLock::new();

/// Key type for the interner: (namespace, name)
type InternerKey = (Option<Arc<str>>, Arc<str>);

struct KeywordInterner {
    keywords: HashMap<InternerKey, Arc<KeywordInner>>,
    strings: HashMap<String, Arc<str>>,
}

impl KeywordInterner {
    fn new() -> Self {
        KeywordInterner {
            keywords: HashMap::new(),
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

    fn intern(&mut self, namespace: Option<&str>, name: &str) -> Arc<KeywordInner> {
        let ns = namespace.map(|s| self.intern_string(s));
        let n = self.intern_string(name);

        let key = (ns.clone(), n.clone());
        if let Some(existing) = self.keywords.get(&key) {
            return Arc::clone(existing);
        }

        // Keywords and symbols with the same text must not collide.
        let base = match &ns {
            Some(ns) => hash::combine(hash::string(&n), hash::string(ns)),
            None => hash::string(&n),
        };
        let inner = Arc::new(KeywordInner {
            namespace: ns,
            name: n,
            hash: base.wrapping_add(0x9e37_79b9),
        });
        self.keywords.insert(key, Arc::clone(&inner));
        inner
    }
}

fn get_interner() -> &'static Mutex<KeywordInterner> {
    KEYWORD_INTERNER.get_or_init(|| Mutex::new(KeywordInterner::new()))
}

impl Keyword {
    /// Create a new keyword with no namespace.
    pub fn new(name: &str) -> Self {
        let inner = get_interner().lock().intern(None, name);
        Keyword { inner }
    }

    /// Create a new keyword with a namespace.
    pub fn with_namespace(namespace: &str, name: &str) -> Self {
        let inner = get_interner().lock().intern(Some(namespace), name);
        Keyword { inner }
    }

    /// Parse a keyword from a string like ":foo" or ":ns/foo".
    /// The leading colon is optional.
    pub fn parse(s: &str) -> Self {
        let s = s.strip_prefix(':').unwrap_or(s);

        match s.find('/') {
            Some(slash_pos) if slash_pos > 0 && slash_pos + 1 < s.len() => {
                Keyword::with_namespace(&s[..slash_pos], &s[slash_pos + 1..])
            }
            _ => Keyword::new(s),
        }
    }

    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Precomputed hash, stable for the life of the process.
    #[inline]
    #[must_use]
    pub fn to_hash(&self) -> u32 {
        self.inner.hash
    }

    /// Address of the interned storage, used for identity comparisons.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.inner.namespace {
            write!(f, ":{}/{}", ns, self.inner.name)
        } else {
            write!(f, ":{}", self.inner.name)
        }
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keyword({})", self)
    }
}

impl PartialEq for Keyword {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Interned, so pointer comparison is sufficient
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Keyword {}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyword {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (&self.inner.namespace, &other.inner.namespace) {
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, None) => self.inner.name.cmp(&other.inner.name),
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.inner.name.cmp(&other.inner.name)),
        }
    }
}

impl Hash for Keyword {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.inner.hash);
    }
}
