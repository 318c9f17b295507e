// lumen-core - Core value type for the Lumen runtime
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! The dynamic value representation.
//!
//! Every runtime object is a [`Value`]. The set of variants is closed:
//! equality, hashing, ordering, printing, sequence traversal and calling are
//! all exhaustive matches over it, so a new variant has to be handled at every
//! one of those sites before the crate compiles again.
//!
//! Heap payloads sit behind `Arc`, which gives values cheap clones, lets them
//! cross threads, and gives identity comparison ([`Value::identical`]) a
//! pointer to compare.

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use im::{OrdMap, OrdSet, Vector};

use crate::array_map::PersistentArrayMap;
use crate::atom::{Atom, Volatile};
use crate::error::{Error, Result};
use crate::function::NativeFn;
use crate::hash;
use crate::hierarchy::HierarchyRef;
use crate::keyword::Keyword;
use crate::lazy::{Delay, LazySeq};
use crate::multimethod::Multimethod;
use crate::namespace::Namespace;
use crate::seq::Cons;
use crate::symbol::Symbol;
use crate::transient::Transient;
use crate::var::Var;

// Thread-local print settings (can be configured by runtime)
thread_local! {
    /// Maximum number of elements to print in a sequence.
    /// None means unlimited, Some(n) means print at most n elements.
    static PRINT_LENGTH: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Get the current print-length setting.
pub fn get_print_length() -> Option<usize> {
    PRINT_LENGTH.with(|pl| pl.get())
}

/// Set the print-length setting. Returns the previous value.
pub fn set_print_length(len: Option<usize>) -> Option<usize> {
    PRINT_LENGTH.with(|pl| pl.replace(len))
}

/// Closed set of type tags, one per [`Value`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Nil,
    Boolean,
    Integer,
    Real,
    Character,
    String,
    Symbol,
    Keyword,
    List,
    Cons,
    Vector,
    ArrayMap,
    HashMap,
    SortedMap,
    HashSet,
    SortedSet,
    Transient,
    Var,
    Namespace,
    Atom,
    Volatile,
    Multimethod,
    Hierarchy,
    Delay,
    LazySeq,
    Reduced,
    Function,
}

/// Metadata attached to a symbol or collection: always a map.
pub type Meta = Arc<Value>;

/// A runtime value.
///
/// Symbols and collections carry optional metadata. Metadata does not affect
/// equality, hashing or ordering.
#[derive(Clone)]
pub enum Value {
    /// The nil value, representing nothing/absence
    Nil,
    Bool(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Real(f64),
    Char(char),
    /// Immutable string
    String(Arc<str>),
    Symbol(Symbol, Option<Meta>),
    Keyword(Keyword),
    /// Persistent list
    List(Arc<Vector<Value>>, Option<Meta>),
    /// A single cell linking a value onto any seqable rest
    Cons(Arc<Cons>),
    /// Indexed vector (persistent, structural sharing)
    Vector(Arc<Vector<Value>>, Option<Meta>),
    /// Small map of at most eight pairs, scanned linearly
    ArrayMap(Arc<PersistentArrayMap>, Option<Meta>),
    HashMap(Arc<im::HashMap<Value, Value>>, Option<Meta>),
    SortedMap(Arc<OrdMap<Value, Value>>, Option<Meta>),
    HashSet(Arc<im::HashSet<Value>>, Option<Meta>),
    SortedSet(Arc<OrdSet<Value>>, Option<Meta>),
    /// Single-owner mutable view of a collection
    Transient(Transient),
    Var(Var),
    Namespace(Namespace),
    Atom(Atom),
    Volatile(Volatile),
    Multimethod(Multimethod),
    /// Shared derivation relation used by `isa?` and multimethods
    Hierarchy(HierarchyRef),
    Delay(Delay),
    LazySeq(LazySeq),
    /// Early-termination marker returned by a reducing function
    Reduced(Arc<Value>),
    /// Native (Rust) function
    Function(NativeFn),
}

impl Value {
    /// Create a nil value
    pub fn nil() -> Self {
        Value::Nil
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn int(n: i64) -> Self {
        Value::Integer(n)
    }

    pub fn real(n: f64) -> Self {
        Value::Real(n)
    }

    pub fn char(c: char) -> Self {
        Value::Char(c)
    }

    pub fn string(s: &str) -> Self {
        Value::String(Arc::from(s))
    }

    /// Create a symbol, splitting an `ns/name` form.
    pub fn symbol(s: &str) -> Self {
        Value::Symbol(Symbol::parse(s), None)
    }

    /// Create a keyword from `name`, `:name` or `:ns/name`.
    pub fn keyword(s: &str) -> Self {
        Value::Keyword(Keyword::parse(s))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except nil and false is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&Keyword> {
        match self {
            Value::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(sym, _) => Some(sym),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Value::Nil => ObjectType::Nil,
            Value::Bool(_) => ObjectType::Boolean,
            Value::Integer(_) => ObjectType::Integer,
            Value::Real(_) => ObjectType::Real,
            Value::Char(_) => ObjectType::Character,
            Value::String(_) => ObjectType::String,
            Value::Symbol(..) => ObjectType::Symbol,
            Value::Keyword(_) => ObjectType::Keyword,
            Value::List(..) => ObjectType::List,
            Value::Cons(_) => ObjectType::Cons,
            Value::Vector(..) => ObjectType::Vector,
            Value::ArrayMap(..) => ObjectType::ArrayMap,
            Value::HashMap(..) => ObjectType::HashMap,
            Value::SortedMap(..) => ObjectType::SortedMap,
            Value::HashSet(..) => ObjectType::HashSet,
            Value::SortedSet(..) => ObjectType::SortedSet,
            Value::Transient(_) => ObjectType::Transient,
            Value::Var(_) => ObjectType::Var,
            Value::Namespace(_) => ObjectType::Namespace,
            Value::Atom(_) => ObjectType::Atom,
            Value::Volatile(_) => ObjectType::Volatile,
            Value::Multimethod(_) => ObjectType::Multimethod,
            Value::Hierarchy(_) => ObjectType::Hierarchy,
            Value::Delay(_) => ObjectType::Delay,
            Value::LazySeq(_) => ObjectType::LazySeq,
            Value::Reduced(_) => ObjectType::Reduced,
            Value::Function(_) => ObjectType::Function,
        }
    }

    /// Short lowercase name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Char(_) => "character",
            Value::String(_) => "string",
            Value::Symbol(..) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::List(..) => "list",
            Value::Cons(_) => "cons",
            Value::Vector(..) => "vector",
            Value::ArrayMap(..) => "array-map",
            Value::HashMap(..) => "hash-map",
            Value::SortedMap(..) => "sorted-map",
            Value::HashSet(..) => "hash-set",
            Value::SortedSet(..) => "sorted-set",
            Value::Transient(_) => "transient",
            Value::Var(_) => "var",
            Value::Namespace(_) => "namespace",
            Value::Atom(_) => "atom",
            Value::Volatile(_) => "volatile",
            Value::Multimethod(_) => "multimethod",
            Value::Hierarchy(_) => "hierarchy",
            Value::Delay(_) => "delay",
            Value::LazySeq(_) => "lazy-seq",
            Value::Reduced(_) => "reduced",
            Value::Function(_) => "fn",
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(
            self,
            Value::ArrayMap(..) | Value::HashMap(..) | Value::SortedMap(..)
        )
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Value::HashSet(..) | Value::SortedSet(..))
    }

    /// Lists, vectors, cons cells and lazy seqs compare element-wise with
    /// each other.
    pub fn is_sequential(&self) -> bool {
        matches!(
            self,
            Value::List(..) | Value::Vector(..) | Value::Cons(_) | Value::LazySeq(_)
        )
    }

    /// Address of the heap payload, or `None` for immediates.
    fn heap_addr(&self) -> Option<usize> {
        fn arc_addr<T: ?Sized>(a: &Arc<T>) -> usize {
            Arc::as_ptr(a).cast::<()>() as usize
        }
        match self {
            Value::Nil
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::Real(_)
            | Value::Char(_) => None,
            Value::String(s) => Some(arc_addr(s)),
            Value::Symbol(s, _) => Some(s.addr()),
            Value::Keyword(k) => Some(k.addr()),
            Value::List(l, _) => Some(arc_addr(l)),
            Value::Cons(c) => Some(arc_addr(c)),
            Value::Vector(v, _) => Some(arc_addr(v)),
            Value::ArrayMap(m, _) => Some(arc_addr(m)),
            Value::HashMap(m, _) => Some(arc_addr(m)),
            Value::SortedMap(m, _) => Some(arc_addr(m)),
            Value::HashSet(s, _) => Some(arc_addr(s)),
            Value::SortedSet(s, _) => Some(arc_addr(s)),
            Value::Transient(t) => Some(t.addr()),
            Value::Var(v) => Some(v.addr()),
            Value::Namespace(ns) => Some(ns.addr()),
            Value::Atom(a) => Some(a.addr()),
            Value::Volatile(v) => Some(v.addr()),
            Value::Multimethod(m) => Some(m.addr()),
            Value::Hierarchy(h) => Some(h.addr()),
            Value::Delay(d) => Some(d.addr()),
            Value::LazySeq(ls) => Some(ls.addr()),
            Value::Reduced(r) => Some(arc_addr(r)),
            Value::Function(f) => Some(f.addr()),
        }
    }

    /// Identity comparison.
    ///
    /// Heap values are identical only when they share one allocation.
    /// Immediates (nil, booleans, numbers, characters) compare by value,
    /// reals by bit pattern.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            _ => {
                self.object_type() == other.object_type()
                    && matches!((self.heap_addr(), other.heap_addr()), (Some(a), Some(b)) if a == b)
            }
        }
    }

    /// Hash consistent with `PartialEq`: equal values hash equal.
    pub fn to_hash(&self) -> u32 {
        match self {
            Value::Nil => 0,
            Value::Bool(true) => 1231,
            Value::Bool(false) => 1237,
            Value::Integer(n) => hash::integer(*n),
            Value::Real(n) => hash::real(*n),
            Value::Char(c) => hash::int32(*c as u32),
            Value::String(s) => hash::string(s),
            Value::Symbol(sym, _) => sym.to_hash(),
            Value::Keyword(kw) => kw.to_hash(),
            Value::List(items, _) | Value::Vector(items, _) => {
                hash::ordered(items.iter().map(Value::to_hash))
            }
            Value::Cons(_) | Value::LazySeq(_) => {
                hash::ordered(self.iter_seq().map_while(|r| r.ok()).map(|v| v.to_hash()))
            }
            Value::ArrayMap(m, _) => m.to_hash(),
            Value::HashMap(m, _) => hash::unordered(
                m.iter()
                    .map(|(k, v)| hash::map_entry(k.to_hash(), v.to_hash())),
            ),
            Value::SortedMap(m, _) => hash::unordered(
                m.iter()
                    .map(|(k, v)| hash::map_entry(k.to_hash(), v.to_hash())),
            ),
            Value::HashSet(s, _) => hash::unordered(s.iter().map(Value::to_hash)),
            Value::SortedSet(s, _) => hash::unordered(s.iter().map(Value::to_hash)),
            Value::Transient(_)
            | Value::Var(_)
            | Value::Namespace(_)
            | Value::Atom(_)
            | Value::Volatile(_)
            | Value::Multimethod(_)
            | Value::Hierarchy(_)
            | Value::Delay(_)
            | Value::Reduced(_)
            | Value::Function(_) => hash::address(self.heap_addr().unwrap_or(0)),
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

impl Value {
    pub(crate) fn meta_ref(&self) -> Option<&Meta> {
        match self {
            Value::Symbol(_, meta)
            | Value::List(_, meta)
            | Value::Vector(_, meta)
            | Value::ArrayMap(_, meta)
            | Value::HashMap(_, meta)
            | Value::SortedMap(_, meta)
            | Value::HashSet(_, meta)
            | Value::SortedSet(_, meta) => meta.as_ref(),
            _ => None,
        }
    }

    /// Metadata map of a symbol, collection or var; nil when there is none.
    pub fn meta(&self) -> Value {
        match self {
            Value::Var(var) => var.meta().unwrap_or(Value::Nil),
            _ => self.meta_ref().map_or(Value::Nil, |m| (**m).clone()),
        }
    }

    /// A copy of this symbol or collection carrying `meta`, which must be a
    /// map or nil. The copy is equal to the original. Collection copies get
    /// a fresh payload, so they are never identical to it; symbols stay
    /// interned.
    pub fn with_meta(&self, meta: Value) -> Result<Value> {
        let meta = match meta {
            Value::Nil => None,
            m if m.is_map() => Some(Arc::new(m)),
            other => {
                return Err(Error::type_error_in(
                    "with-meta",
                    "map or nil",
                    other.type_name(),
                ));
            }
        };
        Ok(match self {
            Value::Symbol(sym, _) => Value::Symbol(sym.clone(), meta),
            Value::List(items, _) => Value::List(Arc::new((**items).clone()), meta),
            Value::Vector(items, _) => Value::Vector(Arc::new((**items).clone()), meta),
            Value::ArrayMap(m, _) => Value::ArrayMap(Arc::new(m.clone_exact()), meta),
            Value::HashMap(m, _) => Value::HashMap(Arc::new((**m).clone()), meta),
            Value::SortedMap(m, _) => Value::SortedMap(Arc::new((**m).clone()), meta),
            Value::HashSet(s, _) => Value::HashSet(Arc::new((**s).clone()), meta),
            Value::SortedSet(s, _) => Value::SortedSet(Arc::new((**s).clone()), meta),
            other => {
                return Err(Error::type_error_in(
                    "with-meta",
                    "symbol or collection",
                    other.type_name(),
                ));
            }
        })
    }

    /// Replace the metadata of a var in place and return the new map.
    pub fn reset_meta(&self, meta: Value) -> Result<Value> {
        match self {
            Value::Var(var) => {
                if !meta.is_nil() && !meta.is_map() {
                    return Err(Error::type_error_in(
                        "reset-meta!",
                        "map or nil",
                        meta.type_name(),
                    ));
                }
                var.set_meta((!meta.is_nil()).then(|| meta.clone()));
                Ok(meta)
            }
            other => Err(Error::type_error_in("reset-meta!", "var", other.type_name())),
        }
    }
}

// ============================================================================
// Equality and ordering (for use as map keys and set elements)
// ============================================================================

fn maps_equal(a: &Value, b: &Value) -> bool {
    let (Some(a), Some(b)) = (a.as_map(), b.as_map()) else {
        return false;
    };
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| other == v))
}

fn sets_equal(a: &Value, b: &Value) -> bool {
    let (Some(a), Some(b)) = (a.as_set(), b.as_set()) else {
        return false;
    };
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

fn seqs_equal(a: &Value, b: &Value) -> bool {
    if let (
        Value::List(x, _) | Value::Vector(x, _),
        Value::List(y, _) | Value::Vector(y, _),
    ) = (a, b)
    {
        return x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| l == r);
    }
    let mut left = a.iter_seq();
    let mut right = b.iter_seq();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(Ok(l)), Some(Ok(r))) if l == r => continue,
            // A seq that fails to realize equals nothing.
            _ => return false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.identical(other) {
            return true;
        }
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a, _), Value::Symbol(b, _)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            _ if self.is_map() && other.is_map() => maps_equal(self, other),
            _ if self.is_set() && other.is_set() => sets_equal(self, other),
            _ if self.is_sequential() && other.is_sequential() => seqs_equal(self, other),
            // Reference types are equal only to themselves, handled above.
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn type_order(v: &Value) -> u8 {
    match v {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::Integer(_) | Value::Real(_) => 2,
        Value::Char(_) => 3,
        Value::String(_) => 4,
        Value::Symbol(..) => 5,
        Value::Keyword(_) => 6,
        Value::List(..) | Value::Vector(..) | Value::Cons(_) | Value::LazySeq(_) => 7,
        Value::ArrayMap(..) | Value::HashMap(..) | Value::SortedMap(..) => 8,
        Value::HashSet(..) | Value::SortedSet(..) => 9,
        Value::Transient(_) => 10,
        Value::Var(_) => 11,
        Value::Namespace(_) => 12,
        Value::Atom(_) => 13,
        Value::Volatile(_) => 14,
        Value::Multimethod(_) => 15,
        Value::Hierarchy(_) => 16,
        Value::Delay(_) => 17,
        Value::Function(_) => 18,
        Value::Reduced(_) => 19,
    }
}

fn compare_sorted<'a, I>(a: I, b: I) -> Ordering
where
    I: Iterator<Item = (&'a Value, &'a Value)>,
{
    let mut a: Vec<_> = a.collect();
    let mut b: Vec<_> = b.collect();
    a.sort();
    b.sort();
    a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let ta = type_order(self);
        let tb = type_order(other);
        if ta != tb {
            return ta.cmp(&tb);
        }

        match (self, other) {
            (Value::Nil, Value::Nil) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            // Integers and reals are never equal; integers sort first on ties
            (Value::Integer(a), Value::Real(b)) => {
                (*a as f64).total_cmp(b).then(Ordering::Less)
            }
            (Value::Real(a), Value::Integer(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Symbol(a, _), Value::Symbol(b, _)) => a.cmp(b),
            (Value::Keyword(a), Value::Keyword(b)) => a.cmp(b),
            _ if self.is_sequential() => {
                let a = self.iter_seq().map_while(|r| r.ok());
                let b = other.iter_seq().map_while(|r| r.ok());
                a.cmp(b)
            }
            _ if self.is_map() => match (self.as_map(), other.as_map()) {
                (Some(a), Some(b)) => compare_sorted(a.iter(), b.iter()),
                _ => Ordering::Equal,
            },
            _ if self.is_set() => match (self.as_set(), other.as_set()) {
                (Some(a), Some(b)) => {
                    let mut a: Vec<_> = a.iter().collect();
                    let mut b: Vec<_> = b.iter().collect();
                    a.sort();
                    b.sort();
                    a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
                }
                _ => Ordering::Equal,
            },
            // Identity-compared types order by address
            _ => self.heap_addr().cmp(&other.heap_addr()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.to_hash());
    }
}

// ============================================================================
// Printing
// ============================================================================

fn write_items<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: Iterator<Item = &'a Value>,
{
    let limit = get_print_length();
    for (i, item) in items.enumerate() {
        if limit.is_some_and(|n| i >= n) {
            return write!(f, " ...");
        }
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_seq(f: &mut fmt::Formatter<'_>, seq: &Value) -> fmt::Result {
    let limit = get_print_length();
    write!(f, "(")?;
    for (i, item) in seq.iter_seq().enumerate() {
        if limit.is_some_and(|n| i >= n) {
            write!(f, " ...")?;
            break;
        }
        if i > 0 {
            write!(f, " ")?;
        }
        match item {
            Ok(item) => write!(f, "{}", item)?,
            Err(_) => {
                write!(f, "...")?;
                break;
            }
        }
    }
    write!(f, ")")
}

fn write_entries<'a, I>(f: &mut fmt::Formatter<'_>, entries: I) -> fmt::Result
where
    I: Iterator<Item = (&'a Value, &'a Value)>,
{
    let limit = get_print_length();
    write!(f, "{{")?;
    for (i, (k, v)) in entries.enumerate() {
        if limit.is_some_and(|n| i >= n) {
            write!(f, " ...")?;
            break;
        }
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} {}", k, v)?;
    }
    write!(f, "}}")
}

fn format_char(c: char) -> String {
    match c {
        '\n' => "newline".to_string(),
        ' ' => "space".to_string(),
        '\t' => "tab".to_string(),
        '\r' => "return".to_string(),
        '\x08' => "backspace".to_string(),
        '\x0C' => "formfeed".to_string(),
        _ => c.to_string(),
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            _ => result.push(c),
        }
    }
    result
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(n) => {
                if n.is_nan() {
                    write!(f, "##NaN")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, "##Inf")
                    } else {
                        write!(f, "##-Inf")
                    }
                } else if n.fract() == 0.0 {
                    write!(f, "{}.0", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Char(c) => write!(f, "\\{}", format_char(*c)),
            Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Symbol(sym, _) => write!(f, "{}", sym),
            Value::Keyword(kw) => write!(f, "{}", kw),
            Value::List(items, _) => {
                write!(f, "(")?;
                write_items(f, items.iter())?;
                write!(f, ")")
            }
            Value::Cons(_) | Value::LazySeq(_) => write_seq(f, self),
            Value::Vector(items, _) => {
                write!(f, "[")?;
                write_items(f, items.iter())?;
                write!(f, "]")
            }
            Value::ArrayMap(m, _) => write_entries(f, m.iter()),
            Value::HashMap(m, _) => write_entries(f, m.iter()),
            Value::SortedMap(m, _) => write_entries(f, m.iter()),
            Value::HashSet(s, _) => {
                write!(f, "#{{")?;
                write_items(f, s.iter())?;
                write!(f, "}}")
            }
            Value::SortedSet(s, _) => {
                write!(f, "#{{")?;
                write_items(f, s.iter())?;
                write!(f, "}}")
            }
            Value::Transient(t) => write!(f, "{}", t),
            Value::Var(v) => write!(f, "{}", v),
            Value::Namespace(ns) => write!(f, "{}", ns),
            Value::Atom(a) => write!(f, "{}", a),
            Value::Volatile(v) => write!(f, "{}", v),
            Value::Multimethod(mm) => write!(f, "{}", mm),
            Value::Hierarchy(h) => write!(f, "{}", h),
            Value::Delay(d) => write!(f, "{}", d),
            Value::Reduced(r) => write!(f, "#<Reduced: {}>", r),
            Value::Function(nf) => write!(f, "{}", nf),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Real(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Keyword> for Value {
    fn from(kw: Keyword) -> Self {
        Value::Keyword(kw)
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym, None)
    }
}

// ============================================================================
// Tests
// ============================================================================
