// lumen-core - Object model and mutable-state primitives for the Lumen runtime
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! # lumen-core
//!
//! The value layer of the Lumen runtime: a closed [`Value`] enum over
//! immediates, interned symbols and keywords, persistent collections and
//! reference types, plus the primitives that manage shared mutable state.
//!
//! - Persistent collections, including the small-map [`PersistentArrayMap`]
//!   that promotes to a hash map past eight entries, and [`Transient`]
//!   handles for building them in place.
//! - [`Var`]s interned in [`Namespace`]s, with per-thread dynamic binding
//!   via [`bindings`].
//! - [`Atom`]s and [`Volatile`]s.
//! - [`Multimethod`]s dispatching through a [`Hierarchy`].
//! - [`Delay`] and [`LazySeq`] for deferred computation.
//! - Metadata on symbols and collections, and `reduce` with early exit
//!   through [`Value::reduced`].
//!
//! Evaluation, reading and printing beyond `Display` belong to other crates.

// Values hash by content and use interior mutability only in reference
// types, which hash by identity.
#![allow(clippy::mutable_key_type)]

pub mod array_map;
pub mod atom;
pub mod bindings;
pub mod collections;
pub mod config;
pub mod error;
pub mod function;
pub mod hash;
pub mod hierarchy;
pub mod keyword;
pub mod lazy;
pub mod multimethod;
pub mod namespace;
pub mod reduce;
pub mod runtime;
pub mod seq;
pub mod symbol;
pub mod transient;
pub mod value;
pub mod var;

pub use array_map::PersistentArrayMap;
pub use atom::{Atom, Volatile};
pub use bindings::{
    BindingFrame, BindingGuard, clone_thread_binding_frame, get_thread_bindings,
    pop_thread_bindings, push_bindings, push_thread_bindings, reset_thread_binding_frame,
    with_bindings,
};
pub use collections::{MapView, SetView};
pub use config::RuntimeConfig;
pub use error::{AritySpec, Error, Result};
pub use function::NativeFn;
pub use hierarchy::{Hierarchy, HierarchyRef};
pub use keyword::Keyword;
pub use lazy::{Delay, LazySeq};
pub use multimethod::Multimethod;
pub use namespace::Namespace;
pub use runtime::Runtime;
pub use seq::{Cons, SeqIter};
pub use symbol::Symbol;
pub use transient::Transient;
pub use value::{Meta, ObjectType, Value, get_print_length, set_print_length};
pub use var::Var;
