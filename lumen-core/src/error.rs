// lumen-core - Error types for the Lumen runtime core
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Error types for runtime operations.

use std::fmt;

use thiserror::Error;

use crate::symbol::Symbol;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the object model and the mutable-state primitives.
///
/// Lookup misses are never errors; they surface as `None` or `nil`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An array map was asked to grow past its largest tier.
    #[error(
        "Unable to expand array map to size {pairs}. Be sure to check the size prior to insertion and promote to hash map if needed."
    )]
    ArrayMapOverflow { pairs: usize },

    /// `reserve` was asked for more pairs than an array map can hold.
    #[error(
        "Unable to reserve an array map of size {pairs}. Be sure to check the size prior to reserving and promote to hash map if needed."
    )]
    ArrayMapReserve { pairs: usize },

    /// Several methods match and no preference picks one.
    #[error(
        "Multiple methods in multimethod '{multimethod}' match dispatch value: {dispatch_value} -> {first} and {second}, and neither is preferred"
    )]
    AmbiguousDispatch {
        multimethod: String,
        dispatch_value: String,
        first: String,
        second: String,
    },

    #[error("No method in multimethod '{multimethod}' for dispatch value: {dispatch_value}")]
    NoMethod {
        multimethod: String,
        dispatch_value: String,
    },

    /// `prefer_method` would contradict an existing preference.
    #[error("Preference conflict in multimethod '{multimethod}': {preferred} is already preferred to {other}")]
    PreferenceConflict {
        multimethod: String,
        preferred: String,
        other: String,
    },

    #[error("Pop without matching push")]
    BindingStackUnderflow,

    #[error("Can't dynamically bind non-dynamic var: {0}")]
    NonDynamicBinding(String),

    #[error("Can't change/establish root binding of: {0} with set")]
    VarNotThreadBound(String),

    #[error("Can't set!: {0} from non-binding thread")]
    SetFromForeignThread(String),

    /// Deref of a var with no root value and no thread binding.
    #[error("Var {0} is unbound")]
    UnboundVar(String),

    #[error("Unable to resolve symbol: {0}")]
    UndefinedSymbol(Symbol),

    #[error("No namespace: {0} found")]
    NoNamespace(Symbol),

    #[error("Alias {alias} already exists in namespace {namespace}, aliasing {existing}")]
    AliasConflict {
        alias: Symbol,
        namespace: Symbol,
        existing: Symbol,
    },

    #[error("{symbol} already refers to: {existing} in namespace: {namespace}")]
    ReferConflict {
        symbol: Symbol,
        existing: String,
        namespace: Symbol,
    },

    /// Wrong number of arguments to a function
    #[error("{}", format_arity(name.as_deref(), expected, *got))]
    ArityError {
        expected: AritySpec,
        got: usize,
        name: Option<String>,
    },

    /// Type error - wrong type for an operation
    #[error("{}", format_type_error(context.as_deref(), expected, got))]
    TypeError {
        expected: &'static str,
        got: &'static str,
        context: Option<String>,
    },

    #[error("Cannot call value: {0}")]
    NotCallable(String),

    /// Index out of bounds
    #[error("Index {index} out of bounds for collection of length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("Transient used after persistent! call")]
    TransientSealed,

    #[error("Invalid derivation: {0}")]
    InvalidDerivation(String),

    /// A validator rejected the new state of a reference.
    #[error("Invalid reference state")]
    InvalidReferenceState,

    /// Error raised by a user function.
    #[error("{0}")]
    Eval(String),
}

/// Specification for expected arity.
#[derive(Debug, Clone)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
}

impl fmt::Display for AritySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{}", n),
            AritySpec::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

fn format_arity(name: Option<&str>, expected: &AritySpec, got: usize) -> String {
    match name {
        Some(name) => format!(
            "Wrong number of arguments to '{}': expected {}, got {}",
            name, expected, got
        ),
        None => format!(
            "Wrong number of arguments: expected {}, got {}",
            expected, got
        ),
    }
}

fn format_type_error(context: Option<&str>, expected: &str, got: &str) -> String {
    match context {
        Some(ctx) => format!("{}: expected {}, got {}", ctx, expected, got),
        None => format!("Type error: expected {}, got {}", expected, got),
    }
}

impl Error {
    /// Create an arity error for exact arity.
    pub fn arity(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::Exact(expected),
            got,
            name: None,
        }
    }

    /// Create an arity error for exact arity with function name.
    pub fn arity_named(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::Exact(expected),
            got,
            name: Some(name.into()),
        }
    }

    /// Create an arity error for minimum arity.
    pub fn arity_at_least(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::AtLeast(expected),
            got,
            name: None,
        }
    }

    /// Create a type error.
    pub fn type_error(expected: &'static str, got: &'static str) -> Self {
        Error::TypeError {
            expected,
            got,
            context: None,
        }
    }

    /// Create a type error with context.
    pub fn type_error_in(
        context: impl Into<String>,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        Error::TypeError {
            expected,
            got,
            context: Some(context.into()),
        }
    }

    /// Create a general error from a message.
    pub fn eval(message: impl Into<String>) -> Self {
        Error::Eval(message.into())
    }
}
