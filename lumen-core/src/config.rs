// lumen-core - Runtime configuration
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Settings applied when a [`crate::Runtime`] is created.

/// Name of the namespace holding the runtime's own vars.
pub const DEFAULT_CORE_NS: &str = "lumen.core";

/// Namespace that is current when a runtime starts.
pub const DEFAULT_USER_NS: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub core_ns: String,
    pub user_ns: String,
    /// Maximum number of items printed per collection; `None` prints all.
    pub print_length: Option<usize>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig::default()
    }

    pub fn with_core_ns(mut self, name: impl Into<String>) -> Self {
        self.core_ns = name.into();
        self
    }

    pub fn with_user_ns(mut self, name: impl Into<String>) -> Self {
        self.user_ns = name.into();
        self
    }

    pub fn with_print_length(mut self, print_length: Option<usize>) -> Self {
        self.print_length = print_length;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            core_ns: DEFAULT_CORE_NS.to_string(),
            user_ns: DEFAULT_USER_NS.to_string(),
            print_length: None,
        }
    }
}
