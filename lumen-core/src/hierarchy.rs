// lumen-core - Derivation hierarchies
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Ad-hoc taxonomies for `isa?` and multimethod dispatch.
//!
//! [`Hierarchy`] stores direct parent links and caches the transitive
//! ancestor and descendant sets. [`HierarchyRef`] is the shared, lockable
//! handle that values and multimethods hold; it bumps a version on every
//! change so dispatch caches know when to flush.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::value::Value;

// ============================================================================
// Hierarchy Type
// ============================================================================

/// Parent/child relationships between values.
#[derive(Clone, Default)]
pub struct Hierarchy {
    /// Direct parent relationships: child -> set of direct parents
    parents: HashMap<Value, HashSet<Value>>,
    /// Cached transitive ancestors: child -> set of all ancestors
    ancestors: HashMap<Value, HashSet<Value>>,
    /// Cached transitive descendants: parent -> set of all descendants
    descendants: HashMap<Value, HashSet<Value>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Hierarchy::default()
    }

    /// Make `child` derive from `parent`.
    ///
    /// Deriving from an existing direct parent is a no-op. Self-derivation,
    /// deriving from an existing indirect ancestor and cycles are rejected.
    pub fn derive(&mut self, child: Value, parent: Value) -> Result<()> {
        if child == parent {
            return Err(Error::InvalidDerivation(format!(
                "can't derive {} from itself",
                child
            )));
        }
        if self.parents.get(&child).is_some_and(|ps| ps.contains(&parent)) {
            return Ok(());
        }
        if self.ancestors.get(&child).is_some_and(|a| a.contains(&parent)) {
            return Err(Error::InvalidDerivation(format!(
                "{} already has {} as ancestor",
                child, parent
            )));
        }
        if self.ancestors.get(&parent).is_some_and(|a| a.contains(&child)) {
            return Err(Error::InvalidDerivation(format!(
                "cyclic derivation: {} has {} as ancestor",
                parent, child
            )));
        }

        self.parents
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());

        self.update_ancestors(&child);
        self.update_descendants(&child);
        Ok(())
    }

    /// Remove a direct parent link. Returns false if there was none.
    pub fn underive(&mut self, child: &Value, parent: &Value) -> bool {
        let Some(parents) = self.parents.get_mut(child) else {
            return false;
        };
        if !parents.remove(parent) {
            return false;
        }
        if parents.is_empty() {
            self.parents.remove(child);
        }
        self.recompute_all_caches();
        true
    }

    /// `isa?`: equal, a transitive descendant, or vectors of equal length
    /// whose elements are pairwise `isa?`.
    pub fn isa(&self, child: &Value, parent: &Value) -> bool {
        if child == parent {
            return true;
        }
        if self.ancestors.get(child).is_some_and(|a| a.contains(parent)) {
            return true;
        }
        match (child, parent) {
            (Value::Vector(cs, _), Value::Vector(ps, _)) if cs.len() == ps.len() => {
                cs.iter().zip(ps.iter()).all(|(c, p)| self.isa(c, p))
            }
            _ => false,
        }
    }

    pub fn parents(&self, child: &Value) -> HashSet<Value> {
        self.parents.get(child).cloned().unwrap_or_default()
    }

    pub fn ancestors(&self, child: &Value) -> HashSet<Value> {
        self.ancestors.get(child).cloned().unwrap_or_default()
    }

    pub fn descendants(&self, parent: &Value) -> HashSet<Value> {
        self.descendants.get(parent).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Update ancestors cache for a child and all its descendants.
    fn update_ancestors(&mut self, child: &Value) {
        let mut ancestors = HashSet::new();
        if let Some(direct_parents) = self.parents.get(child) {
            for parent in direct_parents {
                ancestors.insert(parent.clone());
                if let Some(parent_ancestors) = self.ancestors.get(parent) {
                    ancestors.extend(parent_ancestors.iter().cloned());
                }
            }
        }

        if ancestors.is_empty() {
            self.ancestors.remove(child);
        } else {
            self.ancestors.insert(child.clone(), ancestors);
        }

        let children: Vec<Value> = self
            .parents
            .iter()
            .filter(|(_, ps)| ps.contains(child))
            .map(|(c, _)| c.clone())
            .collect();
        for c in children {
            self.update_ancestors(&c);
        }
    }

    /// Add `child` and everything below it to the descendants of each of
    /// its ancestors.
    fn update_descendants(&mut self, child: &Value) {
        let mut subtree = self.descendants(child);
        subtree.insert(child.clone());
        for ancestor in self.ancestors(child) {
            self.descendants
                .entry(ancestor)
                .or_default()
                .extend(subtree.iter().cloned());
        }
    }

    /// Rebuild both caches from the parent links.
    fn recompute_all_caches(&mut self) {
        self.ancestors.clear();
        self.descendants.clear();

        let all_nodes: HashSet<Value> = self
            .parents
            .keys()
            .chain(self.parents.values().flat_map(|s| s.iter()))
            .cloned()
            .collect();

        // Parents before children
        let mut processed: HashSet<Value> = HashSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for node in &all_nodes {
                if processed.contains(node) {
                    continue;
                }
                let ready = self
                    .parents
                    .get(node)
                    .is_none_or(|ps| ps.iter().all(|p| processed.contains(p)));
                if !ready {
                    continue;
                }

                let mut ancestors = HashSet::new();
                if let Some(direct_parents) = self.parents.get(node) {
                    for parent in direct_parents {
                        ancestors.insert(parent.clone());
                        if let Some(parent_ancestors) = self.ancestors.get(parent) {
                            ancestors.extend(parent_ancestors.iter().cloned());
                        }
                    }
                }
                if !ancestors.is_empty() {
                    self.ancestors.insert(node.clone(), ancestors);
                }
                processed.insert(node.clone());
                changed = true;
            }
        }

        for (child, ancs) in &self.ancestors {
            for ancestor in ancs {
                self.descendants
                    .entry(ancestor.clone())
                    .or_default()
                    .insert(child.clone());
            }
        }
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Hierarchy: {} relationships>", self.parents.len())
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl PartialEq for Hierarchy {
    fn eq(&self, other: &Self) -> bool {
        self.parents == other.parents
    }
}

impl Eq for Hierarchy {}

// ============================================================================
// Shared handle
// ============================================================================

struct HierarchyState {
    hierarchy: Hierarchy,
    version: u64,
}

/// A shared, mutable hierarchy.
#[derive(Clone)]
pub struct HierarchyRef {
    inner: Arc<RwLock<HierarchyState>>,
}

impl HierarchyRef {
    pub fn new() -> Self {
        HierarchyRef::from_hierarchy(Hierarchy::new())
    }

    pub fn from_hierarchy(hierarchy: Hierarchy) -> Self {
        HierarchyRef {
            inner: Arc::new(RwLock::new(HierarchyState {
                hierarchy,
                version: 0,
            })),
        }
    }

    pub fn derive(&self, child: Value, parent: Value) -> Result<()> {
        let mut state = self.inner.write();
        state.hierarchy.derive(child, parent)?;
        state.version += 1;
        Ok(())
    }

    pub fn underive(&self, child: &Value, parent: &Value) -> bool {
        let mut state = self.inner.write();
        let removed = state.hierarchy.underive(child, parent);
        if removed {
            state.version += 1;
        }
        removed
    }

    pub fn isa(&self, child: &Value, parent: &Value) -> bool {
        self.inner.read().hierarchy.isa(child, parent)
    }

    pub fn parents(&self, child: &Value) -> HashSet<Value> {
        self.inner.read().hierarchy.parents(child)
    }

    pub fn ancestors(&self, child: &Value) -> HashSet<Value> {
        self.inner.read().hierarchy.ancestors(child)
    }

    pub fn descendants(&self, parent: &Value) -> HashSet<Value> {
        self.inner.read().hierarchy.descendants(parent)
    }

    /// Incremented by every successful `derive` or `underive`.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// A copy of the current relationships.
    pub fn snapshot(&self) -> Hierarchy {
        self.inner.read().hierarchy.clone()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl Default for HierarchyRef {
    fn default() -> Self {
        HierarchyRef::new()
    }
}

impl fmt::Display for HierarchyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.read().hierarchy)
    }
}

impl fmt::Debug for HierarchyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
