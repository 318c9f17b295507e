// lumen-core - Persistent array map
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! A small map stored as one flat block of alternating key/value slots.
//!
//! For a handful of entries a linear scan beats hashing, so maps start out
//! in this representation and are promoted to a hash map by their callers
//! once they would grow past [`MAX_PAIRS`]. The map itself never promotes:
//! growing past the top tier is an error.
//!
//! The backing block is an `Arc<Vec<Value>>` whose length is the capacity.
//! Slots past the live length hold nil. Appends reuse a spare slot only when
//! the block is exclusively owned ([`Arc::get_mut`]); a block that another
//! map still references is copied instead, so no published map ever observes
//! a write.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Error, Result};
use crate::hash;
use crate::value::Value;

/// Largest number of pairs an array map holds.
pub const MAX_PAIRS: usize = 8;

const MAX_SLOTS: usize = MAX_PAIRS * 2;

pub struct PersistentArrayMap {
    block: Arc<Vec<Value>>,
    /// Live slots (twice the pair count).
    length: usize,
    /// Cached hash; 0 means not yet computed.
    hash: AtomicU32,
}

impl PersistentArrayMap {
    pub fn new() -> Self {
        PersistentArrayMap {
            block: Arc::new(Vec::new()),
            length: 0,
            hash: AtomicU32::new(0),
        }
    }

    /// Number of pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.length / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Block capacity in slots (always even).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    fn invalidate_hash(&self) {
        self.hash.store(0, Ordering::Relaxed);
    }

    fn index_of(&self, key: &Value) -> Option<usize> {
        let slots = &self.block[..self.length];
        match key {
            // Keywords are interned, identity is enough
            Value::Keyword(kw) => slots
                .iter()
                .step_by(2)
                .position(|k| matches!(k, Value::Keyword(other) if other == kw)),
            _ => slots.iter().step_by(2).position(|k| k == key),
        }
        .map(|pair| pair * 2)
    }

    /// Append a pair without checking for an existing key.
    ///
    /// The caller guarantees `key` is absent. Fails once the map would hold
    /// more than [`MAX_PAIRS`] pairs.
    pub fn insert_unique(&mut self, key: Value, value: Value) -> Result<()> {
        let length = self.length;
        if length + 2 <= self.block.len()
            && let Some(block) = Arc::get_mut(&mut self.block)
        {
            block[length] = key;
            block[length + 1] = value;
            self.length = length + 2;
            self.invalidate_hash();
            return Ok(());
        }

        let new_length = length + 2;
        if new_length > MAX_SLOTS {
            return Err(Error::ArrayMapOverflow {
                pairs: new_length / 2,
            });
        }

        let mut block = Vec::with_capacity(new_length);
        block.extend(self.block[..length].iter().cloned());
        block.push(key);
        block.push(value);
        self.block = Arc::new(block);
        self.length = new_length;
        self.invalidate_hash();
        Ok(())
    }

    /// Overwrite the value for `key`, or append a new pair.
    pub fn insert_or_assign(&mut self, key: Value, value: Value) -> Result<()> {
        match self.index_of(&key) {
            Some(idx) => {
                Arc::make_mut(&mut self.block)[idx + 1] = value;
                self.invalidate_hash();
                Ok(())
            }
            None => self.insert_unique(key, value),
        }
    }

    pub fn find(&self, key: &Value) -> Option<&Value> {
        self.index_of(key).map(|idx| &self.block[idx + 1])
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index_of(key).is_some()
    }

    /// Remove `key`, shifting later pairs down. No-op if absent.
    pub fn erase(&mut self, key: &Value) {
        let Some(idx) = self.index_of(key) else {
            return;
        };
        let length = self.length;
        let block = Arc::make_mut(&mut self.block);
        block[idx..length].rotate_left(2);
        block[length - 2] = Value::Nil;
        block[length - 1] = Value::Nil;
        self.length = length - 2;
        self.invalidate_hash();
    }

    /// Order-independent hash of all entries, memoized.
    ///
    /// A map whose combined hash is exactly 0 is indistinguishable from an
    /// uncomputed one and is rehashed on every call.
    pub fn to_hash(&self) -> u32 {
        let cached = self.hash.load(Ordering::Relaxed);
        if cached != 0 {
            return cached;
        }
        let computed =
            hash::unordered(self.iter().map(|(k, v)| hash::map_entry(k.to_hash(), v.to_hash())));
        self.hash.store(computed, Ordering::Relaxed);
        computed
    }

    /// Grow the block to hold at least `pairs` pairs.
    pub fn reserve(&mut self, pairs: usize) -> Result<()> {
        if pairs > MAX_PAIRS {
            return Err(Error::ArrayMapReserve { pairs });
        }
        let slots = pairs * 2;
        if slots <= self.block.len() {
            return Ok(());
        }
        let mut block = Vec::with_capacity(slots);
        block.extend(self.block[..self.length].iter().cloned());
        block.resize(slots, Value::Nil);
        self.block = Arc::new(block);
        Ok(())
    }

    /// An independent copy whose block holds exactly the live pairs.
    pub fn clone_exact(&self) -> Self {
        PersistentArrayMap {
            block: Arc::new(self.block[..self.length].to_vec()),
            length: self.length,
            hash: AtomicU32::new(self.hash.load(Ordering::Relaxed)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.block[..self.length]
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(k, _)| k)
    }

    /// True when both maps read from the same backing block.
    pub fn shares_block_with(&self, other: &PersistentArrayMap) -> bool {
        Arc::ptr_eq(&self.block, &other.block)
    }
}

impl Default for PersistentArrayMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PersistentArrayMap {
    /// Shares the block; the next write through either copy reallocates it.
    fn clone(&self) -> Self {
        PersistentArrayMap {
            block: Arc::clone(&self.block),
            length: self.length,
            hash: AtomicU32::new(self.hash.load(Ordering::Relaxed)),
        }
    }
}

impl PartialEq for PersistentArrayMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.find(k).is_some_and(|ov| ov == v))
    }
}

impl Eq for PersistentArrayMap {}

impl fmt::Debug for PersistentArrayMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
