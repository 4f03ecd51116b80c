//! Write-once instance cache.
//!
//! The cache is the only mutable state a [`crate::container::Container`] owns.
//! It maps dependency names to resolved values and is shared between explicit
//! injection and the resolver: a value seeded with
//! [`crate::container::Container::inject`] and a value instantiated during a
//! load are indistinguishable to the walker.
//!
//! # Write-Once Semantics
//!
//! A name, once bound, is never rebound. [`InstanceCache::insert`] keeps the
//! existing binding and reports the refusal instead of overwriting, which is
//! what makes at-most-once instantiation hold for sibling dependents: the first
//! resolution of a name publishes its value before any later sibling looks it
//! up. Under the single-threaded cooperative scheduling this crate is built
//! for, the interior mutex is uncontended; it exists so the cache can be shared
//! with `Send + Sync` futures, not for cross-thread coordination.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::module::ModuleValue;

/// Name -> resolved value mapping with write-once bindings.
#[derive(Debug, Default)]
pub struct InstanceCache {
    entries: Mutex<HashMap<String, ModuleValue>>,
}

impl InstanceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a binding; the returned value shares the cached payload.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ModuleValue> {
        self.entries.lock().expect("cache lock poisoned").get(name).cloned()
    }

    /// Whether a name is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().expect("cache lock poisoned").contains_key(name)
    }

    /// Bind a name, unless it is already bound.
    ///
    /// Returns `true` when the binding was created. Returns `false` - leaving
    /// the existing binding untouched - when the name was already present.
    pub fn insert(&self, name: &str, value: ModuleValue) -> bool {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if entries.contains_key(name) {
            debug!(name, "cache already holds a binding; keeping the first one");
            return false;
        }
        entries.insert(name.to_string(), value);
        true
    }

    /// Seed bindings from an injection mapping.
    ///
    /// Duplicates keep the first binding and are reported at WARN so a
    /// redefinition is never silent.
    pub fn seed<I, N>(&self, mapping: I)
    where
        I: IntoIterator<Item = (N, ModuleValue)>,
        N: Into<String>,
    {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        for (name, value) in mapping {
            let name = name.into();
            if entries.contains_key(&name) {
                warn!(name = %name, "ignoring duplicate injection; the first binding stays");
                continue;
            }
            entries.insert(name, value);
        }
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
