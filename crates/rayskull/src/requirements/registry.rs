//! Package name lookup.
//!
//! The merge engine asks a [`NameRegistry`] which spelling of a name exists
//! in the target channel. Lookups against a real channel are slow, so
//! [`CachedRegistry`] memoizes answers behind a mutex and can be shared.

use std::sync::{Mutex, PoisonError};

use rustc_hash::{FxHashMap, FxHashSet};

pub trait NameRegistry {
    /// Whether a package with exactly this name exists.
    fn is_available(&self, name: &str) -> bool;

    /// The first available spelling of `name`, trying it as written, then
    /// with `-` replaced by `_`, then with `_` replaced by `-`.
    fn resolve(&self, name: &str) -> Option<String> {
        candidates(name)
            .into_iter()
            .find(|candidate| self.is_available(candidate))
    }
}

/// Spellings tried for a name, in order, without repeats.
pub fn candidates(name: &str) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    for candidate in [name.replace('-', "_"), name.replace('_', "-")] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Memoizes another registry.
#[derive(Debug, Default)]
pub struct CachedRegistry<R> {
    inner: R,
    cache: Mutex<FxHashMap<String, bool>>,
}

impl<R: NameRegistry> CachedRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of distinct names looked up so far.
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<R: NameRegistry> NameRegistry for CachedRegistry<R> {
    fn is_available(&self, name: &str) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(available) = cache.get(name) {
            return *available;
        }
        let available = self.inner.is_available(name);
        tracing::trace!("Registry lookup `{name}`: {available}");
        cache.insert(name.to_string(), available);
        available
    }
}

/// A fixed set of known names.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    names: FxHashSet<String>,
}

impl StaticRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl NameRegistry for StaticRegistry {
    fn is_available(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Treats every name as available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistry;

impl NameRegistry for NoopRegistry {
    fn is_available(&self, _name: &str) -> bool {
        true
    }
}
