//! The external text-provider interface.
//!
//! The host owns the persisted localization table; the engine only talks to it through
//! [`TextProvider`]: key existence, lookup, lazy registration, and the identity of the
//! runtime resolver emitted by indirect rewrites. The engine treats the table as
//! monotonic append-only -- it registers keys, never removes them.
//!
//! [`MemoryProvider`] is the in-process implementation used by tests and by hosts that
//! manage persistence themselves.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::metadata::MethodSig;

/// Key-based text store plus the runtime resolution entry point.
pub trait TextProvider {
    /// Whether a key is present in the table.
    fn exists(&self, key: &str) -> bool;

    /// The text stored under a key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when the key is absent.
    fn get_text(&self, key: &str) -> Result<String>;

    /// The text stored under a key, registering `default()` first when absent.
    fn get_or_register(&mut self, key: &str, default: &dyn Fn() -> String) -> String;

    /// Signature of the host's resolve-text-by-key method, the call target emitted by
    /// indirect rewrites. One string parameter, returns the resolved text.
    fn resolve_method(&self) -> MethodSig;
}

/// In-memory [`TextProvider`] backed by a hash map.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    entries: HashMap<String, String>,
    resolve: MethodSig,
}

impl MemoryProvider {
    /// Create an empty provider whose resolver is reported as `resolve`.
    #[must_use]
    pub fn new(resolve: MethodSig) -> Self {
        MemoryProvider {
            entries: HashMap::new(),
            resolve,
        }
    }

    /// Pre-populate an entry, as a hand-authored localization file would.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        MemoryProvider::new(MethodSig::new(
            "Host.Localization.Language",
            "GetTextValue",
            1,
            true,
        ))
    }
}

impl TextProvider for MemoryProvider {
    fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_text(&self, key: &str) -> Result<String> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    fn get_or_register(&mut self, key: &str, default: &dyn Fn() -> String) -> String {
        self.entries
            .entry(key.to_string())
            .or_insert_with(default)
            .clone()
    }

    fn resolve_method(&self) -> MethodSig {
        self.resolve.clone()
    }
}
