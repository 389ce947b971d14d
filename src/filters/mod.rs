//! Composable boolean predicates over patch candidates.
//!
//! A [`Filter`] wraps a pure predicate over one of three independent domains: literal
//! sites ([`site::LiteralSite`]), method descriptors, and type descriptors. Filters form
//! a closed algebra under [`Filter::and`], [`Filter::or`], [`Filter::not`],
//! [`Filter::all_of`] and [`Filter::any_of`]: composition always produces a new filter
//! and never mutates its operands. Filters only answer membership questions; they never
//! inspect or mutate instruction streams.
//!
//! The built-in filters live in the per-domain submodules. The host-specific knowledge
//! they depend on -- which provider types are pure text lookups, which framework types
//! take structural strings, which lifecycle hooks never carry prose -- is data, carried
//! by a [`HostProfile`], not constants baked into the predicates.
//!
//! # Key Types
//! - [`Filter`] - The generic predicate value type
//! - [`DenySet`] - A replaceable set of type full names to reject
//! - [`HostProfile`] - Host-framework deny sets and lifecycle-method tables

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub mod method;
pub mod site;
pub mod types;

/// A pure, composable predicate over a candidate domain `T`.
///
/// Cloning is cheap (the predicate is shared behind an [`Arc`]).
pub struct Filter<T: ?Sized + 'static> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: ?Sized + 'static> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Filter {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

impl<T: ?Sized + 'static> Filter<T> {
    /// Wrap a predicate.
    #[must_use]
    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Filter {
            predicate: Arc::new(predicate),
        }
    }

    /// A filter that admits everything.
    #[must_use]
    pub fn always() -> Self {
        Filter::new(|_| true)
    }

    /// Apply the filter to a candidate.
    #[must_use]
    pub fn test(&self, candidate: &T) -> bool {
        (self.predicate)(candidate)
    }

    /// Both filters must admit.
    #[must_use]
    pub fn and(&self, other: &Filter<T>) -> Filter<T> {
        let left = self.clone();
        let right = other.clone();
        Filter::new(move |candidate| left.test(candidate) && right.test(candidate))
    }

    /// Either filter may admit.
    #[must_use]
    pub fn or(&self, other: &Filter<T>) -> Filter<T> {
        let left = self.clone();
        let right = other.clone();
        Filter::new(move |candidate| left.test(candidate) || right.test(candidate))
    }

    /// Invert the filter.
    #[must_use]
    pub fn not(&self) -> Filter<T> {
        let inner = self.clone();
        Filter::new(move |candidate| !inner.test(candidate))
    }

    /// All filters must admit; empty input admits everything. Short-circuits.
    #[must_use]
    pub fn all_of(filters: impl IntoIterator<Item = Filter<T>>) -> Filter<T> {
        let filters: Vec<Filter<T>> = filters.into_iter().collect();
        Filter::new(move |candidate| filters.iter().all(|filter| filter.test(candidate)))
    }

    /// At least one filter must admit; empty input rejects everything. Short-circuits.
    #[must_use]
    pub fn any_of(filters: impl IntoIterator<Item = Filter<T>>) -> Filter<T> {
        let filters: Vec<Filter<T>> = filters.into_iter().collect();
        Filter::new(move |candidate| filters.iter().any(|filter| filter.test(candidate)))
    }
}

/// A replaceable set of type full names that are never localization targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenySet {
    types: HashSet<String>,
}

impl DenySet {
    /// An empty deny set.
    #[must_use]
    pub fn new() -> Self {
        DenySet::default()
    }

    /// Build a deny set from type full names.
    #[must_use]
    pub fn from_types(types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        DenySet {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a type full name.
    pub fn insert(&mut self, full_name: impl Into<String>) {
        self.types.insert(full_name.into());
    }

    /// Merge another deny set into this one.
    pub fn extend(&mut self, other: &DenySet) {
        self.types.extend(other.types.iter().cloned());
    }

    /// Whether the given type full name is denied.
    #[must_use]
    pub fn contains(&self, full_name: &str) -> bool {
        self.types.contains(full_name)
    }

    /// Whether the set denies nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Host-framework knowledge consumed by the built-in filters, as replaceable data.
///
/// The historical membership of these tables is host-specific and hand-curated; the
/// host wires up its own profile (or extends a shipped one) rather than this crate
/// baking the lists into code.
#[derive(Debug, Clone, Default)]
pub struct HostProfile {
    /// Narrow deny set: the host's own key-based text-lookup types. A literal consumed
    /// by one of these is already a localization key, not prose.
    pub text_lookup_types: DenySet,
    /// Broad deny set: host-framework infrastructure types whose string arguments are
    /// structural identifiers (asset paths, entity sources, shader names, ...).
    pub infrastructure_types: DenySet,
    /// Lifecycle/metadata hooks on content types whose literals are identifiers.
    pub content_lifecycle_methods: HashSet<String>,
    /// Additional hooks on NPC content types (chat buttons, shop registration).
    pub npc_lifecycle_methods: HashSet<String>,
    /// Metadata accessors on types with host-managed localized text.
    pub localized_metadata_methods: HashSet<String>,
    /// World persistence hooks on system types.
    pub system_persistence_methods: HashSet<String>,
    /// Load/unload hooks on the module entry type and system types.
    pub module_lifecycle_methods: HashSet<String>,
}

impl HostProfile {
    /// An empty profile denying nothing.
    #[must_use]
    pub fn new() -> Self {
        HostProfile::default()
    }

    /// The broad deny set: infrastructure types plus the text-lookup types.
    #[must_use]
    pub fn broad_deny_set(&self) -> DenySet {
        let mut combined = self.text_lookup_types.clone();
        combined.extend(&self.infrastructure_types);
        combined
    }
}
