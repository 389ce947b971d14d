//! One-shot by-name lookup cache over a loaded module's types.
//!
//! Name-based patch entry points resolve types through a [`TypeIndex`] instead of
//! scanning the module per call. The index has a deliberate one-shot lifecycle tied to
//! the host's loading phase: `Uninitialized -> Ready -> Cleared`, driven by
//! [`TypeIndex::build`] and [`TypeIndex::clear`]. Building twice, or consulting the
//! index before it is built or after it is cleared, is a programming error and panics
//! immediately regardless of any error-mode configuration.
//!
//! Construction also precomputes the override map used for derived-method patching: a
//! reverse index from a base method's identity to every overriding declaration in the
//! module, so override patching never walks the type hierarchy at call time.

use std::collections::{HashMap, HashSet};

use crate::metadata::types::LoadedModule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum IndexState {
    #[default]
    Uninitialized,
    Ready,
    Cleared,
}

/// Position of a method within a [`LoadedModule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRef {
    /// Index of the declaring type in `module.types`
    pub type_index: usize,
    /// Index of the method in `module.types[type_index].methods`
    pub method_index: usize,
}

/// Identity of a base method whose overrides are indexed: declaring-type full name,
/// method name, and parameter-type short names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OverrideKey {
    base_type: String,
    method: String,
    params: Vec<String>,
}

/// One-shot lookup cache: short name and full name to type position, plus the
/// precomputed override map.
///
/// Short names are not unique across namespaces; [`TypeIndex::is_duplicated`] reports
/// ambiguity and [`TypeIndex::type_by_name`] returns the first declaration in module
/// order, matching how hand-authored short-name references have historically resolved.
#[derive(Debug, Default)]
pub struct TypeIndex {
    state: IndexState,
    by_name: HashMap<String, usize>,
    by_full_name: HashMap<String, usize>,
    duplicated: HashSet<String>,
    overrides: HashMap<OverrideKey, Vec<MethodRef>>,
}

impl TypeIndex {
    /// Create an uninitialized index.
    #[must_use]
    pub fn new() -> Self {
        TypeIndex::default()
    }

    /// Populate the index from a loaded module and precompute the override map.
    ///
    /// # Panics
    ///
    /// Panics if the index was already built, or was built and cleared.
    pub fn build(&mut self, module: &LoadedModule) {
        match self.state {
            IndexState::Uninitialized => {}
            IndexState::Ready => panic!("type index built twice"),
            IndexState::Cleared => panic!("type index rebuilt after teardown"),
        }

        for (type_index, ty) in module.types.iter().enumerate() {
            if let Some(first) = self.by_name.insert(ty.desc.name.clone(), type_index) {
                self.duplicated.insert(ty.desc.name.clone());
                // First declaration in module order wins.
                self.by_name.insert(ty.desc.name.clone(), first);
            }
            self.by_full_name.insert(ty.desc.full_name.clone(), type_index);

            for (method_index, method) in ty.methods.iter().enumerate() {
                if !method.desc.is_virtual {
                    continue;
                }
                for base in &ty.desc.base_chain {
                    let key = OverrideKey {
                        base_type: base.clone(),
                        method: method.desc.name.clone(),
                        params: method.desc.param_type_names.clone(),
                    };
                    self.overrides.entry(key).or_default().push(MethodRef {
                        type_index,
                        method_index,
                    });
                }
            }
        }

        self.state = IndexState::Ready;
        tracing::debug!(
            types = module.types.len(),
            duplicated = self.duplicated.len(),
            "type index built"
        );
    }

    fn assert_ready(&self) {
        match self.state {
            IndexState::Ready => {}
            IndexState::Uninitialized => panic!("type index consulted before build"),
            IndexState::Cleared => panic!("type index consulted after teardown"),
        }
    }

    /// Whether the index is built and not yet cleared.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == IndexState::Ready
    }

    /// Position of the type with the given short name, if any.
    ///
    /// When several types share the short name this returns the first declaration in
    /// module order; check [`TypeIndex::is_duplicated`] to detect the ambiguity.
    ///
    /// # Panics
    ///
    /// Panics if the index is not in the `Ready` state.
    #[must_use]
    pub fn type_by_name(&self, name: &str) -> Option<usize> {
        self.assert_ready();
        self.by_name.get(name).copied()
    }

    /// Whether more than one type in the module carries this short name.
    ///
    /// # Panics
    ///
    /// Panics if the index is not in the `Ready` state.
    #[must_use]
    pub fn is_duplicated(&self, name: &str) -> bool {
        self.assert_ready();
        self.duplicated.contains(name)
    }

    /// Position of the type with the given full name, if any.
    ///
    /// # Panics
    ///
    /// Panics if the index is not in the `Ready` state.
    #[must_use]
    pub fn type_by_full_name(&self, full_name: &str) -> Option<usize> {
        self.assert_ready();
        self.by_full_name.get(full_name).copied()
    }

    /// All overriding declarations of the named base method across the module.
    ///
    /// `params` are the parameter-type short names of the base declaration.
    ///
    /// # Panics
    ///
    /// Panics if the index is not in the `Ready` state.
    #[must_use]
    pub fn overrides_of(&self, base_type: &str, method: &str, params: &[String]) -> &[MethodRef] {
        self.assert_ready();
        let key = OverrideKey {
            base_type: base_type.to_string(),
            method: method.to_string(),
            params: params.to_vec(),
        };
        self.overrides.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Tear the index down at the end of the loading phase.
    ///
    /// After this call every lookup, and any further `build`, panics.
    pub fn clear(&mut self) {
        self.by_name = HashMap::new();
        self.by_full_name = HashMap::new();
        self.duplicated = HashSet::new();
        self.overrides = HashMap::new();
        self.state = IndexState::Cleared;
    }
}
