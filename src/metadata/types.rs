//! Type and method descriptors for a loaded module.
//!
//! The host's module loader enumerates a target module into a [`LoadedModule`]: plain
//! data describing every loadable declared type and its declared methods, with each
//! patchable method carrying its materialized instruction stream. The descriptors here
//! answer every question the filter algebra and the driver ask -- names, overload
//! shapes, inheritance chains, category flags -- without reaching back into the host.

use std::sync::Arc;

use bitflags::bitflags;

use crate::assembly::MethodBody;

bitflags! {
    /// Host-framework categories of a declared type.
    ///
    /// The built-in "common" method filter consults these to recognize framework
    /// lifecycle and metadata hooks whose string arguments are structural identifiers
    /// rather than user-facing prose. The host assigns categories when enumerating the
    /// module; a type may carry several.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeCategories: u32 {
        /// Content piece registered with the host framework (items, tiles, ...)
        const CONTENT = 0x0001;
        /// Non-player-character content with chat/shop hooks
        const NPC = 0x0002;
        /// Carries host-managed localized metadata (display name, tooltip)
        const LOCALIZED = 0x0004;
        /// Framework system type with load/save/world hooks
        const SYSTEM = 0x0008;
        /// The module entry type itself
        const MODULE = 0x0010;
    }
}

/// Identity and shape of a callable, as consumed by stack simulation and filters.
///
/// This is the `CallableSignature` of the data model: declaring type identity, name,
/// declared parameter count, and whether a return value is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    /// Full name of the declaring type
    pub declaring_type: String,
    /// Method name
    pub name: String,
    /// Declared parameter count
    pub param_count: u32,
    /// Whether the method declares a return value
    pub has_return: bool,
}

impl MethodSig {
    /// Build a signature.
    #[must_use]
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        param_count: u32,
        has_return: bool,
    ) -> Self {
        MethodSig {
            declaring_type: declaring_type.into(),
            name: name.into(),
            param_count,
            has_return,
        }
    }
}

/// A declared type of the target module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDesc {
    /// Short name (last segment of the full name)
    pub name: String,
    /// Namespace-qualified full name; nested types joined with `+`
    pub full_name: String,
    /// Full names of all ancestor types, nearest first
    pub base_chain: Vec<String>,
    /// Host-framework categories of this type
    pub categories: TypeCategories,
    /// Whether the type has unbound generic parameters (skipped by the driver)
    pub is_generic: bool,
}

impl TypeDesc {
    /// Build a plain type descriptor; the short name is derived from the full name.
    #[must_use]
    pub fn new(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit(['.', '+'])
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        TypeDesc {
            name,
            full_name,
            base_chain: Vec::new(),
            categories: TypeCategories::empty(),
            is_generic: false,
        }
    }

    /// Set the ancestor chain, nearest first.
    #[must_use]
    pub fn with_base_chain(mut self, chain: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.base_chain = chain.into_iter().map(Into::into).collect();
        self
    }

    /// Set the host-framework categories.
    #[must_use]
    pub fn with_categories(mut self, categories: TypeCategories) -> Self {
        self.categories = categories;
        self
    }

    /// Whether this type is `other` or derives from it.
    #[must_use]
    pub fn is_or_derives_from(&self, other_full_name: &str) -> bool {
        self.full_name == other_full_name
            || self.base_chain.iter().any(|base| base == other_full_name)
    }
}

/// A declared method of the target module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDesc {
    /// Declaring type
    pub declaring: Arc<TypeDesc>,
    /// Method name
    pub name: String,
    /// Short names of the parameter types, in declaration order
    pub param_type_names: Vec<String>,
    /// Whether the method declares a return value
    pub has_return: bool,
    /// Whether the method is abstract (no body to patch)
    pub is_abstract: bool,
    /// Whether the method is virtual (participates in override patching)
    pub is_virtual: bool,
    /// Whether the method has unbound generic parameters (skipped by the driver)
    pub is_generic: bool,
}

impl MethodDesc {
    /// Build a concrete, non-virtual method descriptor.
    #[must_use]
    pub fn new(
        declaring: Arc<TypeDesc>,
        name: impl Into<String>,
        param_type_names: impl IntoIterator<Item = impl Into<String>>,
        has_return: bool,
    ) -> Self {
        MethodDesc {
            declaring,
            name: name.into(),
            param_type_names: param_type_names.into_iter().map(Into::into).collect(),
            has_return,
            is_abstract: false,
            is_virtual: false,
            is_generic: false,
        }
    }

    /// Mark this method virtual.
    #[must_use]
    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Declared parameter count.
    #[must_use]
    pub fn param_count(&self) -> u32 {
        u32::try_from(self.param_type_names.len()).unwrap_or(u32::MAX)
    }

    /// The callable signature of this method.
    #[must_use]
    pub fn sig(&self) -> MethodSig {
        MethodSig {
            declaring_type: self.declaring.full_name.clone(),
            name: self.name.clone(),
            param_count: self.param_count(),
            has_return: self.has_return,
        }
    }
}

/// A declared method together with its instruction stream, if it has one.
#[derive(Debug, Clone)]
pub struct LoadedMethod {
    /// Descriptor of the method
    pub desc: MethodDesc,
    /// Materialized instruction stream; `None` for abstract/extern methods
    pub body: Option<MethodBody>,
}

/// A declared type together with its declared methods.
#[derive(Debug, Clone)]
pub struct LoadedType {
    /// Descriptor of the type
    pub desc: Arc<TypeDesc>,
    /// Methods declared on this type (not inherited ones)
    pub methods: Vec<LoadedMethod>,
}

/// A target module enumerated by the host: every loadable declared type with its
/// declared methods and their instruction streams.
#[derive(Debug, Clone, Default)]
pub struct LoadedModule {
    /// Module name
    pub name: String,
    /// Loadable declared types
    pub types: Vec<LoadedType>,
}

impl LoadedModule {
    /// Create an empty module shell.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        LoadedModule {
            name: name.into(),
            types: Vec::new(),
        }
    }
}
