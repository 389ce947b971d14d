//! Module, type, and method descriptors plus the one-shot type lookup cache.
//!
//! The host enumerates a target module into the plain-data shapes in
//! [`types`]; name-based entry points resolve through the lifecycle-managed
//! [`TypeIndex`].
//!
//! # Key Types
//! - [`LoadedModule`] / [`LoadedType`] / [`LoadedMethod`] - Enumerated module contents
//! - [`MethodSig`] - Callable identity and stack shape
//! - [`TypeIndex`] - One-shot by-name cache with the precomputed override map

mod index;
pub mod types;

pub use index::{MethodRef, TypeIndex};
pub use types::{
    LoadedMethod, LoadedModule, LoadedType, MethodDesc, MethodSig, TypeCategories, TypeDesc,
};
