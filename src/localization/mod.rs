//! Localization table interop: keys, replacement descriptors, and the provider seam.
//!
//! # Key Types
//! - [`TextProvider`] - The host's persisted key/text table, as a trait
//! - [`Replacement`] - Fixed or ordered replacement for one original literal
//! - [`keys`] - The bit-exact persisted key naming convention

pub mod keys;
mod provider;
mod replacement;

pub use provider::{MemoryProvider, TextProvider};
pub use replacement::Replacement;
