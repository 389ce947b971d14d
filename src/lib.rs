#![doc(html_no_source)]
#![deny(missing_docs)]

//! # locpatch
//!
//! A load-time patch engine that rewrites hard-coded text literals in compiled CIL
//! method bodies, redirecting each literal to an externally editable localization
//! table -- no source access, no recompilation. The host application supplies module
//! enumeration, live instruction streams, and the key-based text provider; `locpatch`
//! supplies the analysis and the rewriting.
//!
//! ## Features
//!
//! - **Usage resolution** - Abstract stack simulation that attributes each pushed
//!   literal to the call consuming it, bailing out conservatively at any branch
//! - **Filter algebra** - Composable predicates over literal sites, methods, and
//!   types, with host-profile-driven built-in exclusion rules
//! - **Stable keys** - Deterministic, collision-free persisted keys per (type,
//!   method, occurrence), interoperable with hand-authored localization files
//! - **Replay and registration** - Rewrite from an existing table, or bootstrap the
//!   table on first run with entries defaulted to the original text
//! - **Direct and indirect rewrites** - Swap the literal text in place, or emit a
//!   late-bound lookup through the provider's resolve call
//!
//! ## Quick Start
//!
//! ```rust
//! use locpatch::prelude::*;
//!
//! // The host hands over a method body; a persisted table drives the rewrite.
//! let mut provider = MemoryProvider::default();
//! provider.insert("root.Pack.Boss.GetChat.1.OldString", "Hello");
//! provider.insert("root.Pack.Boss.GetChat.1.NewString", "key.hello");
//!
//! let mut body = MethodBody::new(vec![
//!     Instruction::ldstr("Hello"),
//!     Instruction::call(MethodSig::new("Host.UI.Dialog", "Show", 1, false)),
//!     Instruction::ret(),
//! ]);
//!
//! let outcome = substitute_method(
//!     &mut body,
//!     "root.Pack.Boss.GetChat",
//!     &mut provider,
//!     PatchOptions::default(),
//!     None,
//! )?;
//! assert_eq!(outcome.rewritten, 1);
//! # Ok::<(), locpatch::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`assembly`] - Instruction model, per-opcode stack effects, mutable bodies
//! - [`analysis`] - Usage resolution
//! - [`filters`] - The predicate algebra and built-in exclusion rules
//! - [`metadata`] - Module/type/method descriptors and the one-shot [`metadata::TypeIndex`]
//! - [`localization`] - Key convention, replacement descriptors, the provider seam
//! - [`patcher`] - The substitution engine and the module-wide driver
//! - [`Error`] and [`Result`] - Error handling

pub mod analysis;
pub mod assembly;
mod error;
pub mod filters;
pub mod localization;
pub mod metadata;
pub mod patcher;
pub mod prelude;

pub use error::{Error, Result};
