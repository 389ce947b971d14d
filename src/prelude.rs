//! # locpatch Prelude
//!
//! Convenient re-exports of the types most hosts need: the instruction model, the
//! filter algebra, the provider seam, and the patch entry points.

/// The main error type for all locpatch operations
pub use crate::Error;

/// The result type used throughout locpatch
pub use crate::Result;

/// Instruction model and mutable method bodies
pub use crate::assembly::{CallShape, Cursor, FlowType, Instruction, MethodBody, Operand};

/// Usage resolution
pub use crate::analysis::find_consuming_call;

/// The filter algebra and its host-profile configuration
pub use crate::filters::{DenySet, Filter, HostProfile};

/// Literal-site snapshots and built-in site filters
pub use crate::filters::site::LiteralSite;

/// Module, type, and method descriptors
pub use crate::metadata::{
    LoadedMethod, LoadedModule, LoadedType, MethodDesc, MethodSig, TypeCategories, TypeDesc,
    TypeIndex,
};

/// The external text-provider seam
pub use crate::localization::{MemoryProvider, Replacement, TextProvider};

/// Key naming convention helpers
pub use crate::localization::keys::{assign_key, default_root};

/// Patch entry points
pub use crate::patcher::{
    localize_all, localize_by_type_full_name, localize_by_type_name, localize_derived,
    localize_literals, localize_literals_in_order, localize_method_by_root, substitute_method,
    PatchFilters, PatchOptions, PatchOutcome, PatchSummary,
};
