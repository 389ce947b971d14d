//! The patch engine: per-method substitution and module-wide driving.
//!
//! # Key Types
//! - [`substitute_method`] / [`PatchOptions`] - One method, one pass
//! - [`localize_all`] / [`PatchFilters`] / [`PatchSummary`] - Whole-module driving
//! - [`localize_literals`] / [`localize_literals_in_order`] - Keyless literal swaps

mod driver;
mod engine;

pub use driver::{
    localize_all, localize_by_type_full_name, localize_by_type_name, localize_derived,
    localize_literals, localize_literals_in_order, localize_method_by_root, PatchFilters,
    PatchSummary,
};
pub use engine::{substitute_method, PatchOptions, PatchOutcome};
