//! Built-in filters over literal sites.
//!
//! A [`LiteralSite`] is the engine's snapshot of one literal-load occurrence: the
//! literal text, its position in the scan, and the consuming call as resolved by
//! [`crate::analysis::find_consuming_call`] before filters run. Consumer-based filters
//! are conservative by construction: an unresolved consumer admits the site, so
//! branch-adjacent literals are never silently excluded.

use crate::filters::{DenySet, Filter, HostProfile};
use crate::metadata::MethodSig;

/// One literal-load occurrence, snapshotted for filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralSite {
    /// The literal text pushed at this site
    pub literal: String,
    /// Position of the literal-load instruction in the method's stream
    pub index: usize,
    /// The call that consumes the literal, when usage resolution succeeded
    pub consumer: Option<MethodSig>,
}

impl LiteralSite {
    /// Snapshot a site.
    #[must_use]
    pub fn new(literal: impl Into<String>, index: usize, consumer: Option<MethodSig>) -> Self {
        LiteralSite {
            literal: literal.into(),
            index,
            consumer,
        }
    }
}

/// Reject sites whose resolved consumer is declared on a denied type; admit sites whose
/// consumer is unknown.
#[must_use]
pub fn skip_consumers(deny: DenySet) -> Filter<LiteralSite> {
    Filter::new(move |site: &LiteralSite| match &site.consumer {
        Some(consumer) => !deny.contains(&consumer.declaring_type),
        None => true,
    })
}

/// The narrow built-in: reject literals consumed by the host's own key-based
/// text-lookup types. Such literals are localization keys already.
#[must_use]
pub fn skip_text_lookup(profile: &HostProfile) -> Filter<LiteralSite> {
    skip_consumers(profile.text_lookup_types.clone())
}

/// The broad built-in: additionally reject literals consumed by host-framework
/// infrastructure types, whose string arguments are structural rather than user-facing.
#[must_use]
pub fn skip_infrastructure(profile: &HostProfile) -> Filter<LiteralSite> {
    skip_consumers(profile.broad_deny_set())
}
