//! Built-in filters over type descriptors.

use std::collections::HashSet;

use crate::filters::Filter;
use crate::metadata::TypeDesc;

/// Admit the type with exactly this full name.
#[must_use]
pub fn match_full_name(full_name: impl Into<String>) -> Filter<TypeDesc> {
    let full_name = full_name.into();
    Filter::new(move |ty: &TypeDesc| ty.full_name == full_name)
}

/// Reject the type with exactly this full name.
#[must_use]
pub fn mismatch_full_name(full_name: impl Into<String>) -> Filter<TypeDesc> {
    let full_name = full_name.into();
    Filter::new(move |ty: &TypeDesc| ty.full_name != full_name)
}

/// Admit types whose full name is one of the given names.
#[must_use]
pub fn match_full_names(full_names: impl IntoIterator<Item = impl Into<String>>) -> Filter<TypeDesc> {
    let full_names: HashSet<String> = full_names.into_iter().map(Into::into).collect();
    Filter::new(move |ty: &TypeDesc| full_names.contains(&ty.full_name))
}

/// Reject types whose full name is one of the given names.
#[must_use]
pub fn mismatch_full_names(
    full_names: impl IntoIterator<Item = impl Into<String>>,
) -> Filter<TypeDesc> {
    let full_names: HashSet<String> = full_names.into_iter().map(Into::into).collect();
    Filter::new(move |ty: &TypeDesc| !full_names.contains(&ty.full_name))
}
