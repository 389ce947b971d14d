//! Built-in filters over method descriptors.

use std::collections::HashSet;

use crate::filters::{Filter, HostProfile};
use crate::metadata::{MethodDesc, TypeCategories};

/// Admit methods with exactly this name.
#[must_use]
pub fn match_name(name: impl Into<String>) -> Filter<MethodDesc> {
    let name = name.into();
    Filter::new(move |method: &MethodDesc| method.name == name)
}

/// Reject methods with exactly this name.
#[must_use]
pub fn mismatch_name(name: impl Into<String>) -> Filter<MethodDesc> {
    let name = name.into();
    Filter::new(move |method: &MethodDesc| method.name != name)
}

/// Admit methods whose name is one of the given names.
#[must_use]
pub fn match_names(names: impl IntoIterator<Item = impl Into<String>>) -> Filter<MethodDesc> {
    let names: HashSet<String> = names.into_iter().map(Into::into).collect();
    Filter::new(move |method: &MethodDesc| names.contains(&method.name))
}

/// Reject methods whose name is one of the given names.
#[must_use]
pub fn mismatch_names(names: impl IntoIterator<Item = impl Into<String>>) -> Filter<MethodDesc> {
    let names: HashSet<String> = names.into_iter().map(Into::into).collect();
    Filter::new(move |method: &MethodDesc| !names.contains(&method.name))
}

/// Admit methods declared on the given type, or on a subtype of it when
/// `use_derived_check` is set.
#[must_use]
pub fn match_declaring_type(
    full_name: impl Into<String>,
    use_derived_check: bool,
) -> Filter<MethodDesc> {
    let full_name = full_name.into();
    if use_derived_check {
        Filter::new(move |method: &MethodDesc| method.declaring.is_or_derives_from(&full_name))
    } else {
        Filter::new(move |method: &MethodDesc| method.declaring.full_name == full_name)
    }
}

/// Admit methods declared on any of the given types, or on their subtypes when
/// `use_derived_check` is set.
#[must_use]
pub fn match_declaring_types(
    full_names: impl IntoIterator<Item = impl Into<String>>,
    use_derived_check: bool,
) -> Filter<MethodDesc> {
    let full_names: Vec<String> = full_names.into_iter().map(Into::into).collect();
    if use_derived_check {
        Filter::new(move |method: &MethodDesc| {
            full_names
                .iter()
                .any(|name| method.declaring.is_or_derives_from(name))
        })
    } else {
        let full_names: HashSet<String> = full_names.into_iter().collect();
        Filter::new(move |method: &MethodDesc| full_names.contains(&method.declaring.full_name))
    }
}

/// Reject host-framework lifecycle and metadata hooks whose string literals are
/// overwhelmingly structural identifiers (asset paths, data keys, recipe names) rather
/// than user-facing prose.
///
/// Which hooks those are is data: the profile maps each declaring-type category to the
/// method names to reject. Methods on uncategorized types are always admitted.
#[must_use]
pub fn common(profile: &HostProfile) -> Filter<MethodDesc> {
    let profile = profile.clone();
    Filter::new(move |method: &MethodDesc| {
        let categories = method.declaring.categories;
        let name = &method.name;
        if categories.contains(TypeCategories::CONTENT)
            && profile.content_lifecycle_methods.contains(name)
        {
            return false;
        }
        if categories.contains(TypeCategories::NPC) && profile.npc_lifecycle_methods.contains(name)
        {
            return false;
        }
        if categories.contains(TypeCategories::LOCALIZED)
            && profile.localized_metadata_methods.contains(name)
        {
            return false;
        }
        if categories.contains(TypeCategories::SYSTEM)
            && profile.system_persistence_methods.contains(name)
        {
            return false;
        }
        if categories.intersects(TypeCategories::MODULE | TypeCategories::SYSTEM)
            && profile.module_lifecycle_methods.contains(name)
        {
            return false;
        }
        true
    })
}
