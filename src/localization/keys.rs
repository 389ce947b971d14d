//! The persisted key naming convention and method-key assignment.
//!
//! Keys interoperate with hand-authored localization files, so their shape is
//! bit-exact: `<root>.<type-full-name>.<method-key>.<i>.OldString` paired with
//! `.NewString` (optionally `.NewString_<j>` for ordered multi-value replacement).
//! Occurrence indices `i` and sequence indices `j` are contiguous from 1; the first
//! gap terminates enumeration.
//!
//! Method keys must be unique per declaring type across overload sets:
//! disambiguation appends the parameter type names, further collisions append `_2`,
//! `_3`, ... against a caller-supplied used-predicate.

/// The default localization root for a module: `Mods.<self>.ForceLocalizations`.
#[must_use]
pub fn default_root(self_name: &str) -> String {
    format!("Mods.{self_name}.ForceLocalizations")
}

/// Assign a collision-free method key under `root`.
///
/// The base candidate is the method name; with `disambiguate` set, the parameter type
/// names are appended joined by `_`. While `is_used` reports the candidate taken, `_N`
/// suffixes are tried for N = 2, 3, ... The returned key is
/// `<root>.<type_full_name>.<candidate>`.
///
/// `is_used` sees the bare candidate, not the full key: during a live scan it checks
/// the in-memory already-assigned set; when validating against a persisted table it
/// checks provider existence of the derived `<key>.<i>.OldString` entries.
#[must_use]
pub fn assign_key(
    root: &str,
    type_full_name: &str,
    method_name: &str,
    param_type_names: &[String],
    disambiguate: bool,
    mut is_used: impl FnMut(&str) -> bool,
) -> String {
    let base = if disambiguate {
        let mut base = method_name.to_string();
        for param in param_type_names {
            base.push('_');
            base.push_str(param);
        }
        base
    } else {
        method_name.to_string()
    };

    let mut candidate = base.clone();
    let mut suffix = 2u32;
    while is_used(&candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    format!("{root}.{type_full_name}.{candidate}")
}

/// `<method_key>.<i>.OldString` -- the persisted original text of occurrence `i`.
#[must_use]
pub fn old_string_key(method_key: &str, i: usize) -> String {
    format!("{method_key}.{i}.OldString")
}

/// `<method_key>.<i>.NewString` -- the replacement (or ordered-sequence default).
#[must_use]
pub fn new_string_key(method_key: &str, i: usize) -> String {
    format!("{method_key}.{i}.NewString")
}

/// `<method_key>.<i>.NewString_<j>` -- the `j`-th element of an ordered sequence.
#[must_use]
pub fn ordered_new_string_key(method_key: &str, i: usize, j: usize) -> String {
    format!("{method_key}.{i}.NewString_{j}")
}
