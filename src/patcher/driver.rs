//! Module-wide patch driving: enumeration, key assignment, and failure isolation.
//!
//! [`localize_all`] walks every loadable type and patchable method of a
//! [`LoadedModule`], assigns each method a collision-free persisted key, and invokes
//! the substitution engine. Failures are isolated per method: one method's lookup or
//! substitution failure never aborts its siblings unless `throw_on_error` is set.
//!
//! The remaining entry points are the thin conveniences layered on the same engine:
//! direct and ordered literal mapping with no keys involved, name-based lookups
//! through the [`TypeIndex`], override patching via the precomputed override map, and
//! replaying a single method against a persisted root.

use std::collections::{HashMap, HashSet};

use crate::assembly::{Instruction, MethodBody, Operand};
use crate::error::{Error, Result};
use crate::filters::site::LiteralSite;
use crate::filters::Filter;
use crate::localization::keys::{assign_key, default_root};
use crate::localization::TextProvider;
use crate::metadata::{LoadedModule, LoadedType, MethodDesc, TypeDesc, TypeIndex};
use crate::patcher::engine::{substitute_method, PatchOptions, PatchOutcome};

/// Per-domain admission filters for a driver run. `None` admits everything.
#[derive(Debug, Clone, Default)]
pub struct PatchFilters {
    /// Which declared types to visit
    pub types: Option<Filter<TypeDesc>>,
    /// Which methods to patch
    pub methods: Option<Filter<MethodDesc>>,
    /// Which literal sites to rewrite
    pub sites: Option<Filter<LiteralSite>>,
}

/// Aggregate counters from one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Types visited (after type filtering)
    pub types_visited: usize,
    /// Methods handed to the substitution engine
    pub methods_visited: usize,
    /// Methods whose body changed
    pub methods_patched: usize,
    /// Literal sites rewritten across all methods
    pub literals_rewritten: usize,
    /// Table entries freshly registered with the provider
    pub keys_registered: usize,
    /// Methods whose substitution failed and was skipped
    pub failures: usize,
}

impl PatchSummary {
    fn absorb(&mut self, outcome: PatchOutcome) {
        self.methods_visited += 1;
        if outcome.changed() {
            self.methods_patched += 1;
        }
        self.literals_rewritten += outcome.rewritten;
        self.keys_registered += outcome.registered;
    }
}

fn patchable(method: &MethodDesc) -> bool {
    !method.is_abstract && !method.is_generic
}

/// Number of patchable declarations per name, for overload-set disambiguation.
///
/// Only methods that actually reach the engine count: concrete, non-generic, with a
/// body, and admitted by the method filter when one is given. Persisted keys are
/// interop data, so an overload that is never patched must not decorate its
/// siblings' keys.
fn overload_counts(
    ty: &LoadedType,
    filter: Option<&Filter<MethodDesc>>,
) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for method in &ty.methods {
        if !patchable(&method.desc) || method.body.is_none() {
            continue;
        }
        if let Some(filter) = filter {
            if !filter.test(&method.desc) {
                continue;
            }
        }
        *counts.entry(method.desc.name.clone()).or_default() += 1;
    }
    counts
}

fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

fn localize_type(
    ty: &mut LoadedType,
    root: &str,
    provider: &mut dyn TextProvider,
    options: PatchOptions,
    filters: &PatchFilters,
    summary: &mut PatchSummary,
) -> Result<()> {
    let counts = overload_counts(ty, filters.methods.as_ref());
    let mut used_keys: HashSet<String> = HashSet::new();

    for method in &mut ty.methods {
        if !patchable(&method.desc) {
            continue;
        }
        if let Some(filter) = &filters.methods {
            if !filter.test(&method.desc) {
                continue;
            }
        }
        let Some(body) = method.body.as_mut() else {
            continue;
        };

        let overloaded = counts.get(&method.desc.name).copied().unwrap_or(0) > 1;
        let method_key = assign_key(
            root,
            &ty.desc.full_name,
            &method.desc.name,
            &method.desc.param_type_names,
            overloaded,
            |candidate| used_keys.contains(candidate),
        );
        used_keys.insert(last_segment(&method_key).to_string());

        match substitute_method(body, &method_key, provider, options, filters.sites.as_ref()) {
            Ok(outcome) => {
                tracing::debug!(
                    %method_key,
                    rewritten = outcome.rewritten,
                    registered = outcome.registered,
                    "method processed"
                );
                summary.absorb(outcome);
            }
            Err(error) => {
                if options.throw_on_error {
                    return Err(error);
                }
                tracing::error!(%method_key, %error, "substitution failed, skipping method");
                summary.failures += 1;
                summary.methods_visited += 1;
            }
        }
    }
    Ok(())
}

/// Patch every loadable type and patchable method of a module.
///
/// `root` overrides the localization root; by default it is
/// `Mods.<module-name>.ForceLocalizations`. Generic types and methods, abstract
/// methods, and bodiless methods are skipped. Method keys are unique per type: names
/// in overload sets are disambiguated with parameter type names, and residual
/// collisions get numeric suffixes against the keys already assigned this run.
///
/// # Errors
///
/// Only with `throw_on_error` set; otherwise failures are logged, counted in the
/// summary, and the walk continues.
pub fn localize_all(
    module: &mut LoadedModule,
    root: Option<&str>,
    provider: &mut dyn TextProvider,
    options: PatchOptions,
    filters: &PatchFilters,
) -> Result<PatchSummary> {
    let root = root.map_or_else(|| default_root(&module.name), str::to_string);
    let mut summary = PatchSummary::default();

    for ty in &mut module.types {
        if ty.desc.is_generic {
            continue;
        }
        if let Some(filter) = &filters.types {
            if !filter.test(&ty.desc) {
                continue;
            }
        }
        summary.types_visited += 1;
        localize_type(ty, &root, provider, options, filters, &mut summary)?;
    }

    tracing::debug!(
        types = summary.types_visited,
        methods = summary.methods_visited,
        patched = summary.methods_patched,
        rewritten = summary.literals_rewritten,
        "module pass complete"
    );
    Ok(summary)
}

/// Replay one method against a persisted root.
///
/// The method key is derived exactly as a registering run derives it for the first
/// patchable method of that name: the name, disambiguated with parameter type names
/// when the patchable overload set requires it, with no numeric suffixing. Replay
/// therefore lands on the entries that run persisted; with `register_missing` a fresh
/// table is registered under the same key.
///
/// # Errors
///
/// [`Error::MethodNotFound`] when the type declares no such method, or a body is
/// absent; provider failures as in [`substitute_method`].
pub fn localize_method_by_root(
    ty: &mut LoadedType,
    method_name: &str,
    root: &str,
    provider: &mut dyn TextProvider,
    options: PatchOptions,
    site_filter: Option<&Filter<LiteralSite>>,
) -> Result<PatchOutcome> {
    let counts = overload_counts(ty, None);
    let overloaded = counts.get(method_name).copied().unwrap_or(0) > 1;
    let type_full_name = ty.desc.full_name.clone();

    let method = ty
        .methods
        .iter_mut()
        .find(|method| method.desc.name == method_name && patchable(&method.desc))
        .ok_or_else(|| Error::MethodNotFound {
            type_name: type_full_name.clone(),
            method: method_name.to_string(),
        })?;
    let params = method.desc.param_type_names.clone();
    let body = method.body.as_mut().ok_or_else(|| Error::NoBody(format!(
        "{type_full_name}::{method_name}"
    )))?;

    // No in-memory used-set on a replay run: the first patchable method of a name
    // owns the undecorated candidate, same as during the assigning walk.
    let method_key = assign_key(root, &type_full_name, method_name, &params, overloaded, |_| {
        false
    });
    substitute_method(body, &method_key, provider, options, site_filter)
}

/// Replace every literal found in an unordered `{old -> new}` map. No keys, no
/// provider: a straight compile-time text swap.
pub fn localize_literals(body: &mut MethodBody, replacements: &HashMap<String, String>) -> usize {
    if replacements.is_empty() {
        return 0;
    }
    let mut rewritten = 0;
    let mut cursor = body.cursor();
    while cursor.seek_literal() {
        if let Some(new_text) = cursor
            .current()
            .and_then(Instruction::literal)
            .and_then(|literal| replacements.get(literal))
        {
            cursor.set_operand(Operand::Literal(new_text.clone()));
            rewritten += 1;
        }
        cursor.advance();
    }
    rewritten
}

/// Replace literals against `(old, new)` pairs consumed strictly in scan order.
///
/// A literal that does not match the next expected pair is skipped; the pass stops
/// once the last pair has been consumed. Pairs must therefore be listed for every
/// matching occurrence, including ones whose replacement equals the original.
pub fn localize_literals_in_order(body: &mut MethodBody, pairs: &[(String, String)]) -> usize {
    if pairs.is_empty() {
        return 0;
    }
    let mut next = 0;
    let mut cursor = body.cursor();
    while cursor.seek_literal() {
        let matches = cursor
            .current()
            .and_then(Instruction::literal)
            .is_some_and(|literal| literal == pairs[next].0);
        if matches {
            cursor.set_operand(Operand::Literal(pairs[next].1.clone()));
            next += 1;
            if next == pairs.len() {
                break;
            }
        }
        cursor.advance();
    }
    next
}

/// Resolve a type by short name through the index and replace literals in the named
/// method, with an unordered map.
///
/// # Errors
///
/// [`Error::TypeNotFound`] / [`Error::MethodNotFound`] on failed lookups. A duplicated
/// short name resolves to the first declaration and logs a warning; use
/// [`localize_by_type_full_name`] to disambiguate.
pub fn localize_by_type_name(
    module: &mut LoadedModule,
    index: &TypeIndex,
    type_name: &str,
    method_name: &str,
    replacements: &HashMap<String, String>,
) -> Result<usize> {
    if index.is_duplicated(type_name) {
        tracing::warn!(type_name, "short name is ambiguous, using first declaration");
    }
    let type_index = index
        .type_by_name(type_name)
        .ok_or_else(|| Error::TypeNotFound(type_name.to_string()))?;
    localize_in_method(&mut module.types[type_index], method_name, replacements)
}

/// Resolve a type by full name through the index and replace literals in the named
/// method, with an unordered map.
///
/// # Errors
///
/// [`Error::TypeFullNameNotFound`] / [`Error::MethodNotFound`] on failed lookups.
pub fn localize_by_type_full_name(
    module: &mut LoadedModule,
    index: &TypeIndex,
    type_full_name: &str,
    method_name: &str,
    replacements: &HashMap<String, String>,
) -> Result<usize> {
    let type_index = index
        .type_by_full_name(type_full_name)
        .ok_or_else(|| Error::TypeFullNameNotFound(type_full_name.to_string()))?;
    localize_in_method(&mut module.types[type_index], method_name, replacements)
}

fn localize_in_method(
    ty: &mut LoadedType,
    method_name: &str,
    replacements: &HashMap<String, String>,
) -> Result<usize> {
    let type_full_name = ty.desc.full_name.clone();
    let method = ty
        .methods
        .iter_mut()
        .find(|method| method.desc.name == method_name)
        .ok_or_else(|| Error::MethodNotFound {
            type_name: type_full_name.clone(),
            method: method_name.to_string(),
        })?;
    let body = method.body.as_mut().ok_or_else(|| Error::NoBody(format!(
        "{type_full_name}::{method_name}"
    )))?;
    Ok(localize_literals(body, replacements))
}

/// Replace literals in every override of a virtual method across the module, using
/// the override map precomputed during [`TypeIndex::build`]. With `include_self` the
/// base declaration itself is patched first.
///
/// Non-virtual base methods have no overrides; only the base declaration is patched,
/// and only when `include_self` is set.
///
/// # Errors
///
/// [`Error::TypeFullNameNotFound`] / [`Error::MethodNotFound`] when the base
/// declaration cannot be resolved.
pub fn localize_derived(
    module: &mut LoadedModule,
    index: &TypeIndex,
    base_type_full_name: &str,
    method_name: &str,
    replacements: &HashMap<String, String>,
    include_self: bool,
) -> Result<usize> {
    let base_type = index
        .type_by_full_name(base_type_full_name)
        .ok_or_else(|| Error::TypeFullNameNotFound(base_type_full_name.to_string()))?;
    let base_method = module.types[base_type]
        .methods
        .iter()
        .find(|method| method.desc.name == method_name)
        .ok_or_else(|| Error::MethodNotFound {
            type_name: base_type_full_name.to_string(),
            method: method_name.to_string(),
        })?;
    let is_virtual = base_method.desc.is_virtual;
    let params = base_method.desc.param_type_names.clone();

    let mut rewritten = 0;
    if include_self {
        if let Some(body) = module.types[base_type].methods
            .iter_mut()
            .find(|method| method.desc.name == method_name)
            .and_then(|method| method.body.as_mut())
        {
            rewritten += localize_literals(body, replacements);
        }
    }
    if !is_virtual {
        return Ok(rewritten);
    }

    for method_ref in index.overrides_of(base_type_full_name, method_name, &params) {
        let method = &mut module.types[method_ref.type_index].methods[method_ref.method_index];
        if let Some(body) = method.body.as_mut() {
            rewritten += localize_literals(body, replacements);
        }
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::localization::MemoryProvider;
    use crate::metadata::{LoadedMethod, MethodSig, TypeDesc};

    fn show() -> MethodSig {
        MethodSig::new("Host.UI.Dialog", "Show", 1, false)
    }

    fn greeting_body(text: &str) -> MethodBody {
        MethodBody::new(vec![
            Instruction::ldstr(text),
            Instruction::call(show()),
            Instruction::ret(),
        ])
    }

    fn method(ty: &Arc<TypeDesc>, name: &str, text: &str) -> LoadedMethod {
        LoadedMethod {
            desc: MethodDesc::new(Arc::clone(ty), name, ["String"], false),
            body: Some(greeting_body(text)),
        }
    }

    fn module() -> LoadedModule {
        let boss = Arc::new(TypeDesc::new("Pack.Boss"));
        let mut module = LoadedModule::new("Pack");
        module.types.push(LoadedType {
            desc: Arc::clone(&boss),
            methods: vec![
                method(&boss, "GetChat", "Hello there"),
                method(&boss, "GetChat", "Overloaded chat"),
                LoadedMethod {
                    desc: MethodDesc::new(Arc::clone(&boss), "Silent", Vec::<String>::new(), false),
                    body: Some(MethodBody::new(vec![Instruction::ret()])),
                },
            ],
        });
        module
    }

    #[test]
    fn localize_all_registers_with_disambiguated_keys() {
        let mut module = module();
        let mut provider = MemoryProvider::default();
        let options = PatchOptions {
            register_missing: true,
            ..PatchOptions::default()
        };
        let summary =
            localize_all(&mut module, None, &mut provider, options, &PatchFilters::default())
                .unwrap();

        assert_eq!(summary.types_visited, 1);
        // The bodiless-literal method is visited but skipped by the engine.
        assert_eq!(summary.methods_visited, 3);
        assert_eq!(summary.methods_patched, 2);
        assert_eq!(summary.keys_registered, 2);
        // Overloads disambiguate with parameter type names, then numeric suffixes.
        assert!(provider.exists(
            "Mods.Pack.ForceLocalizations.Pack.Boss.GetChat_String.1.OldString"
        ));
        assert!(provider.exists(
            "Mods.Pack.ForceLocalizations.Pack.Boss.GetChat_String_2.1.OldString"
        ));
    }

    #[test]
    fn method_filter_gates_patching() {
        let mut module = module();
        let mut provider = MemoryProvider::default();
        let options = PatchOptions {
            register_missing: true,
            ..PatchOptions::default()
        };
        let filters = PatchFilters {
            methods: Some(crate::filters::method::mismatch_name("GetChat")),
            ..PatchFilters::default()
        };
        let summary = localize_all(&mut module, None, &mut provider, options, &filters).unwrap();
        assert_eq!(summary.methods_patched, 0);
        assert!(provider.is_empty());
    }

    #[test]
    fn keyless_map_replacement() {
        let mut body = greeting_body("Hello there");
        let mut replacements = HashMap::new();
        replacements.insert("Hello there".to_string(), "General".to_string());
        assert_eq!(localize_literals(&mut body, &replacements), 1);
        assert_eq!(body.instructions()[0].literal(), Some("General"));
        // Unmatched literals are untouched.
        assert_eq!(localize_literals(&mut body, &replacements), 0);
    }

    #[test]
    fn ordered_pairs_consumed_in_scan_order() {
        let mut body = MethodBody::new(vec![
            Instruction::ldstr("A"),
            Instruction::ldstr("B"),
            Instruction::ldstr("A"),
            Instruction::ldstr("C"),
            Instruction::ret(),
        ]);
        let pairs = vec![
            ("A".to_string(), "a1".to_string()),
            ("A".to_string(), "a2".to_string()),
        ];
        // "B" does not match the next expected pair and is skipped; the pass stops
        // after the second pair, leaving "C" untouched.
        assert_eq!(localize_literals_in_order(&mut body, &pairs), 2);
        let literals: Vec<&str> = body
            .instructions()
            .iter()
            .filter_map(Instruction::literal)
            .collect();
        assert_eq!(literals, ["a1", "B", "a2", "C"]);
    }

    #[test]
    fn name_based_lookup_and_errors() {
        let mut module = module();
        let mut index = TypeIndex::new();
        index.build(&module);
        let mut replacements = HashMap::new();
        replacements.insert("Hello there".to_string(), "General".to_string());

        assert_eq!(
            localize_by_type_name(&mut module, &index, "Boss", "GetChat", &replacements).unwrap(),
            1
        );
        assert!(matches!(
            localize_by_type_name(&mut module, &index, "Missing", "GetChat", &replacements),
            Err(Error::TypeNotFound(_))
        ));
        assert!(matches!(
            localize_by_type_full_name(&mut module, &index, "Pack.Boss", "Missing", &replacements),
            Err(Error::MethodNotFound { .. })
        ));
    }

    #[test]
    fn derived_patching_uses_the_override_map() {
        let base = Arc::new(TypeDesc::new("Pack.BaseNpc"));
        let derived = Arc::new(
            TypeDesc::new("Pack.Boss").with_base_chain(["Pack.BaseNpc"]),
        );
        let mut module = LoadedModule::new("Pack");
        module.types.push(LoadedType {
            desc: Arc::clone(&base),
            methods: vec![LoadedMethod {
                desc: MethodDesc::new(Arc::clone(&base), "GetChat", ["String"], false).virtual_(),
                body: Some(greeting_body("Hi")),
            }],
        });
        module.types.push(LoadedType {
            desc: Arc::clone(&derived),
            methods: vec![LoadedMethod {
                desc: MethodDesc::new(Arc::clone(&derived), "GetChat", ["String"], false)
                    .virtual_(),
                body: Some(greeting_body("Hi")),
            }],
        });
        let mut index = TypeIndex::new();
        index.build(&module);

        let mut replacements = HashMap::new();
        replacements.insert("Hi".to_string(), "Bonjour".to_string());

        // Overrides only.
        let rewritten =
            localize_derived(&mut module, &index, "Pack.BaseNpc", "GetChat", &replacements, false)
                .unwrap();
        assert_eq!(rewritten, 1);
        assert_eq!(module.types[0].methods[0].body.as_ref().unwrap().instructions()[0].literal(), Some("Hi"));
        assert_eq!(module.types[1].methods[0].body.as_ref().unwrap().instructions()[0].literal(), Some("Bonjour"));

        // include_self patches the base declaration too.
        let rewritten =
            localize_derived(&mut module, &index, "Pack.BaseNpc", "GetChat", &replacements, true)
                .unwrap();
        assert_eq!(rewritten, 1);
        assert_eq!(module.types[0].methods[0].body.as_ref().unwrap().instructions()[0].literal(), Some("Bonjour"));
    }

    #[test]
    fn unpatchable_overloads_do_not_decorate_keys() {
        let boss = Arc::new(TypeDesc::new("Pack.Boss"));
        let mut ghost = MethodDesc::new(Arc::clone(&boss), "GetChat", ["Int32"], false);
        ghost.is_abstract = true;
        let mut module = LoadedModule::new("Pack");
        module.types.push(LoadedType {
            desc: Arc::clone(&boss),
            methods: vec![
                method(&boss, "GetChat", "Hello there"),
                LoadedMethod {
                    desc: ghost,
                    body: None,
                },
            ],
        });
        let mut provider = MemoryProvider::default();
        let options = PatchOptions {
            register_missing: true,
            ..PatchOptions::default()
        };
        localize_all(&mut module, None, &mut provider, options, &PatchFilters::default())
            .unwrap();

        // The abstract overload never reaches the engine, so the sole patchable
        // "GetChat" keeps the undecorated key.
        assert!(provider.exists("Mods.Pack.ForceLocalizations.Pack.Boss.GetChat.1.OldString"));
        assert!(!provider.exists(
            "Mods.Pack.ForceLocalizations.Pack.Boss.GetChat_String.1.OldString"
        ));
    }

    #[test]
    fn filtered_overloads_do_not_decorate_keys() {
        let boss = Arc::new(TypeDesc::new("Pack.Boss"));
        let mut module = LoadedModule::new("Pack");
        module.types.push(LoadedType {
            desc: Arc::clone(&boss),
            methods: vec![
                method(&boss, "GetChat", "Hello there"),
                LoadedMethod {
                    desc: MethodDesc::new(Arc::clone(&boss), "GetChat", ["Int32"], false),
                    body: Some(greeting_body("Numbered chat")),
                },
            ],
        });
        let mut provider = MemoryProvider::default();
        let options = PatchOptions {
            register_missing: true,
            ..PatchOptions::default()
        };
        let filters = PatchFilters {
            methods: Some(Filter::new(|method: &MethodDesc| {
                method.param_type_names != ["Int32"]
            })),
            ..PatchFilters::default()
        };
        localize_all(&mut module, None, &mut provider, options, &filters).unwrap();

        assert!(provider.exists("Mods.Pack.ForceLocalizations.Pack.Boss.GetChat.1.OldString"));
        assert!(!provider.exists(
            "Mods.Pack.ForceLocalizations.Pack.Boss.GetChat_String.1.OldString"
        ));
    }

    #[test]
    fn replay_by_root_applies_persisted_entries() {
        let boss = Arc::new(TypeDesc::new("Pack.Boss"));
        let mut module = LoadedModule::new("Pack");
        module.types.push(LoadedType {
            desc: Arc::clone(&boss),
            methods: vec![method(&boss, "GetChat", "Hello")],
        });
        let mut provider = MemoryProvider::default();
        let register = PatchOptions {
            register_missing: true,
            indirect: false,
            ..PatchOptions::default()
        };
        localize_all(&mut module, Some("Root"), &mut provider, register, &PatchFilters::default())
            .unwrap();
        assert!(provider.exists("Root.Pack.Boss.GetChat.1.OldString"));

        // Translate out of band, then replay the same method from a fresh body.
        provider.insert("Root.Pack.Boss.GetChat.1.NewString", "Bonjour");
        let mut ty = LoadedType {
            desc: Arc::clone(&boss),
            methods: vec![method(&boss, "GetChat", "Hello")],
        };
        let options = PatchOptions {
            indirect: false,
            ..PatchOptions::default()
        };
        let outcome =
            localize_method_by_root(&mut ty, "GetChat", "Root", &mut provider, options, None)
                .unwrap();
        assert_eq!(outcome.rewritten, 1);
        assert_eq!(
            ty.methods[0].body.as_ref().unwrap().instructions()[0].literal(),
            Some("Bonjour")
        );

        assert!(matches!(
            localize_method_by_root(
                &mut ty,
                "Missing",
                "Root",
                &mut provider,
                PatchOptions::default(),
                None,
            ),
            Err(Error::MethodNotFound { .. })
        ));
    }
}
