//! The per-method substitution engine.
//!
//! [`substitute_method`] drives a single left-to-right scan over one method body:
//! every literal load is snapshotted as a [`LiteralSite`] (with its consumer resolved
//! up front), gated through the optional site filter, matched against the replacement
//! table, and rewritten exactly once. No instruction is visited twice within one call,
//! and occurrence indices in persisted keys follow strict forward scan order.
//!
//! Two modes:
//!
//! - **Replay** (`register_missing = false`) only proceeds when the persisted table
//!   already holds `<method_key>.1.OldString`; the table of original-text to
//!   [`Replacement`] descriptors is rebuilt from contiguous persisted entries.
//! - **Registration** (`register_missing = true`) additionally requires at least one
//!   literal load in the body, and bootstraps the table: unmatched literals get fresh
//!   sequential indices and lazily registered `OldString`/`NewString` pairs defaulted
//!   to the original text.
//!
//! Rewrites are atomic per site. Direct mode overwrites the literal operand with the
//! replacement text. Indirect mode inserts `ldstr <new-key>` plus a call to the
//! provider's resolve method before the site and removes the original load, so the
//! final text stays late-bound in the persisted table. Replaying over an
//! already-indirected body is a no-op: the inserted key literal sits behind the cursor
//! and the original literal is gone.

use std::collections::HashMap;

use crate::analysis::find_consuming_call;
use crate::assembly::{Instruction, MethodBody, Operand};
use crate::error::Result;
use crate::filters::site::LiteralSite;
use crate::filters::Filter;
use crate::localization::keys::{new_string_key, old_string_key, ordered_new_string_key};
use crate::localization::{Replacement, TextProvider};

/// Behavior switches for one substitution pass.
#[derive(Debug, Clone, Copy)]
pub struct PatchOptions {
    /// Registration mode: bootstrap table entries for unmatched literals.
    pub register_missing: bool,
    /// Rewrite through the provider's resolve call instead of a fixed literal.
    pub indirect: bool,
    /// Escalate lookup failures to errors instead of log-and-skip.
    pub throw_on_error: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        PatchOptions {
            register_missing: false,
            indirect: true,
            throw_on_error: false,
        }
    }
}

/// Counters from one substitution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Literal sites rewritten
    pub rewritten: usize,
    /// Table entries freshly registered with the provider
    pub registered: usize,
}

impl PatchOutcome {
    /// Whether the pass changed the method.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.rewritten > 0
    }
}

/// Rebuild the `{original text -> replacement}` table from persisted entries.
///
/// Occurrence indices are read contiguously from 1; the first absent
/// `<method_key>.<i>.OldString` terminates the table. Per entry, an existing
/// `NewString_1` selects an ordered sequence (elements `NewString_<j>`, contiguous
/// from 1, plain `NewString` as the designated default when present); otherwise a
/// plain `NewString` yields a fixed replacement. With `indirect` set the stored values
/// are the persisted keys themselves, since the rewrite defers resolution to runtime.
///
/// An entry with a higher-index `NewString_<j>` but no `NewString_1`, or with no
/// replacement at all, is internally inconsistent: it is reported and skipped rather
/// than aborting the pass.
fn build_replay_table(
    method_key: &str,
    provider: &dyn TextProvider,
    indirect: bool,
) -> Result<HashMap<String, Replacement>> {
    let mut table = HashMap::new();
    for i in 1.. {
        let old_key = old_string_key(method_key, i);
        if !provider.exists(&old_key) {
            break;
        }
        let old_text = provider.get_text(&old_key)?;

        let new_key = new_string_key(method_key, i);
        if provider.exists(&ordered_new_string_key(method_key, i, 1)) {
            let mut values = Vec::new();
            for j in 1.. {
                let element_key = ordered_new_string_key(method_key, i, j);
                if !provider.exists(&element_key) {
                    break;
                }
                values.push(if indirect {
                    element_key
                } else {
                    provider.get_text(&element_key)?
                });
            }
            let default = if provider.exists(&new_key) {
                Some(if indirect {
                    new_key
                } else {
                    provider.get_text(&new_key)?
                })
            } else {
                None
            };
            table.insert(old_text, Replacement::ordered(values, default));
        } else if provider.exists(&new_key) {
            let value = if indirect {
                new_key
            } else {
                provider.get_text(&new_key)?
            };
            table.insert(old_text, Replacement::fixed(value));
        } else {
            // NewString_2 without NewString_1 means a hand-edited table lost its
            // first element; the entry is skipped either way.
            let missing_first = provider.exists(&ordered_new_string_key(method_key, i, 2));
            tracing::warn!(
                method_key,
                index = i,
                missing_first,
                "persisted entry has no replacement, skipping"
            );
        }
    }
    Ok(table)
}

/// Run one substitution pass over a method body.
///
/// Returns without effect when the mode's precondition fails: replay mode needs the
/// persisted `<method_key>.1.OldString` entry, registration mode needs at least one
/// literal load in the body.
///
/// # Errors
///
/// Propagates provider lookup failures encountered while reading the persisted table.
pub fn substitute_method(
    body: &mut MethodBody,
    method_key: &str,
    provider: &mut dyn TextProvider,
    options: PatchOptions,
    site_filter: Option<&Filter<LiteralSite>>,
) -> Result<PatchOutcome> {
    let mut outcome = PatchOutcome::default();

    if !options.register_missing && !provider.exists(&old_string_key(method_key, 1)) {
        tracing::debug!(method_key, "no persisted entries, skipping");
        return Ok(outcome);
    }
    if options.register_missing && !body.has_literal_load() {
        tracing::debug!(method_key, "no literal loads, skipping");
        return Ok(outcome);
    }

    let mut table = build_replay_table(method_key, provider, options.indirect)?;
    let resolve = provider.resolve_method();

    let mut cursor = body.cursor();
    while cursor.seek_literal() {
        let index = cursor.index();
        let literal = match cursor.current().and_then(Instruction::literal) {
            Some(text) => text.to_string(),
            None => {
                cursor.advance();
                continue;
            }
        };

        if !table.contains_key(&literal) && !options.register_missing {
            cursor.advance();
            continue;
        }

        let consumer = find_consuming_call(cursor.instructions(), index);
        let site = LiteralSite::new(literal.clone(), index, consumer);
        if let Some(filter) = site_filter {
            if !filter.test(&site) {
                cursor.advance();
                continue;
            }
        }

        if !table.contains_key(&literal) {
            // Registration: synthesize the next occurrence index and persist the
            // pair, both sides defaulted to the original text.
            let i = table.len() + 1;
            let old_key = old_string_key(method_key, i);
            let new_key = new_string_key(method_key, i);
            provider.get_or_register(&old_key, &|| literal.clone());
            let new_text = provider.get_or_register(&new_key, &|| literal.clone());
            let value = if options.indirect { new_key } else { new_text };
            table.insert(literal.clone(), Replacement::fixed(value));
            outcome.registered += 1;
        }

        let replacement = table
            .get_mut(&literal)
            .expect("entry present after registration");
        let new_value = replacement.next_value().to_string();

        if options.indirect {
            cursor.insert_before([
                Instruction::ldstr(new_value),
                Instruction::call(resolve.clone()),
            ]);
            cursor.remove();
        } else {
            cursor.set_operand(Operand::Literal(new_value));
            cursor.advance();
        }
        outcome.rewritten += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters;
    use crate::localization::MemoryProvider;
    use crate::metadata::MethodSig;

    fn show() -> MethodSig {
        MethodSig::new("Host.UI.Dialog", "Show", 1, false)
    }

    fn greeting_body() -> MethodBody {
        MethodBody::new(vec![
            Instruction::ldstr("Hello"),
            Instruction::call(show()),
            Instruction::ret(),
        ])
    }

    fn provider_with_entry() -> MemoryProvider {
        let mut provider = MemoryProvider::default();
        provider.insert("root.T.M.1.OldString", "Hello");
        provider.insert("root.T.M.1.NewString", "key.hello");
        provider
    }

    #[test]
    fn replay_without_persisted_entries_is_a_no_op() {
        let mut body = greeting_body();
        let before = body.clone();
        let mut provider = MemoryProvider::default();
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, PatchOptions::default(), None)
                .unwrap();
        assert_eq!(outcome, PatchOutcome::default());
        assert_eq!(body, before);
    }

    #[test]
    fn replay_direct_overwrites_the_operand() {
        let mut body = greeting_body();
        let mut provider = provider_with_entry();
        let options = PatchOptions {
            indirect: false,
            ..PatchOptions::default()
        };
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, options, None).unwrap();
        assert_eq!(outcome.rewritten, 1);
        assert_eq!(body.len(), 3);
        assert_eq!(body.instructions()[0].literal(), Some("key.hello"));
    }

    #[test]
    fn replay_indirect_emits_resolve_sequence() {
        let mut body = greeting_body();
        let mut provider = provider_with_entry();
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, PatchOptions::default(), None)
                .unwrap();
        assert_eq!(outcome.rewritten, 1);
        // push "root.T.M.1.NewString"; call resolve; call Show; ret
        let instructions = body.instructions();
        assert_eq!(instructions.len(), 4);
        assert_eq!(instructions[0].literal(), Some("root.T.M.1.NewString"));
        assert_eq!(
            instructions[1].operand,
            Operand::Method(provider.resolve_method())
        );
        assert_eq!(instructions[2].operand, Operand::Method(show()));
    }

    #[test]
    fn second_indirect_pass_is_idempotent() {
        let mut body = greeting_body();
        let mut provider = provider_with_entry();
        substitute_method(&mut body, "root.T.M", &mut provider, PatchOptions::default(), None)
            .unwrap();
        let after_first = body.clone();
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, PatchOptions::default(), None)
                .unwrap();
        assert_eq!(outcome.rewritten, 0);
        assert_eq!(body, after_first);
    }

    #[test]
    fn registration_bootstraps_entries_in_scan_order() {
        let mut body = MethodBody::new(vec![
            Instruction::ldstr("First"),
            Instruction::call(show()),
            Instruction::ldstr("Second"),
            Instruction::call(show()),
            Instruction::ret(),
        ]);
        let mut provider = MemoryProvider::default();
        let options = PatchOptions {
            register_missing: true,
            ..PatchOptions::default()
        };
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, options, None).unwrap();
        assert_eq!(outcome.registered, 2);
        assert_eq!(outcome.rewritten, 2);
        assert_eq!(provider.get_text("root.T.M.1.OldString").unwrap(), "First");
        assert_eq!(provider.get_text("root.T.M.1.NewString").unwrap(), "First");
        assert_eq!(provider.get_text("root.T.M.2.OldString").unwrap(), "Second");
        assert_eq!(body.instructions()[0].literal(), Some("root.T.M.1.NewString"));
    }

    #[test]
    fn registration_respects_existing_translations() {
        let mut body = greeting_body();
        let mut provider = MemoryProvider::default();
        provider.insert("root.T.M.1.OldString", "Hello");
        provider.insert("root.T.M.1.NewString", "Bonjour");
        let options = PatchOptions {
            register_missing: true,
            indirect: false,
            ..PatchOptions::default()
        };
        substitute_method(&mut body, "root.T.M", &mut provider, options, None).unwrap();
        assert_eq!(body.instructions()[0].literal(), Some("Bonjour"));
        // The persisted translation is not clobbered.
        assert_eq!(provider.get_text("root.T.M.1.NewString").unwrap(), "Bonjour");
    }

    #[test]
    fn registration_without_literals_is_skipped() {
        let mut body = MethodBody::new(vec![Instruction::nop(), Instruction::ret()]);
        let mut provider = MemoryProvider::default();
        let options = PatchOptions {
            register_missing: true,
            ..PatchOptions::default()
        };
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, options, None).unwrap();
        assert_eq!(outcome, PatchOutcome::default());
        assert!(provider.is_empty());
    }

    #[test]
    fn ordered_sequence_consumed_across_occurrences() {
        let mut body = MethodBody::new(vec![
            Instruction::ldstr("Hi"),
            Instruction::call(show()),
            Instruction::ldstr("Hi"),
            Instruction::call(show()),
            Instruction::ldstr("Hi"),
            Instruction::call(show()),
            Instruction::ret(),
        ]);
        let mut provider = MemoryProvider::default();
        provider.insert("root.T.M.1.OldString", "Hi");
        provider.insert("root.T.M.1.NewString_1", "A");
        provider.insert("root.T.M.1.NewString_2", "B");
        provider.insert("root.T.M.1.NewString", "B");
        let options = PatchOptions {
            indirect: false,
            ..PatchOptions::default()
        };
        substitute_method(&mut body, "root.T.M", &mut provider, options, None).unwrap();
        let literals: Vec<&str> = body
            .instructions()
            .iter()
            .filter_map(Instruction::literal)
            .collect();
        assert_eq!(literals, ["A", "B", "B"]);
    }

    #[test]
    fn site_filter_gates_rewrites() {
        let mut body = greeting_body();
        let mut provider = provider_with_entry();
        let deny = filters::DenySet::from_types(["Host.UI.Dialog"]);
        let filter = filters::site::skip_consumers(deny);
        let outcome = substitute_method(
            &mut body,
            "root.T.M",
            &mut provider,
            PatchOptions::default(),
            Some(&filter),
        )
        .unwrap();
        assert_eq!(outcome.rewritten, 0);
        assert_eq!(body.instructions()[0].literal(), Some("Hello"));
    }

    #[test]
    fn malformed_ordered_entry_is_skipped() {
        let mut body = greeting_body();
        let before = body.clone();
        let mut provider = MemoryProvider::default();
        provider.insert("root.T.M.1.OldString", "Hello");
        // NewString_2 without NewString_1 and no plain NewString.
        provider.insert("root.T.M.1.NewString_2", "B");
        let options = PatchOptions {
            indirect: false,
            ..PatchOptions::default()
        };
        let outcome =
            substitute_method(&mut body, "root.T.M", &mut provider, options, None).unwrap();
        assert_eq!(outcome.rewritten, 0);
        assert_eq!(body, before);
    }
}
