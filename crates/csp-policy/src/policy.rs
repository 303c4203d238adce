//! The policy aggregate and the policy-list container
//!
//! A `Policy` keeps two views of its directives: an ordered arena of raw
//! entries, which serialization walks so output preserves input order and
//! spelling, and typed first-occurrence slots, which queries consult. A
//! duplicate directive stays in the arena (and round-trips) but never
//! displaces the slot of its first occurrence.

use std::collections::HashMap;
use std::fmt;

use csp_core::grammar::Rfc7230Token;
use csp_core::types::{Diagnostic, FetchKind, Severity};
use csp_core::{ascii, splitter};

use crate::directives::{
    DirectiveBody, PluginTypesDirective, ReportToDirective, ReportUriDirective,
    RequireTrustedTypesForDirective, SandboxDirective, TrustedTypesDirective,
};
use crate::error::{PolicyError, Result};
use crate::source_list::{AncestorSourceDirective, SourceExpressionDirective};

/// One directive as written: raw spelling plus its parsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveEntry {
    pub raw_name: String,
    pub raw_values: Vec<String>,
    pub body: DirectiveBody,
}

/// A single Content-Security-Policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    entries: Vec<DirectiveEntry>,
    fetch: HashMap<FetchKind, usize>,
    base_uri: Option<usize>,
    form_action: Option<usize>,
    navigate_to: Option<usize>,
    frame_ancestors: Option<usize>,
    sandbox: Option<usize>,
    plugin_types: Option<usize>,
    report_uri: Option<usize>,
    report_to: Option<usize>,
    trusted_types: Option<usize>,
    require_trusted_types_for: Option<usize>,
    block_all_mixed_content: bool,
    upgrade_insecure_requests: bool,
    next_index: usize,
}

impl Policy {
    pub fn new() -> Self {
        Policy::default()
    }

    /// Parse a single serialized policy.
    ///
    /// Fails only on contract violations (non-ASCII text, or a comma, which
    /// belongs to the list grammar). Malformed content inside the policy is
    /// reported through `sink` and the policy is still produced.
    pub fn parse(text: &str, sink: &mut dyn FnMut(Diagnostic)) -> Result<Policy> {
        if !text.is_ascii() {
            return Err(PolicyError::NonAscii);
        }
        if text.contains(',') {
            return Err(PolicyError::UnexpectedComma);
        }
        Ok(Policy::parse_unchecked(text, sink))
    }

    fn parse_unchecked(text: &str, sink: &mut dyn FnMut(Diagnostic)) -> Policy {
        let mut policy = Policy::default();
        for token in splitter::split_policy(text) {
            policy.add_inner(
                token.name.to_string(),
                token.values.iter().map(|v| v.to_string()).collect(),
                token.index,
                sink,
            );
        }
        if !text.is_empty() {
            // Programmatic additions continue after the last semicolon slot,
            // including trailing empty slots.
            policy.next_index = text.split(';').count();
        }
        log::debug!("parsed policy with {} directives", policy.entries.len());
        policy
    }

    /// Append a directive programmatically.
    ///
    /// The name and values must be non-empty ASCII without whitespace,
    /// commas, or semicolons; anything else is a contract error. Content
    /// problems (unknown names, bad source expressions) go to `sink`.
    pub fn add(
        &mut self,
        name: &str,
        values: &[&str],
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Result<()> {
        check_component(name, true)?;
        for value in values {
            check_component(value, false)?;
        }
        let index = self.next_index;
        self.add_inner(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
            index,
            sink,
        );
        Ok(())
    }

    fn add_inner(
        &mut self,
        name: String,
        values: Vec<String>,
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) {
        let folded = ascii::fold(&name);
        let duplicate = self
            .entries
            .iter()
            .any(|e| ascii::eq_fold(&e.raw_name, &name));
        if duplicate {
            sink(Diagnostic::new(
                Severity::Warning,
                format!("duplicate directive '{name}'"),
                directive_index,
                None,
            ));
        }

        let arena_index = self.entries.len();
        let body = if let Some(kind) = FetchKind::from_name(&folded) {
            self.warn_empty_source_list(&name, &values, directive_index, sink);
            let parsed = SourceExpressionDirective::parse(&values, directive_index, sink);
            self.fetch.entry(kind).or_insert(arena_index);
            DirectiveBody::SourceExpression(parsed)
        } else {
            match folded.as_str() {
                "base-uri" | "form-action" | "navigate-to" => {
                    self.warn_empty_source_list(&name, &values, directive_index, sink);
                    let parsed = SourceExpressionDirective::parse(&values, directive_index, sink);
                    let slot = match folded.as_str() {
                        "base-uri" => &mut self.base_uri,
                        "form-action" => &mut self.form_action,
                        _ => &mut self.navigate_to,
                    };
                    slot.get_or_insert(arena_index);
                    DirectiveBody::SourceExpression(parsed)
                }
                "frame-ancestors" => {
                    let parsed = AncestorSourceDirective::parse(&values, directive_index, sink);
                    self.frame_ancestors.get_or_insert(arena_index);
                    DirectiveBody::Ancestors(parsed)
                }
                "sandbox" => {
                    let parsed = SandboxDirective::parse(&values, directive_index, sink);
                    self.sandbox.get_or_insert(arena_index);
                    DirectiveBody::Sandbox(parsed)
                }
                "plugin-types" => {
                    let parsed = PluginTypesDirective::parse(&values, directive_index, sink);
                    self.plugin_types.get_or_insert(arena_index);
                    DirectiveBody::PluginTypes(parsed)
                }
                "report-uri" => {
                    let parsed = ReportUriDirective::parse(&values, directive_index, sink);
                    self.report_uri.get_or_insert(arena_index);
                    DirectiveBody::ReportUri(parsed)
                }
                "report-to" => {
                    let parsed = ReportToDirective::parse(&values, directive_index, sink);
                    // First valid endpoint wins; an invalid occurrence does
                    // not block a later valid one.
                    if parsed.endpoint.is_some() {
                        self.report_to.get_or_insert(arena_index);
                    }
                    DirectiveBody::ReportTo(parsed)
                }
                "trusted-types" => {
                    let parsed = TrustedTypesDirective::parse(&values, directive_index, sink);
                    self.trusted_types.get_or_insert(arena_index);
                    DirectiveBody::TrustedTypes(parsed)
                }
                "require-trusted-types-for" => {
                    let parsed =
                        RequireTrustedTypesForDirective::parse(&values, directive_index, sink);
                    self.require_trusted_types_for.get_or_insert(arena_index);
                    DirectiveBody::RequireTrustedTypesFor(parsed)
                }
                "block-all-mixed-content" => {
                    self.add_boolean(&name, &values, directive_index, duplicate, sink);
                    self.block_all_mixed_content = true;
                    DirectiveBody::Boolean
                }
                "upgrade-insecure-requests" => {
                    self.add_boolean(&name, &values, directive_index, duplicate, sink);
                    self.upgrade_insecure_requests = true;
                    DirectiveBody::Boolean
                }
                _ => {
                    sink(Diagnostic::new(
                        Severity::Warning,
                        format!("unrecognized directive '{name}'"),
                        directive_index,
                        None,
                    ));
                    if !ascii::is_wellformed_directive_name(&name) {
                        sink(Diagnostic::new(
                            Severity::Warning,
                            format!("directive name '{name}' contains unexpected characters"),
                            directive_index,
                            None,
                        ));
                    }
                    DirectiveBody::Opaque
                }
            }
        };

        self.entries.push(DirectiveEntry {
            raw_name: name,
            raw_values: values,
            body,
        });
        if directive_index >= self.next_index {
            self.next_index = directive_index + 1;
        }
    }

    fn warn_empty_source_list(
        &self,
        name: &str,
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) {
        if values.is_empty() {
            sink(Diagnostic::new(
                Severity::Warning,
                format!("{name} has no values and matches nothing; use 'none' to make this explicit"),
                directive_index,
                None,
            ));
        }
    }

    fn add_boolean(
        &self,
        name: &str,
        values: &[String],
        directive_index: usize,
        duplicate: bool,
        sink: &mut dyn FnMut(Diagnostic),
    ) {
        // The duplicate warning already covers a repeated occurrence.
        if !duplicate && !values.is_empty() {
            sink(Diagnostic::new(
                Severity::Error,
                format!("{name} does not support values"),
                directive_index,
                None,
            ));
        }
    }

    /// Remove every occurrence of a directive by case-insensitive name.
    /// Returns whether anything was removed.
    pub fn remove_directive(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !ascii::eq_fold(&e.raw_name, name));
        if self.entries.len() == before {
            return false;
        }
        self.rebuild_slots();
        true
    }

    fn rebuild_slots(&mut self) {
        self.fetch.clear();
        self.base_uri = None;
        self.form_action = None;
        self.navigate_to = None;
        self.frame_ancestors = None;
        self.sandbox = None;
        self.plugin_types = None;
        self.report_uri = None;
        self.report_to = None;
        self.trusted_types = None;
        self.require_trusted_types_for = None;
        self.block_all_mixed_content = false;
        self.upgrade_insecure_requests = false;

        for (i, entry) in self.entries.iter().enumerate() {
            let folded = ascii::fold(&entry.raw_name);
            match &entry.body {
                DirectiveBody::SourceExpression(_) => {
                    if let Some(kind) = FetchKind::from_name(&folded) {
                        self.fetch.entry(kind).or_insert(i);
                    } else {
                        let slot = match folded.as_str() {
                            "base-uri" => &mut self.base_uri,
                            "form-action" => &mut self.form_action,
                            _ => &mut self.navigate_to,
                        };
                        slot.get_or_insert(i);
                    }
                }
                DirectiveBody::Ancestors(_) => {
                    self.frame_ancestors.get_or_insert(i);
                }
                DirectiveBody::Sandbox(_) => {
                    self.sandbox.get_or_insert(i);
                }
                DirectiveBody::PluginTypes(_) => {
                    self.plugin_types.get_or_insert(i);
                }
                DirectiveBody::ReportUri(_) => {
                    self.report_uri.get_or_insert(i);
                }
                DirectiveBody::ReportTo(d) => {
                    if d.endpoint.is_some() {
                        self.report_to.get_or_insert(i);
                    }
                }
                DirectiveBody::TrustedTypes(_) => {
                    self.trusted_types.get_or_insert(i);
                }
                DirectiveBody::RequireTrustedTypesFor(_) => {
                    self.require_trusted_types_for.get_or_insert(i);
                }
                DirectiveBody::Boolean => match folded.as_str() {
                    "block-all-mixed-content" => self.block_all_mixed_content = true,
                    _ => self.upgrade_insecure_requests = true,
                },
                DirectiveBody::Opaque => {}
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Directives in written order.
    pub fn entries(&self) -> &[DirectiveEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn source_at(&self, slot: Option<usize>) -> Option<&SourceExpressionDirective> {
        slot.and_then(|i| match &self.entries[i].body {
            DirectiveBody::SourceExpression(d) => Some(d),
            _ => None,
        })
    }

    /// The fetch directive of exactly this kind, without fallback.
    pub fn fetch_directive(&self, kind: FetchKind) -> Option<&SourceExpressionDirective> {
        self.source_at(self.fetch.get(&kind).copied())
    }

    /// Walk the fallback chain and return the kind and directive that govern
    /// requests of this kind, if any directive in the chain is present.
    pub fn governing_fetch(
        &self,
        kind: FetchKind,
    ) -> Option<(FetchKind, &SourceExpressionDirective)> {
        kind.fallback_chain()
            .iter()
            .find_map(|&k| self.fetch_directive(k).map(|d| (k, d)))
    }

    pub fn base_uri(&self) -> Option<&SourceExpressionDirective> {
        self.source_at(self.base_uri)
    }

    pub fn form_action(&self) -> Option<&SourceExpressionDirective> {
        self.source_at(self.form_action)
    }

    pub fn navigate_to(&self) -> Option<&SourceExpressionDirective> {
        self.source_at(self.navigate_to)
    }

    pub fn frame_ancestors(&self) -> Option<&AncestorSourceDirective> {
        self.frame_ancestors.and_then(|i| match &self.entries[i].body {
            DirectiveBody::Ancestors(d) => Some(d),
            _ => None,
        })
    }

    pub fn sandbox(&self) -> Option<&SandboxDirective> {
        self.sandbox.and_then(|i| match &self.entries[i].body {
            DirectiveBody::Sandbox(d) => Some(d),
            _ => None,
        })
    }

    pub fn plugin_types(&self) -> Option<&PluginTypesDirective> {
        self.plugin_types.and_then(|i| match &self.entries[i].body {
            DirectiveBody::PluginTypes(d) => Some(d),
            _ => None,
        })
    }

    pub fn report_uris(&self) -> Option<&ReportUriDirective> {
        self.report_uri.and_then(|i| match &self.entries[i].body {
            DirectiveBody::ReportUri(d) => Some(d),
            _ => None,
        })
    }

    /// The reporting endpoint name, when a valid `report-to` is present.
    pub fn report_to_endpoint(&self) -> Option<&Rfc7230Token> {
        self.report_to.and_then(|i| match &self.entries[i].body {
            DirectiveBody::ReportTo(d) => d.endpoint.as_ref(),
            _ => None,
        })
    }

    pub fn trusted_types(&self) -> Option<&TrustedTypesDirective> {
        self.trusted_types.and_then(|i| match &self.entries[i].body {
            DirectiveBody::TrustedTypes(d) => Some(d),
            _ => None,
        })
    }

    pub fn require_trusted_types_for(&self) -> Option<&RequireTrustedTypesForDirective> {
        self.require_trusted_types_for
            .and_then(|i| match &self.entries[i].body {
                DirectiveBody::RequireTrustedTypesFor(d) => Some(d),
                _ => None,
            })
    }

    pub fn block_all_mixed_content(&self) -> bool {
        self.block_all_mixed_content
    }

    pub fn upgrade_insecure_requests(&self) -> bool {
        self.upgrade_insecure_requests
    }
}

impl fmt::Display for Policy {
    /// Serialize in written order, normalizing separators to `"; "` and
    /// value whitespace to single spaces. Parsing the output reproduces the
    /// same policy.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&entry.raw_name)?;
            for value in &entry.raw_values {
                write!(f, " {value}")?;
            }
        }
        Ok(())
    }
}

/// An ordered list of policies, as delivered by one or more
/// `Content-Security-Policy` header values joined by commas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyList {
    pub policies: Vec<Policy>,
}

impl PolicyList {
    /// Parse a comma-separated policy list.
    ///
    /// Each diagnostic carries the comma-slot index of its policy. Slots
    /// whose text is empty or all-whitespace produce no policy but still
    /// advance the slot count.
    pub fn parse(text: &str, sink: &mut dyn FnMut(Diagnostic)) -> Result<PolicyList> {
        if !text.is_ascii() {
            return Err(PolicyError::NonAscii);
        }
        let mut policies = Vec::new();
        for (slot, chunk) in splitter::split_list(text).into_iter().enumerate() {
            if ascii::trim(chunk).is_empty() {
                continue;
            }
            let mut scoped = |mut diagnostic: Diagnostic| {
                diagnostic.policy_index = Some(slot);
                sink(diagnostic);
            };
            policies.push(Policy::parse_unchecked(chunk, &mut scoped));
        }
        log::debug!("parsed policy list with {} policies", policies.len());
        Ok(PolicyList { policies })
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }
}

impl fmt::Display for PolicyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, policy) in self.policies.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(policy, f)?;
        }
        Ok(())
    }
}

fn check_component(text: &str, is_name: bool) -> Result<()> {
    if text.is_empty() {
        return Err(if is_name {
            PolicyError::EmptyDirectiveName
        } else {
            PolicyError::EmptyValue
        });
    }
    if !text.is_ascii() {
        return Err(PolicyError::NonAscii);
    }
    for c in text.chars() {
        if c == ',' || c == ';' || ascii::is_whitespace(c as u8) {
            return Err(if is_name {
                PolicyError::InvalidDirectiveName(c)
            } else {
                PolicyError::InvalidValue(c)
            });
        }
    }
    Ok(())
}
