//! Non-source directive families and the directive body sum type
//!
//! One variant per family keeps dispatch exhaustive: adding a directive kind
//! without teaching every consumer about it is a compile error, not a silent
//! fallthrough.

use csp_core::ascii;
use csp_core::grammar::{MediaType, Rfc7230Token};
use csp_core::types::{Diagnostic, SandboxKeywords, Severity};

use crate::source_list::{AncestorSourceDirective, SourceExpressionDirective};

/// Parsed body of a directive, by family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveBody {
    /// Fetch directives plus `base-uri`, `form-action`, `navigate-to`.
    SourceExpression(SourceExpressionDirective),
    /// `frame-ancestors`.
    Ancestors(AncestorSourceDirective),
    /// `sandbox`.
    Sandbox(SandboxDirective),
    /// `plugin-types`.
    PluginTypes(PluginTypesDirective),
    /// `report-uri`.
    ReportUri(ReportUriDirective),
    /// `report-to`.
    ReportTo(ReportToDirective),
    /// `trusted-types`.
    TrustedTypes(TrustedTypesDirective),
    /// `require-trusted-types-for`.
    RequireTrustedTypesFor(RequireTrustedTypesForDirective),
    /// `block-all-mixed-content` and `upgrade-insecure-requests`.
    Boolean,
    /// Unrecognized directives, retained verbatim for round-tripping.
    Opaque,
}

// =============================================================================
// Sandbox
// =============================================================================

/// The sandbox keyword-flag directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxDirective {
    pub keywords: SandboxKeywords,
}

impl SandboxDirective {
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        let mut directive = SandboxDirective::default();
        for (i, raw) in values.iter().enumerate() {
            let folded = ascii::fold(raw);
            match SandboxKeywords::from_keyword(&folded) {
                Some(flag) => {
                    if directive.keywords.contains(flag) {
                        sink(Diagnostic::new(
                            Severity::Warning,
                            format!("duplicate sandbox keyword '{raw}'"),
                            directive_index,
                            Some(i),
                        ));
                    } else {
                        directive.keywords |= flag;
                    }
                }
                None if folded.starts_with('\'') && folded.ends_with('\'') => {
                    sink(Diagnostic::new(
                        Severity::Error,
                        format!("sandbox keywords are not quoted: '{raw}'"),
                        directive_index,
                        Some(i),
                    ));
                }
                None => {
                    sink(Diagnostic::new(
                        Severity::Error,
                        format!("unrecognized sandbox keyword '{raw}'"),
                        directive_index,
                        Some(i),
                    ));
                }
            }
        }
        directive
    }
}

// =============================================================================
// Plugin types
// =============================================================================

/// The `plugin-types` media-type list. An empty list is explicitly valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginTypesDirective {
    pub media_types: Vec<MediaType>,
}

impl PluginTypesDirective {
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        let mut directive = PluginTypesDirective::default();
        for (i, raw) in values.iter().enumerate() {
            match MediaType::parse(raw) {
                Some(media_type) => {
                    if media_type.type_ == "*" || media_type.subtype == "*" {
                        sink(Diagnostic::new(
                            Severity::Warning,
                            format!("wildcard media type '{raw}' never matches a plugin type"),
                            directive_index,
                            Some(i),
                        ));
                    }
                    if directive.media_types.contains(&media_type) {
                        sink(Diagnostic::new(
                            Severity::Warning,
                            format!("duplicate media type '{raw}'"),
                            directive_index,
                            Some(i),
                        ));
                    } else {
                        directive.media_types.push(media_type);
                    }
                }
                None => {
                    sink(Diagnostic::new(
                        Severity::Error,
                        format!("invalid media type '{raw}'"),
                        directive_index,
                        Some(i),
                    ));
                }
            }
        }
        directive
    }
}

// =============================================================================
// Report URI / report-to
// =============================================================================

/// The deprecated `report-uri` directive. Values are retained verbatim; no
/// URI grammar is enforced. Duplicates are kept and flagged as Info only,
/// since each occurrence sends a separate report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportUriDirective {
    pub uris: Vec<String>,
}

impl ReportUriDirective {
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        sink(Diagnostic::new(
            Severity::Warning,
            "the report-uri directive is deprecated; prefer report-to",
            directive_index,
            None,
        ));
        if values.is_empty() {
            sink(Diagnostic::new(
                Severity::Error,
                "report-uri requires at least one value",
                directive_index,
                None,
            ));
        }
        let mut directive = ReportUriDirective::default();
        for (i, raw) in values.iter().enumerate() {
            if directive.uris.contains(raw) {
                sink(Diagnostic::new(
                    Severity::Info,
                    format!("duplicate report URI '{raw}'; each occurrence sends a separate report"),
                    directive_index,
                    Some(i),
                ));
            }
            directive.uris.push(raw.clone());
        }
        directive
    }
}

/// The `report-to` directive: exactly one RFC 7230 token. Zero, two or more,
/// or a malformed value leaves the endpoint unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportToDirective {
    pub endpoint: Option<Rfc7230Token>,
}

impl ReportToDirective {
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        match values {
            [] => {
                sink(Diagnostic::new(
                    Severity::Error,
                    "report-to requires exactly one endpoint name",
                    directive_index,
                    None,
                ));
                ReportToDirective::default()
            }
            [value] => match Rfc7230Token::parse(value) {
                Some(endpoint) => ReportToDirective {
                    endpoint: Some(endpoint),
                },
                None => {
                    sink(Diagnostic::new(
                        Severity::Error,
                        format!("invalid report-to endpoint name '{value}'"),
                        directive_index,
                        Some(0),
                    ));
                    ReportToDirective::default()
                }
            },
            _ => {
                sink(Diagnostic::new(
                    Severity::Error,
                    "report-to takes exactly one value",
                    directive_index,
                    None,
                ));
                ReportToDirective::default()
            }
        }
    }
}

// =============================================================================
// Trusted Types
// =============================================================================

/// The `trusted-types` policy-name allow list.
///
/// Names are case-sensitive and insertion-ordered; a same-case duplicate is
/// a Warning, a different-case name is a distinct name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedTypesDirective {
    pub allow_any: bool,
    pub allow_duplicates: bool,
    pub none: bool,
    pub policy_names: Vec<String>,
}

impl TrustedTypesDirective {
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        let mut directive = TrustedTypesDirective::default();

        if values.is_empty() {
            // Intentionally different from `*`: no values allows all names.
            sink(Diagnostic::new(
                Severity::Warning,
                "trusted-types with no values allows any policy name; use 'none' to disallow policy creation",
                directive_index,
                None,
            ));
            return directive;
        }

        for (i, raw) in values.iter().enumerate() {
            let folded = ascii::fold(raw);

            if raw == "*" {
                if directive.allow_any {
                    sink(Diagnostic::new(
                        Severity::Warning,
                        "duplicate '*'",
                        directive_index,
                        Some(i),
                    ));
                } else {
                    directive.allow_any = true;
                    sink(Diagnostic::new(
                        Severity::Warning,
                        "'*' allows any trusted types policy name, reducing the protection",
                        directive_index,
                        Some(i),
                    ));
                }
                continue;
            }

            if folded == "'allow-duplicates'" {
                if directive.allow_duplicates {
                    sink(Diagnostic::new(
                        Severity::Warning,
                        "duplicate 'allow-duplicates'",
                        directive_index,
                        Some(i),
                    ));
                } else {
                    directive.allow_duplicates = true;
                    if directive.allow_any {
                        sink(Diagnostic::new(
                            Severity::Warning,
                            "'allow-duplicates' is redundant when '*' is present",
                            directive_index,
                            Some(i),
                        ));
                    }
                }
                continue;
            }

            if folded == "'none'" {
                if values.len() > 1 {
                    sink(Diagnostic::new(
                        Severity::Error,
                        "'none' must not be combined with other trusted-types values",
                        directive_index,
                        Some(i),
                    ));
                }
                directive.none = true;
                continue;
            }

            if raw.bytes().all(ascii::is_policy_name_char) {
                if directive.policy_names.iter().any(|n| n == raw) {
                    sink(Diagnostic::new(
                        Severity::Warning,
                        format!("duplicate trusted types policy name '{raw}'"),
                        directive_index,
                        Some(i),
                    ));
                } else {
                    directive.policy_names.push(raw.clone());
                }
            } else {
                sink(Diagnostic::new(
                    Severity::Error,
                    format!("invalid trusted types policy name '{raw}'"),
                    directive_index,
                    Some(i),
                ));
            }
        }

        directive
    }
}

/// The `require-trusted-types-for` directive: only `'script'` is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireTrustedTypesForDirective {
    pub script: bool,
}

impl RequireTrustedTypesForDirective {
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        let mut directive = RequireTrustedTypesForDirective::default();
        if values.is_empty() {
            sink(Diagnostic::new(
                Severity::Error,
                "require-trusted-types-for requires the 'script' keyword",
                directive_index,
                None,
            ));
            return directive;
        }
        for (i, raw) in values.iter().enumerate() {
            let folded = ascii::fold(raw);
            if folded == "'script'" {
                if directive.script {
                    sink(Diagnostic::new(
                        Severity::Warning,
                        "duplicate 'script'",
                        directive_index,
                        Some(i),
                    ));
                } else {
                    directive.script = true;
                }
            } else if folded == "script" {
                sink(Diagnostic::new(
                    Severity::Error,
                    "the require-trusted-types-for keyword must be quoted: 'script'",
                    directive_index,
                    Some(i),
                ));
            } else {
                sink(Diagnostic::new(
                    Severity::Error,
                    format!("unrecognized require-trusted-types-for value '{raw}'"),
                    directive_index,
                    Some(i),
                ));
            }
        }
        directive
    }
}
