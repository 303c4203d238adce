//! Source-list directive families
//!
//! The host-source base (shared by six directive kinds) and the
//! source-expression family layered on top of it (keywords, nonces, hashes).
//! Validation never throws for grammar mismatches and never discards raw
//! values; a value that fails every grammar is reported through the sink and
//! left inert for query purposes.

use csp_core::ascii;
use csp_core::grammar::{HashSource, HostSource, Nonce, Scheme};
use csp_core::types::{Diagnostic, Severity, SourceKeywords};

/// Shared host-source state: `*`, `'self'`, `'none'`, schemes, and hosts.
///
/// Scheme and host lists are deduplicated; the raw value list kept by the
/// owning directive entry is not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    pub star: bool,
    pub self_source: bool,
    pub none: bool,
    pub schemes: Vec<Scheme>,
    pub hosts: Vec<HostSource>,
}

/// The source-expression family: fetch directives, `base-uri`, `form-action`,
/// and `navigate-to`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceExpressionDirective {
    pub list: SourceList,
    pub keywords: SourceKeywords,
    pub nonces: Vec<Nonce>,
    pub hashes: Vec<HashSource>,
}

impl SourceExpressionDirective {
    /// Validate the raw values of a source-expression directive.
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        parse_source_values(values, directive_index, true, sink)
    }
}

/// The ancestor-source family (`frame-ancestors`): host sources only, no
/// keywords, nonces, or hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorSourceDirective {
    pub list: SourceList,
}

impl AncestorSourceDirective {
    /// Validate the raw values of a `frame-ancestors` directive.
    pub fn parse(
        values: &[String],
        directive_index: usize,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Self {
        if values.is_empty() {
            sink(Diagnostic::new(
                Severity::Error,
                "frame-ancestors requires at least one value; use 'none' to disallow framing",
                directive_index,
                None,
            ));
        }
        let parsed = parse_source_values(values, directive_index, false, sink);
        AncestorSourceDirective { list: parsed.list }
    }
}

/// Classify each raw value in order. `with_keywords` admits the quoted
/// keyword, nonce, and hash grammars (false for `frame-ancestors`).
fn parse_source_values(
    values: &[String],
    directive_index: usize,
    with_keywords: bool,
    sink: &mut dyn FnMut(Diagnostic),
) -> SourceExpressionDirective {
    let mut directive = SourceExpressionDirective::default();
    let mut seen_none = false;
    let mut seen_any = false;

    let mut emit = |severity, message: String, value_index| {
        sink(Diagnostic::new(
            severity,
            message,
            directive_index,
            Some(value_index),
        ))
    };

    for (i, raw) in values.iter().enumerate() {
        let folded = ascii::fold(raw);

        if folded == "'none'" {
            if seen_any {
                emit(
                    Severity::Error,
                    "'none' must not be combined with any other source expression".to_string(),
                    i,
                );
            }
            directive.list.none = true;
            seen_none = true;
            seen_any = true;
            continue;
        }
        if seen_none {
            emit(
                Severity::Error,
                "'none' must not be combined with any other source expression".to_string(),
                i,
            );
            // The 'none' is ignored for queries; keep classifying so the
            // remaining values behave as written.
            seen_none = false;
        }
        seen_any = true;

        if raw == "*" {
            if directive.list.star {
                emit(Severity::Warning, duplicate_message(raw), i);
            } else {
                directive.list.star = true;
            }
            continue;
        }

        if folded == "'self'" {
            if directive.list.self_source {
                emit(Severity::Warning, duplicate_message(raw), i);
            } else {
                directive.list.self_source = true;
            }
            continue;
        }

        if with_keywords && classify_keyword(&mut directive, raw, &folded, i, &mut emit) {
            continue;
        }

        if let Some(scheme) = Scheme::parse(raw) {
            if directive.list.schemes.contains(&scheme) {
                emit(Severity::Warning, duplicate_message(raw), i);
            } else {
                directive.list.schemes.push(scheme);
            }
            continue;
        }

        if let Some(keyword) = unquoted_keyword(&folded) {
            emit(
                Severity::Warning,
                format!("value '{raw}' appears to be a keyword missing its quotes; did you mean '{keyword}'?"),
                i,
            );
            continue;
        }

        if let Some(host) = HostSource::parse(raw) {
            if directive.list.hosts.contains(&host) {
                emit(Severity::Warning, duplicate_message(raw), i);
            } else {
                directive.list.hosts.push(host);
            }
            continue;
        }

        emit(
            Severity::Error,
            format!("unrecognized source expression '{raw}'"),
            i,
        );
    }

    directive
}

/// Try the quoted keyword, nonce, and hash grammars. Returns true when the
/// value was consumed (successfully or with a diagnostic).
fn classify_keyword(
    directive: &mut SourceExpressionDirective,
    raw: &str,
    folded: &str,
    value_index: usize,
    emit: &mut impl FnMut(Severity, String, usize),
) -> bool {
    if let Some(keyword) = SourceKeywords::from_token(folded) {
        if directive.keywords.contains(keyword) {
            emit(Severity::Warning, duplicate_message(raw), value_index);
        } else {
            directive.keywords |= keyword;
        }
        return true;
    }

    // Legacy spellings recognized only to point at their replacement.
    if folded == "'unsafe-redirect'" {
        emit(
            Severity::Error,
            "'unsafe-redirect' was removed; use 'unsafe-allow-redirects'".to_string(),
            value_index,
        );
        return true;
    }
    if folded == "'unsafe-hashed-attributes'" {
        emit(
            Severity::Error,
            "'unsafe-hashed-attributes' was renamed; use 'unsafe-hashes'".to_string(),
            value_index,
        );
        return true;
    }

    if folded.starts_with("'nonce-") {
        match Nonce::parse(raw) {
            Some(nonce) => {
                if directive.nonces.contains(&nonce) {
                    emit(Severity::Warning, duplicate_message(raw), value_index);
                } else {
                    directive.nonces.push(nonce);
                }
            }
            None => emit(
                Severity::Error,
                format!("invalid base64 value in nonce '{raw}'"),
                value_index,
            ),
        }
        return true;
    }

    if folded.starts_with("'sha256-")
        || folded.starts_with("'sha384-")
        || folded.starts_with("'sha512-")
    {
        match HashSource::parse(raw) {
            Some(hash) => {
                let expected = hash.algorithm.base64_digest_len();
                if hash.payload.len() != expected {
                    emit(
                        Severity::Warning,
                        format!(
                            "'{}' hash payload should be {} base64 characters, found {}",
                            hash.algorithm,
                            expected,
                            hash.payload.len()
                        ),
                        value_index,
                    );
                }
                if directive.hashes.contains(&hash) {
                    emit(Severity::Warning, duplicate_message(raw), value_index);
                } else {
                    directive.hashes.push(hash);
                }
            }
            None => emit(
                Severity::Error,
                format!("invalid base64 value in hash '{raw}'"),
                value_index,
            ),
        }
        return true;
    }

    false
}

/// Recognize unquoted spellings of keywords for a targeted warning.
fn unquoted_keyword(folded: &str) -> Option<String> {
    const KEYWORDS: [&str; 10] = [
        "none",
        "self",
        "unsafe-inline",
        "unsafe-eval",
        "strict-dynamic",
        "unsafe-hashes",
        "report-sample",
        "unsafe-allow-redirects",
        "unsafe-redirect",
        "unsafe-hashed-attributes",
    ];
    if KEYWORDS.contains(&folded)
        || folded.starts_with("nonce-")
        || folded.starts_with("sha256-")
        || folded.starts_with("sha384-")
        || folded.starts_with("sha512-")
    {
        return Some(folded.to_string());
    }
    None
}

fn duplicate_message(raw: &str) -> String {
    format!("duplicate source expression '{raw}'")
}
