//! Content Security Policy Level 3 parsing, validation, and queries
//!
//! This crate layers directive-family validators, the ordered policy
//! aggregate, and the allow/deny query engine over the grammars in
//! `csp-core`. Parsing is lossless: every directive and value round-trips
//! byte-for-byte through [`Policy`]'s `Display` implementation, and all
//! content problems are reported through a diagnostic sink rather than
//! aborting the parse.
//!
//! ```
//! use csp_policy::Policy;
//! use csp_core::url::{NetworkUrl, Url};
//!
//! let mut diagnostics = Vec::new();
//! let policy = Policy::parse("script-src 'self'; img-src *", &mut |d| diagnostics.push(d))
//!     .expect("ASCII single policy");
//! assert!(diagnostics.is_empty());
//!
//! let origin = NetworkUrl::new("https", "example.com", None, "");
//! let url = Url::parse("https://example.com/app.js").unwrap();
//! assert!(policy.allows_external_script(Some(&url), Some(&origin), None, &[], None));
//! ```

pub mod directives;
pub mod error;
pub mod policy;
pub mod query;
pub mod source_list;

pub use directives::{
    DirectiveBody, PluginTypesDirective, ReportToDirective, ReportUriDirective,
    RequireTrustedTypesForDirective, SandboxDirective, TrustedTypesDirective,
};
pub use error::{PolicyError, Result};
pub use policy::{DirectiveEntry, Policy, PolicyList};
pub use query::url_matches_source_list;
pub use source_list::{AncestorSourceDirective, SourceExpressionDirective, SourceList};
