//! cspolicy Core Library
//!
//! Shared foundations for the cspolicy CSP Level 3 engine: ASCII utilities,
//! the value grammars, the URL model, the policy tokenizer, and the type
//! definitions (diagnostics, directive kinds, keyword sets) used by the
//! validation and query layers.
//!
//! Everything in this crate is pure computation over bounded strings: no
//! I/O, no global state, no locale-sensitive behavior.
//!
//! # Modules
//!
//! - `ascii`: ASCII-only folding, character classes, percent decoding
//! - `grammar`: scheme, host-source, nonce, hash, media-type, token grammars
//! - `url`: network and opaque URL representations
//! - `splitter`: comma/semicolon/whitespace policy tokenizer
//! - `types`: diagnostics, fetch-directive kinds, keyword bit sets

pub mod ascii;
pub mod grammar;
pub mod splitter;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use grammar::{HashAlgorithm, HashSource, HostSource, MediaType, Nonce, PortSpec, Rfc7230Token, Scheme};
pub use types::{Diagnostic, FetchKind, SandboxKeywords, Severity, SourceKeywords};
pub use url::{NetworkUrl, OpaqueUrl, Url};
