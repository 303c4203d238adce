//! Contract-violation errors for the policy manipulation API
//!
//! These are the fatal tier of the two-tier error model: they indicate
//! misuse of the API (bad arguments), not a malformed policy. Malformed
//! policy content is always recovered locally and reported through the
//! diagnostic sink instead.

use thiserror::Error;

/// Errors raised for programming-contract violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Policy text and directive names/values must be ASCII.
    #[error("policy text must be ASCII")]
    NonAscii,

    /// The single-policy entry point refuses comma-separated lists.
    #[error("policy contains a comma; use PolicyList::parse for policy lists")]
    UnexpectedComma,

    /// Directive names must be non-empty.
    #[error("directive name is empty")]
    EmptyDirectiveName,

    /// Directive names must not contain whitespace, commas, or semicolons.
    #[error("directive name contains forbidden character {0:?}")]
    InvalidDirectiveName(char),

    /// Directive values must be non-empty.
    #[error("directive value is empty")]
    EmptyValue,

    /// Directive values must not contain whitespace, commas, or semicolons.
    #[error("directive value contains forbidden character {0:?}")]
    InvalidValue(char),
}

/// Result type alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
