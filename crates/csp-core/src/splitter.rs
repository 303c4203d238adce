//! Serialized-policy tokenizer
//!
//! Splitting is strict and character-exact: a policy list splits on literal
//! commas with no trimming, a policy splits on semicolons, and each directive
//! token splits on ASCII whitespace. Nothing here collapses or reorders; the
//! only normalization is whitespace trimming around directive tokens.

use crate::ascii;

/// One `;`-separated directive token with its positional index.
///
/// `index` counts every semicolon slot in the policy, including empty or
/// all-whitespace slots that produced no token. Diagnostics reference this
/// index, so the skew from skipped slots is deliberate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveToken<'a> {
    pub index: usize,
    pub name: &'a str,
    pub values: Vec<&'a str>,
}

/// Split a serialized policy list on literal commas. No trimming.
pub fn split_list(text: &str) -> Vec<&str> {
    text.split(',').collect()
}

/// Split a serialized policy into directive tokens.
///
/// Each token is trimmed of leading/trailing ASCII whitespace; empty tokens
/// are dropped but still advance the positional index.
pub fn split_policy(text: &str) -> Vec<DirectiveToken<'_>> {
    let mut tokens = Vec::new();

    for (index, raw) in text.split(';').enumerate() {
        let token = ascii::trim(raw);
        if token.is_empty() {
            continue;
        }

        let name_end = token
            .bytes()
            .position(ascii::is_whitespace)
            .unwrap_or(token.len());
        let name = &token[..name_end];
        let values = token[name_end..]
            .split(|c: char| c.is_ascii() && ascii::is_whitespace(c as u8))
            .filter(|v| !v.is_empty())
            .collect();

        tokens.push(DirectiveToken { index, name, values });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_no_trimming() {
        assert_eq!(split_list("a, b,c"), vec!["a", " b", "c"]);
        assert_eq!(split_list(""), vec![""]);
    }

    #[test]
    fn test_split_policy_basic() {
        let tokens = split_policy("default-src 'self'; img-src a b");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].name, "default-src");
        assert_eq!(tokens[0].values, vec!["'self'"]);
        assert_eq!(tokens[1].index, 1);
        assert_eq!(tokens[1].values, vec!["a", "b"]);
    }

    #[test]
    fn test_split_policy_collapses_value_whitespace() {
        let tokens = split_policy(" default-src \t a \x0C b ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "default-src");
        assert_eq!(tokens[0].values, vec!["a", "b"]);
    }

    #[test]
    fn test_split_policy_index_skew() {
        // Empty slots are skipped but still counted.
        let tokens = split_policy(";; default-src a ;; img-src b ;;");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].index, 2);
        assert_eq!(tokens[0].name, "default-src");
        assert_eq!(tokens[1].index, 4);
        assert_eq!(tokens[1].name, "img-src");
    }

    #[test]
    fn test_split_policy_name_only() {
        let tokens = split_policy("upgrade-insecure-requests");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].values.is_empty());
    }
}
