//! ASCII utilities shared by every layer
//!
//! All case-insensitive comparisons in CSP are ASCII-only by definition.
//! A locale-aware lowercase (e.g. under a Turkish locale) would corrupt
//! keyword and host comparisons, so every fold in this workspace goes
//! through this module.

// =============================================================================
// Whitespace
// =============================================================================

/// The ASCII whitespace set used by the CSP grammar.
pub const WHITESPACE: [char; 5] = [' ', '\t', '\n', '\r', '\x0C'];

/// Check if a byte is CSP ASCII whitespace.
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

/// Strip leading and trailing ASCII whitespace.
#[inline]
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii() && is_whitespace(c as u8))
}

// =============================================================================
// Case folding
// =============================================================================

/// ASCII-only lowercase fold.
#[inline]
pub fn fold(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// ASCII-only case-insensitive equality.
#[inline]
pub fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

// =============================================================================
// Character classes
// =============================================================================

/// Scheme characters after the first: `ALPHA | DIGIT | "+" | "-" | "."`.
#[inline]
pub fn is_scheme_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')
}

/// Characters valid inside a host label.
#[inline]
pub fn is_host_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

/// RFC 7230 `tchar`.
#[inline]
pub fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Base64 alphabet plus the base64url variants (`-`, `_`).
#[inline]
pub fn is_base64_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_')
}

/// RFC 3986 `pchar` without the percent-encoding escape itself.
#[inline]
pub fn is_path_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b'='
                | b':'
                | b'@'
                | b'%'
        )
}

/// Trusted Types policy-name characters: `ALNUM | - # = _ / @ . %`.
#[inline]
pub fn is_policy_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'#' | b'=' | b'_' | b'/' | b'@' | b'.' | b'%')
}

/// Well-formed directive names are `[A-Za-z0-9-]+`.
#[inline]
pub fn is_wellformed_directive_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

// =============================================================================
// Percent decoding
// =============================================================================

/// Decode `%XX` escapes; malformed escapes are kept verbatim.
///
/// Used for path-segment comparison, which is case-sensitive after decoding.
pub fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = hex_val(bytes[i + 1]);
            let lo = hex_val(bytes[i + 2]);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

#[inline]
fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(trim("  a b\t"), "a b");
        assert_eq!(trim("\x0C\r\nx"), "x");
        assert_eq!(trim("   "), "");
    }

    #[test]
    fn test_fold_is_ascii_only() {
        assert_eq!(fold("SCRIPT-SRC"), "script-src");
        // Dotted capital I must not fold through a locale table.
        assert_eq!(fold("İ"), "İ");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b"), b"a b");
        assert_eq!(percent_decode("%2Fpath"), b"/path");
        // Malformed escape is kept verbatim.
        assert_eq!(percent_decode("a%2"), b"a%2");
        assert_eq!(percent_decode("a%zz"), b"a%zz");
    }

    #[test]
    fn test_wellformed_names() {
        assert!(is_wellformed_directive_name("script-src"));
        assert!(is_wellformed_directive_name("sandbox"));
        assert!(!is_wellformed_directive_name(""));
        assert!(!is_wellformed_directive_name("script src"));
        assert!(!is_wellformed_directive_name("script_src"));
    }
}
