//! Value grammars for CSP source expressions
//!
//! Each grammar is a pure recognizer: `parse(token) -> Option<Value>` with no
//! side effects. Diagnostics for near-misses are the caller's business; a
//! grammar only answers "is this token a well-formed X, and what is its
//! normalized form".

use core::fmt;

use crate::ascii;

// =============================================================================
// Scheme
// =============================================================================

/// A scheme source expression, e.g. `https:`.
///
/// Stored lower-cased with the trailing colon stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scheme(String);

impl Scheme {
    /// Parse a scheme source token (`ALPHA (ALPHA|DIGIT|"+"|"-"|".")* ":"`).
    pub fn parse(token: &str) -> Option<Self> {
        let name = token.strip_suffix(':')?;
        parse_scheme_name(name).map(Scheme)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.0)
    }
}

/// Validate and lower-case a bare scheme name (no colon).
pub fn parse_scheme_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let first = *bytes.first()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !bytes[1..].iter().all(|&b| ascii::is_scheme_char(b)) {
        return None;
    }
    Some(ascii::fold(name))
}

// =============================================================================
// Host source
// =============================================================================

/// Port component of a host source.
///
/// `Default` means no explicit port was written (match the scheme's default);
/// `Any` is the `*` wildcard port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSpec {
    Default,
    Any,
    Port(u16),
}

/// A host source expression, e.g. `https://*.example.com:8443/static/`.
///
/// Scheme and host are lower-cased on parse (host matching is always
/// case-insensitive); the path is preserved verbatim (path matching is
/// case-sensitive after percent-decoding).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostSource {
    pub scheme: Option<String>,
    pub host: String,
    pub port: PortSpec,
    pub path: String,
}

impl HostSource {
    /// Parse a host source token.
    pub fn parse(token: &str) -> Option<Self> {
        let mut rest = token;

        let scheme = match rest.find("://") {
            Some(idx) => {
                let name = parse_scheme_name(&rest[..idx])?;
                rest = &rest[idx + 3..];
                Some(name)
            }
            None => None,
        };

        let host_end = rest
            .find(|c| c == ':' || c == '/')
            .unwrap_or(rest.len());
        let host = &rest[..host_end];
        if !is_valid_host(host) {
            return None;
        }
        rest = &rest[host_end..];

        let port = if let Some(after) = rest.strip_prefix(':') {
            let port_end = after.find('/').unwrap_or(after.len());
            let port_str = &after[..port_end];
            rest = &after[port_end..];
            if port_str == "*" {
                PortSpec::Any
            } else if !port_str.is_empty() && port_str.bytes().all(|b| b.is_ascii_digit()) {
                PortSpec::Port(port_str.parse().ok()?)
            } else {
                return None;
            }
        } else {
            PortSpec::Default
        };

        if !rest.is_empty() {
            if !rest.starts_with('/') {
                return None;
            }
            if !rest.bytes().all(|b| b == b'/' || ascii::is_path_char(b)) {
                return None;
            }
        }

        Some(HostSource {
            scheme,
            host: ascii::fold(host),
            port,
            path: rest.to_string(),
        })
    }
}

impl fmt::Display for HostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}://")?;
        }
        write!(f, "{}", self.host)?;
        match self.port {
            PortSpec::Default => {}
            PortSpec::Any => write!(f, ":*")?,
            PortSpec::Port(p) => write!(f, ":{p}")?,
        }
        write!(f, "{}", self.path)
    }
}

/// Host grammar: `"*" | ("*.")? label ("." label)*`.
fn is_valid_host(host: &str) -> bool {
    if host == "*" {
        return true;
    }
    let body = host.strip_prefix("*.").unwrap_or(host);
    if body.is_empty() {
        return false;
    }
    body.split('.')
        .all(|label| !label.is_empty() && label.bytes().all(ascii::is_host_char))
}

// =============================================================================
// Nonce
// =============================================================================

/// A nonce source expression, e.g. `'nonce-ch4hvvbHDpv7xCSvXCs3BrNggHdTzxUA'`.
///
/// The `'nonce-'` tag is matched case-insensitively; the payload is
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nonce {
    payload: String,
}

impl Nonce {
    /// Parse a quoted nonce token.
    pub fn parse(token: &str) -> Option<Self> {
        let payload = strip_quoted_prefix(token, "'nonce-")?;
        if !is_base64_payload(payload) {
            return None;
        }
        Some(Nonce {
            payload: payload.to_string(),
        })
    }

    #[inline]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

// =============================================================================
// Hash
// =============================================================================

/// Digest algorithms admitted by the hash-source grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the algorithm's digest in padded base64 characters.
    pub fn base64_digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 44,
            HashAlgorithm::Sha384 => 64,
            HashAlgorithm::Sha512 => 88,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hash source expression, e.g. `'sha256-RFWP...'`.
///
/// The algorithm tag is case-insensitive, the payload case-sensitive. A
/// payload whose length does not match the algorithm's digest length still
/// parses; the validator downgrades that to a warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashSource {
    pub algorithm: HashAlgorithm,
    pub payload: String,
}

impl HashSource {
    /// Parse a quoted hash token.
    pub fn parse(token: &str) -> Option<Self> {
        for (tag, algorithm) in [
            ("'sha256-", HashAlgorithm::Sha256),
            ("'sha384-", HashAlgorithm::Sha384),
            ("'sha512-", HashAlgorithm::Sha512),
        ] {
            if let Some(payload) = strip_quoted_prefix(token, tag) {
                if !is_base64_payload(payload) {
                    return None;
                }
                return Some(HashSource {
                    algorithm,
                    payload: payload.to_string(),
                });
            }
        }
        None
    }
}

// =============================================================================
// Media type
// =============================================================================

/// A `type/subtype` media type, lower-cased on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    pub type_: String,
    pub subtype: String,
}

impl MediaType {
    pub fn parse(token: &str) -> Option<Self> {
        let slash = token.find('/')?;
        let (type_, subtype) = (&token[..slash], &token[slash + 1..]);
        if type_.is_empty() || subtype.is_empty() {
            return None;
        }
        if !type_.bytes().all(ascii::is_tchar) || !subtype.bytes().all(ascii::is_tchar) {
            return None;
        }
        Some(MediaType {
            type_: ascii::fold(type_),
            subtype: ascii::fold(subtype),
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)
    }
}

// =============================================================================
// RFC 7230 token
// =============================================================================

/// A single RFC 7230 token, case preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rfc7230Token(String);

impl Rfc7230Token {
    pub fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || !token.bytes().all(ascii::is_tchar) {
            return None;
        }
        Some(Rfc7230Token(token.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Strip a case-insensitive `'tag-` prefix and the closing quote.
fn strip_quoted_prefix<'a>(token: &'a str, tag: &str) -> Option<&'a str> {
    if token.len() < tag.len() + 1 {
        return None;
    }
    if !token[..tag.len()].eq_ignore_ascii_case(tag) {
        return None;
    }
    token[tag.len()..].strip_suffix('\'')
}

/// Base64 payload with optional `=` padding: one or more alphabet characters
/// followed by at most two `=`.
fn is_base64_payload(payload: &str) -> bool {
    let trimmed = payload
        .strip_suffix("==")
        .or_else(|| payload.strip_suffix('='))
        .unwrap_or(payload);
    !trimmed.is_empty() && trimmed.bytes().all(ascii::is_base64_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_parse() {
        assert_eq!(Scheme::parse("https:").unwrap().as_str(), "https");
        assert_eq!(Scheme::parse("HTTPS:").unwrap().as_str(), "https");
        assert_eq!(Scheme::parse("x+y-z.1:").unwrap().as_str(), "x+y-z.1");
        assert!(Scheme::parse("https").is_none());
        assert!(Scheme::parse("1http:").is_none());
        assert!(Scheme::parse(":").is_none());
    }

    #[test]
    fn test_host_parse_basic() {
        let h = HostSource::parse("Example.COM").unwrap();
        assert_eq!(h.host, "example.com");
        assert_eq!(h.scheme, None);
        assert_eq!(h.port, PortSpec::Default);
        assert_eq!(h.path, "");
    }

    #[test]
    fn test_host_parse_full() {
        let h = HostSource::parse("HTTPS://*.Example.com:8443/A/b%20c/").unwrap();
        assert_eq!(h.scheme.as_deref(), Some("https"));
        assert_eq!(h.host, "*.example.com");
        assert_eq!(h.port, PortSpec::Port(8443));
        // Path case is preserved verbatim.
        assert_eq!(h.path, "/A/b%20c/");
    }

    #[test]
    fn test_host_parse_wildcard_port() {
        let h = HostSource::parse("example.com:*").unwrap();
        assert_eq!(h.port, PortSpec::Any);
    }

    #[test]
    fn test_host_parse_rejects() {
        assert!(HostSource::parse("").is_none());
        assert!(HostSource::parse("exa mple.com").is_none());
        assert!(HostSource::parse("example..com").is_none());
        assert!(HostSource::parse("example.com:").is_none());
        assert!(HostSource::parse("example.com:http").is_none());
        assert!(HostSource::parse("example.com:99999").is_none());
        assert!(HostSource::parse("'self'").is_none());
    }

    #[test]
    fn test_nonce_parse() {
        let n = Nonce::parse("'nonce-AbC+/123='").unwrap();
        assert_eq!(n.payload(), "AbC+/123=");
        // Tag is case-insensitive, payload is not touched.
        let n = Nonce::parse("'NoNcE-QQ=='").unwrap();
        assert_eq!(n.payload(), "QQ==");
        assert!(Nonce::parse("'nonce-'").is_none());
        assert!(Nonce::parse("'nonce-a b'").is_none());
        assert!(Nonce::parse("nonce-abc").is_none());
    }

    #[test]
    fn test_hash_parse() {
        let h = HashSource::parse("'sha256-qznLcsROx4GACP2dm0UCKCzCG-HiZ1guq6ZZDob_Tng='").unwrap();
        assert_eq!(h.algorithm, HashAlgorithm::Sha256);
        let h = HashSource::parse("'SHA384-short'").unwrap();
        assert_eq!(h.algorithm, HashAlgorithm::Sha384);
        assert_eq!(h.payload, "short");
        assert!(HashSource::parse("'sha1-abc'").is_none());
        assert!(HashSource::parse("'sha256-***'").is_none());
    }

    #[test]
    fn test_media_type_parse() {
        let m = MediaType::parse("Application/PDF").unwrap();
        assert_eq!(m.type_, "application");
        assert_eq!(m.subtype, "pdf");
        assert!(MediaType::parse("application").is_none());
        assert!(MediaType::parse("application/").is_none());
        assert!(MediaType::parse("a/b/c").is_none());
    }

    #[test]
    fn test_rfc7230_token() {
        assert_eq!(Rfc7230Token::parse("Endpoint-1").unwrap().as_str(), "Endpoint-1");
        assert!(Rfc7230Token::parse("a,b").is_none());
        assert!(Rfc7230Token::parse("").is_none());
    }
}
