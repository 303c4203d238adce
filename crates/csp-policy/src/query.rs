//! Allow/deny decisions against a parsed policy
//!
//! Query methods never mutate the policy and answer in terms of the
//! governing directive after fallback resolution. A missing governing
//! directive imposes no restriction. Request context (resource URL,
//! document origin, nonce, redirect status) is optional; context that a
//! present directive needs but the caller omitted fails closed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256, Sha384, Sha512};

use csp_core::ascii;
use csp_core::grammar::{HashAlgorithm, HashSource, MediaType, Nonce, PortSpec};
use csp_core::types::{FetchKind, SandboxKeywords, SourceKeywords};
use csp_core::url::{default_port, NetworkUrl, OpaqueUrl, Url};

use crate::policy::Policy;
use crate::source_list::{SourceExpressionDirective, SourceList};

impl Policy {
    // -------------------------------------------------------------------------
    // Script categories
    // -------------------------------------------------------------------------

    /// Whether an external script at `url` may load.
    ///
    /// A matching nonce or integrity hash allows the script regardless of the
    /// URL allow list. With `'strict-dynamic'`, URL allow-listing is disabled
    /// and only non-parser-inserted elements load; an unknown
    /// `parser_inserted` is assumed parser-inserted.
    pub fn allows_external_script(
        &self,
        url: Option<&Url>,
        origin: Option<&NetworkUrl>,
        nonce: Option<&str>,
        integrity: &[&str],
        parser_inserted: Option<bool>,
    ) -> bool {
        if self.sandbox_blocks_scripts() {
            return false;
        }
        let Some((_, d)) = self.governing_fetch(FetchKind::ScriptSrcElem) else {
            return true;
        };
        if nonce.is_some_and(|n| nonce_matches(&d.nonces, n)) {
            return true;
        }
        if integrity_matches(&d.hashes, integrity) {
            return true;
        }
        if d.keywords.contains(SourceKeywords::STRICT_DYNAMIC) {
            return parser_inserted == Some(false);
        }
        list_matches(&d.list, url, origin)
    }

    /// Whether an inline `<script>` block with this source text may run.
    pub fn allows_inline_script(
        &self,
        source: &str,
        nonce: Option<&str>,
        parser_inserted: Option<bool>,
    ) -> bool {
        if self.sandbox_blocks_scripts() {
            return false;
        }
        match self.governing_fetch(FetchKind::ScriptSrcElem) {
            None => true,
            Some((_, d)) => allows_inline(d, true, false, source, nonce, parser_inserted),
        }
    }

    /// Whether a script attribute (e.g. an event handler) with this source
    /// text may run. Nonces do not apply to attributes; hash matching
    /// requires `'unsafe-hashes'`.
    pub fn allows_script_attribute(&self, source: &str) -> bool {
        if self.sandbox_blocks_scripts() {
            return false;
        }
        match self.governing_fetch(FetchKind::ScriptSrcAttr) {
            None => true,
            Some((_, d)) => allows_inline(d, true, true, source, None, None),
        }
    }

    /// Whether `eval()` and its equivalents may run.
    pub fn allows_eval(&self) -> bool {
        if self.sandbox_blocks_scripts() {
            return false;
        }
        match self.governing_fetch(FetchKind::ScriptSrc) {
            None => true,
            Some((_, d)) => d.keywords.contains(SourceKeywords::UNSAFE_EVAL),
        }
    }

    /// Whether navigating to a `javascript:` URL with this body may run.
    /// The body is subject to both `navigate-to` and inline-script checks.
    pub fn allows_javascript_url_navigation(
        &self,
        source: &str,
        origin: Option<&NetworkUrl>,
    ) -> bool {
        if self.sandbox_blocks_scripts() {
            return false;
        }
        if let Some(d) = self.navigate_to() {
            let Some(origin) = origin else {
                return false;
            };
            let js_url = Url::Opaque(OpaqueUrl {
                scheme: "javascript".to_string(),
                value: source.to_string(),
            });
            if !url_matches_source_list(&d.list, &js_url, origin) {
                return false;
            }
        }
        match self.governing_fetch(FetchKind::ScriptSrcElem) {
            None => true,
            Some((_, d)) => allows_inline(d, true, false, source, None, None),
        }
    }

    // -------------------------------------------------------------------------
    // Style categories
    // -------------------------------------------------------------------------

    /// Whether an external stylesheet at `url` may load.
    pub fn allows_external_style(
        &self,
        url: Option<&Url>,
        origin: Option<&NetworkUrl>,
        nonce: Option<&str>,
    ) -> bool {
        let Some((_, d)) = self.governing_fetch(FetchKind::StyleSrcElem) else {
            return true;
        };
        if nonce.is_some_and(|n| nonce_matches(&d.nonces, n)) {
            return true;
        }
        list_matches(&d.list, url, origin)
    }

    /// Whether an inline `<style>` block with this source text may apply.
    pub fn allows_inline_style(&self, source: &str, nonce: Option<&str>) -> bool {
        match self.governing_fetch(FetchKind::StyleSrcElem) {
            None => true,
            Some((_, d)) => allows_inline(d, false, false, source, nonce, None),
        }
    }

    /// Whether a `style` attribute with this source text may apply.
    pub fn allows_style_attribute(&self, source: &str) -> bool {
        match self.governing_fetch(FetchKind::StyleSrcAttr) {
            None => true,
            Some((_, d)) => allows_inline(d, false, true, source, None, None),
        }
    }

    // -------------------------------------------------------------------------
    // Plain fetch categories
    // -------------------------------------------------------------------------

    pub fn allows_frame(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::FrameSrc, url, origin)
    }

    pub fn allows_font(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::FontSrc, url, origin)
    }

    pub fn allows_image(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::ImgSrc, url, origin)
    }

    pub fn allows_media(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::MediaSrc, url, origin)
    }

    pub fn allows_object(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::ObjectSrc, url, origin)
    }

    pub fn allows_manifest(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::ManifestSrc, url, origin)
    }

    pub fn allows_prefetch(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::PrefetchSrc, url, origin)
    }

    pub fn allows_worker(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        self.allows_fetch_url(FetchKind::WorkerSrc, url, origin)
    }

    /// Whether a connection (fetch, XHR, WebSocket, EventSource) to `url`
    /// may open. WebSocket schemes are rewritten to their HTTP equivalents
    /// before matching.
    pub fn allows_connection(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        let Some((_, d)) = self.governing_fetch(FetchKind::ConnectSrc) else {
            return true;
        };
        let (Some(url), Some(origin)) = (url, origin) else {
            return false;
        };
        match rewrite_websocket_scheme(url) {
            Some(rewritten) => url_matches_source_list(&d.list, &rewritten, origin),
            None => url_matches_source_list(&d.list, url, origin),
        }
    }

    fn allows_fetch_url(
        &self,
        kind: FetchKind,
        url: Option<&Url>,
        origin: Option<&NetworkUrl>,
    ) -> bool {
        match self.governing_fetch(kind) {
            None => true,
            Some((_, d)) => list_matches(&d.list, url, origin),
        }
    }

    // -------------------------------------------------------------------------
    // Non-fetch categories
    // -------------------------------------------------------------------------

    /// Whether a plugin of this media type may instantiate. Wildcard entries
    /// in `plugin-types` are inert.
    pub fn allows_plugin(&self, media_type: &MediaType) -> bool {
        let Some(d) = self.plugin_types() else {
            return true;
        };
        d.media_types
            .iter()
            .any(|m| m.type_ != "*" && m.subtype != "*" && m == media_type)
    }

    /// Whether navigation to `url` may proceed under `navigate-to`.
    ///
    /// An unknown redirect status is assumed redirected; a redirected
    /// navigation without `'unsafe-allow-redirects'` additionally requires
    /// the post-redirect URL to match.
    pub fn allows_navigation(
        &self,
        url: Option<&Url>,
        origin: Option<&NetworkUrl>,
        redirected: Option<bool>,
        post_redirect_url: Option<&Url>,
    ) -> bool {
        let Some(d) = self.navigate_to() else {
            return true;
        };
        let (Some(url), Some(origin)) = (url, origin) else {
            return false;
        };
        if !url_matches_source_list(&d.list, url, origin) {
            return false;
        }
        let redirected = redirected.unwrap_or(true);
        if redirected && !d.keywords.contains(SourceKeywords::UNSAFE_ALLOW_REDIRECTS) {
            return post_redirect_url.is_some_and(|u| url_matches_source_list(&d.list, u, origin));
        }
        true
    }

    pub fn allows_form_action(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        if self
            .sandbox()
            .is_some_and(|s| !s.keywords.contains(SandboxKeywords::ALLOW_FORMS))
        {
            return false;
        }
        match self.form_action() {
            None => true,
            Some(d) => list_matches(&d.list, url, origin),
        }
    }

    pub fn allows_frame_ancestor(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        match self.frame_ancestors() {
            None => true,
            Some(d) => list_matches(&d.list, url, origin),
        }
    }

    pub fn allows_base_uri(&self, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
        match self.base_uri() {
            None => true,
            Some(d) => list_matches(&d.list, url, origin),
        }
    }

    fn sandbox_blocks_scripts(&self) -> bool {
        self.sandbox()
            .is_some_and(|s| !s.keywords.contains(SandboxKeywords::ALLOW_SCRIPTS))
    }
}

// =============================================================================
// Inline matching
// =============================================================================

fn allows_inline(
    d: &SourceExpressionDirective,
    is_script: bool,
    attribute: bool,
    source: &str,
    nonce: Option<&str>,
    parser_inserted: Option<bool>,
) -> bool {
    let strict_dynamic = is_script && d.keywords.contains(SourceKeywords::STRICT_DYNAMIC);

    // 'unsafe-inline' is neutralized by any nonce or hash, and by
    // 'strict-dynamic' on script categories.
    if d.nonces.is_empty()
        && d.hashes.is_empty()
        && !strict_dynamic
        && d.keywords.contains(SourceKeywords::UNSAFE_INLINE)
    {
        return true;
    }

    if attribute {
        // Nonces do not apply to attributes.
        return d.keywords.contains(SourceKeywords::UNSAFE_HASHES)
            && content_hash_matches(&d.hashes, source);
    }

    if strict_dynamic && parser_inserted == Some(false) {
        return true;
    }
    if nonce.is_some_and(|n| nonce_matches(&d.nonces, n)) {
        return true;
    }
    content_hash_matches(&d.hashes, source)
}

fn nonce_matches(nonces: &[Nonce], presented: &str) -> bool {
    !presented.is_empty() && nonces.iter().any(|n| n.payload() == presented)
}

/// Any presented integrity hash matching any recorded hash allows the load.
/// Presented values use the SRI `<alg>-<payload>` form.
fn integrity_matches(hashes: &[HashSource], presented: &[&str]) -> bool {
    presented.iter().any(|p| {
        let Some((tag, payload)) = p.split_once('-') else {
            return false;
        };
        let algorithm = match ascii::fold(tag).as_str() {
            "sha256" => HashAlgorithm::Sha256,
            "sha384" => HashAlgorithm::Sha384,
            "sha512" => HashAlgorithm::Sha512,
            _ => return false,
        };
        hashes
            .iter()
            .any(|h| h.algorithm == algorithm && normalize_base64url(&h.payload) == payload)
    })
}

fn content_hash_matches(hashes: &[HashSource], source: &str) -> bool {
    let mut cache = DigestCache::new(source);
    hashes
        .iter()
        .any(|h| normalize_base64url(&h.payload) == cache.digest(h.algorithm))
}

/// Recorded payloads may use base64url; presented digests are plain base64.
fn normalize_base64url(payload: &str) -> String {
    payload.replace('-', "+").replace('_', "/")
}

/// Computes each algorithm's digest at most once per content.
struct DigestCache<'a> {
    source: &'a str,
    sha256: Option<String>,
    sha384: Option<String>,
    sha512: Option<String>,
}

impl<'a> DigestCache<'a> {
    fn new(source: &'a str) -> Self {
        DigestCache {
            source,
            sha256: None,
            sha384: None,
            sha512: None,
        }
    }

    fn digest(&mut self, algorithm: HashAlgorithm) -> &str {
        let source = self.source;
        let slot = match algorithm {
            HashAlgorithm::Sha256 => &mut self.sha256,
            HashAlgorithm::Sha384 => &mut self.sha384,
            HashAlgorithm::Sha512 => &mut self.sha512,
        };
        slot.get_or_insert_with(|| match algorithm {
            HashAlgorithm::Sha256 => STANDARD.encode(Sha256::digest(source.as_bytes())),
            HashAlgorithm::Sha384 => STANDARD.encode(Sha384::digest(source.as_bytes())),
            HashAlgorithm::Sha512 => STANDARD.encode(Sha512::digest(source.as_bytes())),
        })
    }
}

// =============================================================================
// URL-to-source-list matching
// =============================================================================

/// Optional-context wrapper: a directive that needs URL and origin context
/// denies when either is absent.
fn list_matches(list: &SourceList, url: Option<&Url>, origin: Option<&NetworkUrl>) -> bool {
    match (url, origin) {
        (Some(url), Some(origin)) => url_matches_source_list(list, url, origin),
        _ => false,
    }
}

/// Match a URL against a source list in the context of a document origin.
pub fn url_matches_source_list(list: &SourceList, url: &Url, origin: &NetworkUrl) -> bool {
    if list.star && star_matches(url.scheme(), &origin.scheme) {
        return true;
    }
    if list
        .schemes
        .iter()
        .any(|s| scheme_part_matches(s.as_str(), url.scheme()))
    {
        return true;
    }
    if let Some(net) = url.as_network() {
        for host in &list.hosts {
            let expr_scheme = host.scheme.as_deref().unwrap_or(&origin.scheme);
            if scheme_part_matches(expr_scheme, &net.scheme)
                && host_part_matches(&host.host, &net.host)
                && port_part_matches(host.port, net)
                && path_part_matches(&host.path, &net.path)
            {
                return true;
            }
        }
    }
    if list.self_source && self_matches(url, origin) {
        return true;
    }
    false
}

/// `*` admits the network schemes and the origin's own scheme.
fn star_matches(url_scheme: &str, origin_scheme: &str) -> bool {
    matches!(url_scheme, "ftp" | "http" | "https") || url_scheme == origin_scheme
}

/// Scheme matching with the secure-upgrade family: an insecure expression
/// scheme admits its secure and WebSocket counterparts.
fn scheme_part_matches(expression: &str, url_scheme: &str) -> bool {
    expression == url_scheme
        || (expression == "http" && matches!(url_scheme, "https" | "ws" | "wss"))
        || (expression == "ws" && matches!(url_scheme, "wss" | "http" | "https"))
        || (expression == "wss" && url_scheme == "https")
}

/// Exact or `*.suffix` host matching. IP addresses never match a wildcard,
/// and the only IP address that matches exactly is `127.0.0.1`.
fn host_part_matches(expression: &str, host: &str) -> bool {
    if expression == "*" {
        return true;
    }
    if let Some(suffix) = expression.strip_prefix("*.") {
        if is_ip_literal(host) {
            return false;
        }
        return host.len() > suffix.len() + 1
            && host.ends_with(suffix)
            && host.as_bytes()[host.len() - suffix.len() - 1] == b'.';
    }
    if !ascii::eq_fold(expression, host) {
        return false;
    }
    !is_ip_literal(host) || host == "127.0.0.1"
}

fn is_ip_literal(host: &str) -> bool {
    host.parse::<std::net::Ipv4Addr>().is_ok()
        || host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .is_some_and(|h| h.parse::<std::net::Ipv6Addr>().is_ok())
}

fn port_part_matches(expression: PortSpec, url: &NetworkUrl) -> bool {
    match expression {
        PortSpec::Any => true,
        PortSpec::Port(p) => match url.port {
            Some(url_port) => url_port == p,
            None => default_port(&url.scheme) == Some(p),
        },
        PortSpec::Default => match url.port {
            Some(url_port) => default_port(&url.scheme) == Some(url_port),
            None => true,
        },
    }
}

/// Segment-wise path matching, case-sensitive after percent-decoding. An
/// expression path ending in `/` is a prefix match; otherwise segment counts
/// must agree exactly.
fn path_part_matches(expression: &str, url_path: &str) -> bool {
    if expression.is_empty() {
        return true;
    }
    if expression == "/" && url_path.is_empty() {
        return true;
    }
    let prefix = expression.ends_with('/');
    let mut expr_segments: Vec<Vec<u8>> =
        expression.split('/').map(ascii::percent_decode).collect();
    if prefix {
        expr_segments.pop();
    }
    let url_segments: Vec<Vec<u8>> = url_path.split('/').map(ascii::percent_decode).collect();
    if prefix {
        url_segments.len() >= expr_segments.len()
            && expr_segments.iter().zip(&url_segments).all(|(a, b)| a == b)
    } else {
        expr_segments == url_segments
    }
}

/// `'self'`: same host, same effective port, and a scheme pair that does not
/// downgrade (HTTPS/WSS from anywhere, HTTP/WS only from an HTTP origin).
fn self_matches(url: &Url, origin: &NetworkUrl) -> bool {
    let Some(net) = url.as_network() else {
        return false;
    };
    if !ascii::eq_fold(&net.host, &origin.host) {
        return false;
    }
    if net.port_or_default() != origin.port_or_default() {
        return false;
    }
    matches!(net.scheme.as_str(), "https" | "wss")
        || (origin.scheme == "http" && matches!(net.scheme.as_str(), "http" | "ws"))
}

fn rewrite_websocket_scheme(url: &Url) -> Option<Url> {
    let net = url.as_network()?;
    let scheme = match net.scheme.as_str() {
        "ws" => "http",
        "wss" => "https",
        _ => return None,
    };
    let mut rewritten = net.clone();
    rewritten.scheme = scheme.to_string();
    Some(Url::Network(rewritten))
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_core::types::Diagnostic;

    const SHA256_X: &str = "LXEWQrcmsEQBYnyp+6wy9chTD7GQPMTbAiWHF5IaSIE=";

    fn policy(text: &str) -> Policy {
        let mut sink = |_d: Diagnostic| {};
        Policy::parse(text, &mut sink).unwrap()
    }

    fn url(text: &str) -> Url {
        Url::parse(text).unwrap()
    }

    fn origin(text: &str) -> NetworkUrl {
        match Url::parse(text).unwrap() {
            Url::Network(net) => net,
            Url::Opaque(_) => panic!("origin must be a network URL"),
        }
    }

    #[test]
    fn test_fallback_frame_vs_worker() {
        let p = policy("script-src 'self'; default-src 'none'");
        let o = origin("http://example.com");
        assert!(!p.allows_frame(Some(&url("http://example.com")), Some(&o)));
        assert!(p.allows_worker(Some(&url("http://example.com")), Some(&o)));
    }

    #[test]
    fn test_scheme_upgrade_family() {
        let p = policy("script-src http://a");
        let o = origin("http://example.com");
        for allowed in ["http://a", "https://a", "ws://a", "wss://a"] {
            assert!(
                p.allows_external_script(Some(&url(allowed)), Some(&o), None, &[], None),
                "{allowed} should be allowed"
            );
        }
        assert!(!p.allows_external_script(Some(&url("ftp://a")), Some(&o), None, &[], None));
    }

    #[test]
    fn test_absent_url_or_origin_fails_closed() {
        let p = policy("img-src *");
        let o = origin("https://example.com");
        let u = url("https://anywhere.com/x");
        assert!(p.allows_image(Some(&u), Some(&o)));
        assert!(!p.allows_image(None, Some(&o)));
        assert!(!p.allows_image(Some(&u), None));
        assert!(!p.allows_image(None, None));
        // Without a governing directive there is nothing to fail against.
        assert!(p.allows_font(None, None));
        assert!(policy("img-src a").allows_frame_ancestor(None, None));
    }

    #[test]
    fn test_absent_context_with_credentials() {
        // A nonce decides without URL context; without one the URL check
        // fails closed.
        let p = policy("script-src 'nonce-abc'");
        assert!(p.allows_external_script(None, None, Some("abc"), &[], None));
        assert!(!p.allows_external_script(None, None, None, &[], None));

        let p = policy("navigate-to example.com");
        let o = origin("https://example.com");
        assert!(!p.allows_navigation(None, Some(&o), Some(false), None));
        assert!(!p.allows_navigation(
            Some(&url("https://example.com/x")),
            None,
            Some(false),
            None
        ));
        assert!(!p.allows_javascript_url_navigation("void 0", None));
        assert!(!policy("connect-src *").allows_connection(None, Some(&o)));
    }

    #[test]
    fn test_inline_script_hash() {
        let p = policy(&format!("script-src 'sha256-{SHA256_X}'"));
        assert!(p.allows_inline_script("x", None, None));
        assert!(!p.allows_inline_script("y", None, None));
    }

    #[test]
    fn test_malformed_hash_is_ignored_not_wildcard() {
        let p = policy(&format!("script-src 'sha256-bogus' 'sha256-{SHA256_X}'"));
        assert!(p.allows_inline_script("x", None, None));
        assert!(!p.allows_inline_script("y", None, None));
    }

    #[test]
    fn test_base64url_recorded_hash_matches() {
        let digest_url = SHA256_X.replace('+', "-").replace('/', "_");
        let p = policy(&format!("script-src 'sha256-{digest_url}'"));
        assert!(p.allows_inline_script("x", None, None));
    }

    #[test]
    fn test_nonce_matching() {
        let p = policy("script-src 'nonce-abc'");
        assert!(p.allows_inline_script("code", Some("abc"), None));
        assert!(!p.allows_inline_script("code", Some("ABC"), None));
        assert!(!p.allows_inline_script("code", Some(""), None));
        assert!(!p.allows_inline_script("code", None, None));
    }

    #[test]
    fn test_nonce_neutralizes_unsafe_inline() {
        let p = policy("script-src 'unsafe-inline' 'nonce-abc'");
        assert!(!p.allows_inline_script("code", None, None));
        assert!(p.allows_inline_script("code", Some("abc"), None));

        let p = policy("script-src 'unsafe-inline'");
        assert!(p.allows_inline_script("code", None, None));
    }

    #[test]
    fn test_strict_dynamic() {
        let p = policy("script-src 'strict-dynamic' 'nonce-abc' https:");
        let o = origin("https://example.com");
        let u = url("https://cdn.example.com/app.js");
        // Nonce still allows.
        assert!(p.allows_external_script(Some(&u), Some(&o), Some("abc"), &[], None));
        // URL allow-listing is disabled.
        assert!(!p.allows_external_script(Some(&u), Some(&o), None, &[], Some(true)));
        // Unknown insertion status is assumed parser-inserted.
        assert!(!p.allows_external_script(Some(&u), Some(&o), None, &[], None));
        assert!(p.allows_external_script(Some(&u), Some(&o), None, &[], Some(false)));
        // Inline follows the same rule.
        assert!(p.allows_inline_script("code", None, Some(false)));
        assert!(!p.allows_inline_script("code", None, None));
    }

    #[test]
    fn test_integrity_matching() {
        let p = policy(&format!("script-src 'sha256-{SHA256_X}'"));
        let o = origin("https://example.com");
        let u = url("https://cdn.example.com/app.js");
        let integrity = format!("sha256-{SHA256_X}");
        assert!(p.allows_external_script(Some(&u), Some(&o), None, &[&integrity], None));
        assert!(!p.allows_external_script(Some(&u), Some(&o), None, &["sha256-other"], None));
        assert!(!p.allows_external_script(Some(&u), Some(&o), None, &[], None));
    }

    #[test]
    fn test_attribute_context_requires_unsafe_hashes() {
        let with = policy(&format!("script-src-attr 'unsafe-hashes' 'sha256-{SHA256_X}'"));
        let without = policy(&format!("script-src-attr 'sha256-{SHA256_X}'"));
        assert!(with.allows_script_attribute("x"));
        assert!(!without.allows_script_attribute("x"));
        // Element content does not need 'unsafe-hashes'.
        let elem = policy(&format!("script-src 'sha256-{SHA256_X}'"));
        assert!(elem.allows_inline_script("x", None, None));
    }

    #[test]
    fn test_style_queries() {
        let p = policy("style-src 'nonce-abc' https://styles.example.com");
        let o = origin("https://example.com");
        let good = url("https://styles.example.com/a.css");
        let bad = url("https://evil.example.com/a.css");
        assert!(p.allows_external_style(Some(&good), Some(&o), None));
        assert!(!p.allows_external_style(Some(&bad), Some(&o), None));
        assert!(p.allows_external_style(Some(&bad), Some(&o), Some("abc")));
        assert!(!p.allows_external_style(None, None, None));
        assert!(p.allows_inline_style("body{}", Some("abc")));
        assert!(!p.allows_inline_style("body{}", None));
        assert!(!p.allows_style_attribute("color:red"));
    }

    #[test]
    fn test_sandbox_gates_scripts_and_forms() {
        let p = policy("sandbox");
        let o = origin("https://example.com");
        assert!(!p.allows_inline_script("code", None, None));
        assert!(!p.allows_external_script(
            Some(&url("https://example.com/a.js")),
            Some(&o),
            None,
            &[],
            None
        ));
        assert!(!p.allows_eval());
        assert!(!p.allows_javascript_url_navigation("void 0", Some(&o)));
        assert!(!p.allows_form_action(Some(&url("https://example.com/submit")), Some(&o)));
        // Other categories are untouched.
        assert!(p.allows_image(Some(&url("https://example.com/a.png")), Some(&o)));

        let p = policy("sandbox allow-scripts allow-forms");
        assert!(p.allows_inline_script("code", None, None));
        assert!(p.allows_form_action(Some(&url("https://example.com/submit")), Some(&o)));
    }

    #[test]
    fn test_eval() {
        assert!(policy("script-src 'unsafe-eval'").allows_eval());
        assert!(!policy("script-src 'self'").allows_eval());
        assert!(!policy("default-src 'none'").allows_eval());
        assert!(policy("img-src a").allows_eval());
    }

    #[test]
    fn test_self_matching() {
        let p = policy("default-src 'self'");
        let o = origin("http://example.com");
        assert!(p.allows_image(Some(&url("http://example.com/a.png")), Some(&o)));
        assert!(p.allows_connection(Some(&url("ws://example.com/socket")), Some(&o)));
        assert!(!p.allows_image(Some(&url("http://other.com/a.png")), Some(&o)));
        assert!(!p.allows_image(Some(&url("http://example.com:8080/a.png")), Some(&o)));

        let secure = origin("https://example.com");
        assert!(p.allows_image(Some(&url("https://example.com/a.png")), Some(&secure)));
        // Downgrade from a secure origin is rejected.
        assert!(!p.allows_image(Some(&url("http://example.com/a.png")), Some(&secure)));
    }

    #[test]
    fn test_wildcard_host() {
        let p = policy("img-src *.example.com");
        let o = origin("https://example.com");
        assert!(p.allows_image(Some(&url("https://a.example.com/x")), Some(&o)));
        assert!(p.allows_image(Some(&url("https://a.b.example.com/x")), Some(&o)));
        assert!(!p.allows_image(Some(&url("https://example.com/x")), Some(&o)));
        assert!(!p.allows_image(Some(&url("https://aexample.com/x")), Some(&o)));
    }

    #[test]
    fn test_ip_hosts() {
        let o = origin("http://example.com");
        assert!(!policy("img-src 1.2.3.4").allows_image(Some(&url("http://1.2.3.4/x")), Some(&o)));
        assert!(
            policy("img-src 127.0.0.1").allows_image(Some(&url("http://127.0.0.1/x")), Some(&o))
        );
        assert!(!policy("img-src *.0.1").allows_image(Some(&url("http://127.0.0.1/x")), Some(&o)));
    }

    #[test]
    fn test_port_matching() {
        let o = origin("http://example.com");
        let p = policy("img-src example.com:8080");
        assert!(p.allows_image(Some(&url("http://example.com:8080/x")), Some(&o)));
        assert!(!p.allows_image(Some(&url("http://example.com/x")), Some(&o)));

        let p = policy("img-src example.com:*");
        assert!(p.allows_image(Some(&url("http://example.com:9999/x")), Some(&o)));

        // An absent expression port means the URL must be on its default port.
        let p = policy("img-src example.com");
        assert!(p.allows_image(Some(&url("http://example.com:80/x")), Some(&o)));
        assert!(!p.allows_image(Some(&url("http://example.com:8080/x")), Some(&o)));

        // An explicit default port matches an absent URL port.
        let p = policy("img-src example.com:80");
        assert!(p.allows_image(Some(&url("http://example.com/x")), Some(&o)));
    }

    #[test]
    fn test_path_matching() {
        let o = origin("https://example.com");
        let p = policy("img-src example.com/static/");
        assert!(p.allows_image(Some(&url("https://example.com/static/app.png")), Some(&o)));
        assert!(p.allows_image(Some(&url("https://example.com/static/")), Some(&o)));
        assert!(!p.allows_image(Some(&url("https://example.com/other/app.png")), Some(&o)));

        let p = policy("img-src example.com/exact");
        assert!(p.allows_image(Some(&url("https://example.com/exact")), Some(&o)));
        assert!(!p.allows_image(Some(&url("https://example.com/exact/deeper")), Some(&o)));
        // Case-sensitive after percent-decoding.
        assert!(!p.allows_image(Some(&url("https://example.com/EXACT")), Some(&o)));
        let p = policy("img-src example.com/a%20b");
        assert!(p.allows_image(Some(&url("https://example.com/a%20b")), Some(&o)));
    }

    #[test]
    fn test_star_and_schemes() {
        let o = origin("http://example.com");
        let p = policy("img-src *");
        assert!(p.allows_image(Some(&url("https://anywhere.com/x")), Some(&o)));
        assert!(p.allows_image(Some(&url("ftp://files.com/x")), Some(&o)));
        assert!(!p.allows_image(Some(&url("data:image/png;base64,AAA")), Some(&o)));

        let p = policy("img-src data:");
        assert!(p.allows_image(Some(&url("data:image/png;base64,AAA")), Some(&o)));
        assert!(!p.allows_image(Some(&url("https://anywhere.com/x")), Some(&o)));
    }

    #[test]
    fn test_connection_websocket_rewrite() {
        let o = origin("https://example.com");
        let p = policy("connect-src example.com");
        assert!(p.allows_connection(Some(&url("wss://example.com/socket")), Some(&o)));
        assert!(!p.allows_connection(Some(&url("wss://other.com/socket")), Some(&o)));
    }

    #[test]
    fn test_plugin_types() {
        let pdf = MediaType::parse("application/pdf").unwrap();
        let png = MediaType::parse("image/png").unwrap();
        let p = policy("plugin-types application/pdf image/*");
        assert!(p.allows_plugin(&pdf));
        // The wildcard entry is inert.
        assert!(!p.allows_plugin(&png));
        assert!(policy("img-src a").allows_plugin(&png));
    }

    #[test]
    fn test_navigation_redirects() {
        let o = origin("https://example.com");
        let p = policy("navigate-to example.com");
        let target = url("https://example.com/next");
        // Unknown redirect status fails closed.
        assert!(!p.allows_navigation(Some(&target), Some(&o), None, None));
        assert!(p.allows_navigation(Some(&target), Some(&o), Some(false), None));
        assert!(p.allows_navigation(
            Some(&target),
            Some(&o),
            Some(true),
            Some(&url("https://example.com/final"))
        ));
        assert!(!p.allows_navigation(
            Some(&target),
            Some(&o),
            Some(true),
            Some(&url("https://evil.com/final"))
        ));
        assert!(!p.allows_navigation(Some(&url("https://evil.com/x")), Some(&o), Some(false), None));

        let p = policy("navigate-to example.com 'unsafe-allow-redirects'");
        assert!(p.allows_navigation(Some(&target), Some(&o), None, None));
    }

    #[test]
    fn test_frame_ancestors_and_base_uri() {
        let o = origin("https://example.com");
        let p = policy("frame-ancestors 'self'; base-uri 'none'");
        assert!(p.allows_frame_ancestor(Some(&url("https://example.com/embed")), Some(&o)));
        assert!(!p.allows_frame_ancestor(Some(&url("https://evil.com/embed")), Some(&o)));
        assert!(!p.allows_base_uri(Some(&url("https://example.com/")), Some(&o)));
        // Neither falls back to default-src.
        let p = policy("default-src 'none'");
        assert!(p.allows_frame_ancestor(Some(&url("https://evil.com/embed")), Some(&o)));
        assert!(p.allows_base_uri(Some(&url("https://example.com/")), Some(&o)));
    }

    #[test]
    fn test_javascript_url_navigation() {
        let o = origin("https://example.com");
        let p = policy("script-src 'unsafe-inline'");
        assert!(p.allows_javascript_url_navigation("void 0", Some(&o)));
        let p = policy("script-src 'self'");
        assert!(!p.allows_javascript_url_navigation("void 0", Some(&o)));
        let p = policy("navigate-to example.com");
        assert!(!p.allows_javascript_url_navigation("void 0", Some(&o)));
        let p = policy("navigate-to javascript:");
        assert!(p.allows_javascript_url_navigation("void 0", Some(&o)));
    }
}
