//! Shared type definitions for the cspolicy engine
//!
//! Diagnostics, the fetch-directive kind enumeration with its fallback
//! chains, and the keyword bit sets used by directive validators.

use core::fmt;

// =============================================================================
// Diagnostics
// =============================================================================

/// Severity of a policy-content diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Grammar-valid and intentional, but worth flagging.
    Info,
    /// Grammar-valid but meaningless, deprecated, or duplicated.
    Warning,
    /// Violates the grammar; the value or directive is inert for queries
    /// but still serialized verbatim.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A single diagnostic discovered while parsing or mutating a policy.
///
/// `value_index: None` means the diagnostic pertains to the whole directive
/// rather than one value. For list-level parsing, `policy_index` counts every
/// comma-separated slot, including slots whose policy was empty and dropped
/// from the output; the resulting index skew is intentional and observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub policy_index: Option<usize>,
    pub directive_index: usize,
    pub value_index: Option<usize>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        directive_index: usize,
        value_index: Option<usize>,
    ) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            policy_index: None,
            directive_index,
            value_index,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(policy) = self.policy_index {
            write!(f, " (policy {policy},")?;
        } else {
            write!(f, " (")?;
        }
        write!(f, "directive {}", self.directive_index)?;
        if let Some(value) = self.value_index {
            write!(f, ", value {value}")?;
        }
        write!(f, ")")
    }
}

// =============================================================================
// Fetch directive kinds
// =============================================================================

/// The seventeen fetch-directive kinds subject to fallback resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    ChildSrc,
    ConnectSrc,
    DefaultSrc,
    FontSrc,
    FrameSrc,
    ImgSrc,
    ManifestSrc,
    MediaSrc,
    ObjectSrc,
    PrefetchSrc,
    ScriptSrc,
    ScriptSrcAttr,
    ScriptSrcElem,
    StyleSrc,
    StyleSrcAttr,
    StyleSrcElem,
    WorkerSrc,
}

impl FetchKind {
    /// All kinds, in name order.
    pub const ALL: [FetchKind; 17] = [
        FetchKind::ChildSrc,
        FetchKind::ConnectSrc,
        FetchKind::DefaultSrc,
        FetchKind::FontSrc,
        FetchKind::FrameSrc,
        FetchKind::ImgSrc,
        FetchKind::ManifestSrc,
        FetchKind::MediaSrc,
        FetchKind::ObjectSrc,
        FetchKind::PrefetchSrc,
        FetchKind::ScriptSrc,
        FetchKind::ScriptSrcAttr,
        FetchKind::ScriptSrcElem,
        FetchKind::StyleSrc,
        FetchKind::StyleSrcAttr,
        FetchKind::StyleSrcElem,
        FetchKind::WorkerSrc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FetchKind::ChildSrc => "child-src",
            FetchKind::ConnectSrc => "connect-src",
            FetchKind::DefaultSrc => "default-src",
            FetchKind::FontSrc => "font-src",
            FetchKind::FrameSrc => "frame-src",
            FetchKind::ImgSrc => "img-src",
            FetchKind::ManifestSrc => "manifest-src",
            FetchKind::MediaSrc => "media-src",
            FetchKind::ObjectSrc => "object-src",
            FetchKind::PrefetchSrc => "prefetch-src",
            FetchKind::ScriptSrc => "script-src",
            FetchKind::ScriptSrcAttr => "script-src-attr",
            FetchKind::ScriptSrcElem => "script-src-elem",
            FetchKind::StyleSrc => "style-src",
            FetchKind::StyleSrcAttr => "style-src-attr",
            FetchKind::StyleSrcElem => "style-src-elem",
            FetchKind::WorkerSrc => "worker-src",
        }
    }

    /// Look up a kind from an already ASCII-folded directive name.
    pub fn from_name(name: &str) -> Option<FetchKind> {
        FetchKind::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// The fixed fallback chain for this kind, starting with the kind itself
    /// and ending with `default-src`.
    pub fn fallback_chain(self) -> &'static [FetchKind] {
        use FetchKind::*;
        match self {
            ScriptSrcElem => &[ScriptSrcElem, ScriptSrc, DefaultSrc],
            ScriptSrcAttr => &[ScriptSrcAttr, ScriptSrc, DefaultSrc],
            StyleSrcElem => &[StyleSrcElem, StyleSrc, DefaultSrc],
            StyleSrcAttr => &[StyleSrcAttr, StyleSrc, DefaultSrc],
            WorkerSrc => &[WorkerSrc, ChildSrc, ScriptSrc, DefaultSrc],
            FrameSrc => &[FrameSrc, ChildSrc, DefaultSrc],
            ChildSrc => &[ChildSrc, DefaultSrc],
            ConnectSrc => &[ConnectSrc, DefaultSrc],
            FontSrc => &[FontSrc, DefaultSrc],
            ImgSrc => &[ImgSrc, DefaultSrc],
            ManifestSrc => &[ManifestSrc, DefaultSrc],
            MediaSrc => &[MediaSrc, DefaultSrc],
            ObjectSrc => &[ObjectSrc, DefaultSrc],
            PrefetchSrc => &[PrefetchSrc, DefaultSrc],
            ScriptSrc => &[ScriptSrc, DefaultSrc],
            StyleSrc => &[StyleSrc, DefaultSrc],
            DefaultSrc => &[DefaultSrc],
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Keyword bit sets
// =============================================================================

bitflags::bitflags! {
    /// Boolean keywords of the source-expression grammar.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SourceKeywords: u8 {
        const UNSAFE_INLINE = 1 << 0;
        const UNSAFE_EVAL = 1 << 1;
        const STRICT_DYNAMIC = 1 << 2;
        const UNSAFE_HASHES = 1 << 3;
        const REPORT_SAMPLE = 1 << 4;
        const UNSAFE_ALLOW_REDIRECTS = 1 << 5;
    }
}

impl SourceKeywords {
    /// Match a quoted keyword token (already ASCII-folded).
    pub fn from_token(token: &str) -> Option<SourceKeywords> {
        match token {
            "'unsafe-inline'" => Some(SourceKeywords::UNSAFE_INLINE),
            "'unsafe-eval'" => Some(SourceKeywords::UNSAFE_EVAL),
            "'strict-dynamic'" => Some(SourceKeywords::STRICT_DYNAMIC),
            "'unsafe-hashes'" => Some(SourceKeywords::UNSAFE_HASHES),
            "'report-sample'" => Some(SourceKeywords::REPORT_SAMPLE),
            "'unsafe-allow-redirects'" => Some(SourceKeywords::UNSAFE_ALLOW_REDIRECTS),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// The sandbox keyword flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SandboxKeywords: u16 {
        const ALLOW_DOWNLOADS = 1 << 0;
        const ALLOW_FORMS = 1 << 1;
        const ALLOW_MODALS = 1 << 2;
        const ALLOW_ORIENTATION_LOCK = 1 << 3;
        const ALLOW_POINTER_LOCK = 1 << 4;
        const ALLOW_POPUPS = 1 << 5;
        const ALLOW_POPUPS_TO_ESCAPE_SANDBOX = 1 << 6;
        const ALLOW_PRESENTATION = 1 << 7;
        const ALLOW_SAME_ORIGIN = 1 << 8;
        const ALLOW_SCRIPTS = 1 << 9;
        const ALLOW_STORAGE_ACCESS_BY_USER_ACTIVATION = 1 << 10;
        const ALLOW_TOP_NAVIGATION = 1 << 11;
        const ALLOW_TOP_NAVIGATION_BY_USER_ACTIVATION = 1 << 12;
    }
}

impl SandboxKeywords {
    /// Match a sandbox keyword (already ASCII-folded).
    pub fn from_keyword(keyword: &str) -> Option<SandboxKeywords> {
        match keyword {
            "allow-downloads" => Some(SandboxKeywords::ALLOW_DOWNLOADS),
            "allow-forms" => Some(SandboxKeywords::ALLOW_FORMS),
            "allow-modals" => Some(SandboxKeywords::ALLOW_MODALS),
            "allow-orientation-lock" => Some(SandboxKeywords::ALLOW_ORIENTATION_LOCK),
            "allow-pointer-lock" => Some(SandboxKeywords::ALLOW_POINTER_LOCK),
            "allow-popups" => Some(SandboxKeywords::ALLOW_POPUPS),
            "allow-popups-to-escape-sandbox" => {
                Some(SandboxKeywords::ALLOW_POPUPS_TO_ESCAPE_SANDBOX)
            }
            "allow-presentation" => Some(SandboxKeywords::ALLOW_PRESENTATION),
            "allow-same-origin" => Some(SandboxKeywords::ALLOW_SAME_ORIGIN),
            "allow-scripts" => Some(SandboxKeywords::ALLOW_SCRIPTS),
            "allow-storage-access-by-user-activation" => {
                Some(SandboxKeywords::ALLOW_STORAGE_ACCESS_BY_USER_ACTIVATION)
            }
            "allow-top-navigation" => Some(SandboxKeywords::ALLOW_TOP_NAVIGATION),
            "allow-top-navigation-by-user-activation" => {
                Some(SandboxKeywords::ALLOW_TOP_NAVIGATION_BY_USER_ACTIVATION)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_kind_round_trip() {
        for kind in FetchKind::ALL {
            assert_eq!(FetchKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(FetchKind::from_name("frame-ancestors"), None);
    }

    #[test]
    fn test_fallback_chains_end_in_default() {
        for kind in FetchKind::ALL {
            let chain = kind.fallback_chain();
            assert_eq!(chain[0], kind);
            assert_eq!(*chain.last().unwrap(), FetchKind::DefaultSrc);
        }
    }

    #[test]
    fn test_worker_chain_passes_through_script() {
        assert_eq!(
            FetchKind::WorkerSrc.fallback_chain(),
            &[
                FetchKind::WorkerSrc,
                FetchKind::ChildSrc,
                FetchKind::ScriptSrc,
                FetchKind::DefaultSrc
            ]
        );
        // frame-src skips script-src entirely.
        assert_eq!(
            FetchKind::FrameSrc.fallback_chain(),
            &[FetchKind::FrameSrc, FetchKind::ChildSrc, FetchKind::DefaultSrc]
        );
    }

    #[test]
    fn test_source_keyword_tokens() {
        assert_eq!(
            SourceKeywords::from_token("'unsafe-inline'"),
            Some(SourceKeywords::UNSAFE_INLINE)
        );
        assert_eq!(SourceKeywords::from_token("unsafe-inline"), None);
        assert_eq!(SourceKeywords::from_token("'unsafe-redirect'"), None);
    }

    #[test]
    fn test_sandbox_keywords() {
        assert_eq!(
            SandboxKeywords::from_keyword("allow-scripts"),
            Some(SandboxKeywords::ALLOW_SCRIPTS)
        );
        assert_eq!(SandboxKeywords::from_keyword("'allow-scripts'"), None);
    }
}
