//! CSP CLI
//!
//! CLI tool for checking policies, normalizing their serialization, and
//! running allow/deny queries against them.

use std::fs;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use csp_core::types::{Diagnostic, Severity};
use csp_core::url::Url;
use csp_policy::{Policy, PolicyList};

#[derive(Parser)]
#[command(name = "csp-cli")]
#[command(about = "Content-Security-Policy checker and query tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a policy and report diagnostics
    Check {
        /// Policy text (or @path to read a file)
        policy: String,

        /// Treat the input as a comma-separated policy list
        #[arg(short, long)]
        list: bool,

        /// Emit diagnostics as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Parse a policy and print its normalized serialization
    Fmt {
        /// Policy text (or @path to read a file)
        policy: String,

        /// Treat the input as a comma-separated policy list
        #[arg(short, long)]
        list: bool,
    },

    /// Ask whether a policy allows a load in a given category
    Query {
        /// Policy text (or @path to read a file)
        policy: String,

        /// Load category to check
        #[arg(short, long)]
        category: Category,

        /// Resource URL
        #[arg(short, long)]
        url: String,

        /// Document origin URL
        #[arg(short, long, default_value = "https://example.com")]
        origin: String,

        /// Nonce presented by the element (script/style only)
        #[arg(short, long)]
        nonce: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
    Script,
    Style,
    Image,
    Font,
    Media,
    Object,
    Frame,
    Connect,
    Worker,
    Manifest,
    Prefetch,
    FormAction,
    FrameAncestor,
    BaseUri,
    Navigate,
}

#[derive(Serialize)]
struct DiagnosticReport<'a> {
    severity: String,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy_index: Option<usize>,
    directive_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_index: Option<usize>,
}

impl<'a> From<&'a Diagnostic> for DiagnosticReport<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        DiagnosticReport {
            severity: d.severity.to_string(),
            message: &d.message,
            policy_index: d.policy_index,
            directive_index: d.directive_index,
            value_index: d.value_index,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { policy, list, json } => cmd_check(&policy, list, json),
        Commands::Fmt { policy, list } => cmd_fmt(&policy, list),
        Commands::Query {
            policy,
            category,
            url,
            origin,
            nonce,
        } => cmd_query(&policy, category, &url, &origin, nonce.as_deref()),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

/// A leading `@` reads the policy from a file, like curl's data arguments.
fn load_policy_text(arg: &str) -> Result<String, String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
            Ok(text.trim_end_matches(['\r', '\n']).to_string())
        }
        None => Ok(arg.to_string()),
    }
}

fn parse_input(text: &str, list: bool) -> Result<Vec<Diagnostic>, String> {
    let mut diagnostics = Vec::new();
    let mut sink = |d: Diagnostic| diagnostics.push(d);
    if list {
        PolicyList::parse(text, &mut sink).map_err(|e| e.to_string())?;
    } else {
        Policy::parse(text, &mut sink).map_err(|e| e.to_string())?;
    }
    Ok(diagnostics)
}

fn cmd_check(policy: &str, list: bool, json: bool) -> Result<i32, String> {
    let text = load_policy_text(policy)?;
    let diagnostics = parse_input(&text, list)?;

    if json {
        let reports: Vec<DiagnosticReport> = diagnostics.iter().map(Into::into).collect();
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Failed to serialize diagnostics: {}", e))?;
        println!("{out}");
    } else if diagnostics.is_empty() {
        println!("OK: no diagnostics");
    } else {
        for d in &diagnostics {
            println!("{d}");
        }
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    Ok(if has_errors { 1 } else { 0 })
}

fn cmd_fmt(policy: &str, list: bool) -> Result<i32, String> {
    let text = load_policy_text(policy)?;
    let mut sink = |_d: Diagnostic| {};
    if list {
        let parsed = PolicyList::parse(&text, &mut sink).map_err(|e| e.to_string())?;
        println!("{parsed}");
    } else {
        let parsed = Policy::parse(&text, &mut sink).map_err(|e| e.to_string())?;
        println!("{parsed}");
    }
    Ok(0)
}

fn cmd_query(
    policy: &str,
    category: Category,
    url: &str,
    origin: &str,
    nonce: Option<&str>,
) -> Result<i32, String> {
    let text = load_policy_text(policy)?;
    let mut sink = |_d: Diagnostic| {};
    let parsed = Policy::parse(&text, &mut sink).map_err(|e| e.to_string())?;

    let url = Url::parse(url).ok_or_else(|| format!("Invalid URL '{}'", url))?;
    let origin = match Url::parse(origin) {
        Some(Url::Network(net)) => net,
        _ => return Err(format!("Invalid origin '{}'", origin)),
    };

    let url = Some(&url);
    let origin = Some(&origin);
    let allowed = match category {
        Category::Script => parsed.allows_external_script(url, origin, nonce, &[], None),
        Category::Style => parsed.allows_external_style(url, origin, nonce),
        Category::Image => parsed.allows_image(url, origin),
        Category::Font => parsed.allows_font(url, origin),
        Category::Media => parsed.allows_media(url, origin),
        Category::Object => parsed.allows_object(url, origin),
        Category::Frame => parsed.allows_frame(url, origin),
        Category::Connect => parsed.allows_connection(url, origin),
        Category::Worker => parsed.allows_worker(url, origin),
        Category::Manifest => parsed.allows_manifest(url, origin),
        Category::Prefetch => parsed.allows_prefetch(url, origin),
        Category::FormAction => parsed.allows_form_action(url, origin),
        Category::FrameAncestor => parsed.allows_frame_ancestor(url, origin),
        Category::BaseUri => parsed.allows_base_uri(url, origin),
        Category::Navigate => parsed.allows_navigation(url, origin, Some(false), None),
    };

    println!("{}", if allowed { "ALLOW" } else { "BLOCK" });
    Ok(if allowed { 0 } else { 1 })
}
