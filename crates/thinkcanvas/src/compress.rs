//! Preview derivation for node content.
//!
//! A node's `content_compressed` is always derived from `content_full` and is
//! never edited on its own. Structured analytical output (a JSON object with a
//! `summary` key, bare or inside a fenced code block) surfaces that summary;
//! prose surfaces its first substantive line, skipping the conversational
//! preamble models tend to open with.

use regex::Regex;
use std::sync::LazyLock;

/// Default cap for derived previews, in characters.
pub const DEFAULT_COMPRESSION_LENGTH: usize = 100;

const ELLIPSIS: &str = "...";

/// Lines starting with one of these (case-insensitive) are treated as preamble.
const PREAMBLE_PREFIXES: &[&str] = &[
    "i'll apply",
    "i will apply",
    "okay",
    "ok,",
    "sure,",
    "let me",
    "i'll run",
    "i will run",
    "applying",
    "running",
    "here's",
    "---",
];

/// Markdown headers shorter than this are usually just a skill name.
const SHORT_HEADER_LEN: usize = 30;

/// Lines shorter than this are usually dividers or labels.
const MIN_SUBSTANTIVE_LEN: usize = 10;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("fenced block pattern is valid")
});

/// Derive a preview of at most `max_len` characters from `content`.
///
/// # Examples
///
/// ```
/// use thinkcanvas::v1::compress;
///
/// let preview = compress("Okay, let's go.\n\nThe cache must be invalidated on write.", 100);
/// assert_eq!(preview, "The cache must be invalidated on write.");
///
/// let artifact = "```json\n{\"summary\": \"Two hidden assumptions\", \"blocks\": []}\n```";
/// assert_eq!(compress(artifact, 100), "Two hidden assumptions");
/// ```
pub fn compress(content: &str, max_len: usize) -> String {
    if let Some(summary) = extract_json_summary(content) {
        return truncate(&summary, max_len);
    }

    let lines: Vec<&str> = content
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if let Some(line) = lines.iter().find(|l| is_substantive(l)) {
        return truncate(line, max_len);
    }

    match lines.first() {
        Some(first) => truncate(first, max_len),
        None => truncate(content, max_len),
    }
}

fn is_substantive(line: &str) -> bool {
    let lower = line.to_lowercase();
    if PREAMBLE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return false;
    }
    let len = line.chars().count();
    if line.starts_with('#') && len < SHORT_HEADER_LEN {
        return false;
    }
    len >= MIN_SUBSTANTIVE_LEN
}

/// Pull the `summary` string out of a JSON artifact, fenced or bare.
pub(crate) fn extract_json_summary(content: &str) -> Option<String> {
    let trimmed = content.trim();
    let json_str = match FENCED_BLOCK.captures(content).and_then(|c| c.get(1)) {
        Some(m) if !m.as_str().is_empty() => m.as_str(),
        _ if trimmed.starts_with('{') => trimmed,
        _ => return None,
    };

    let parsed: serde_json::Value = serde_json::from_str(json_str).ok()?;
    match parsed.get("summary") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Cut `text` to `max_len` characters, ending in `...` when shortened.
///
/// Caps too small to hold the ellipsis get a bare prefix instead.
pub(crate) fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return text.chars().take(max_len).collect();
    }
    let keep = max_len - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
