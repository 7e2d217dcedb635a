//! Turning `CliOutput` into reply text.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use super::runner::CliOutput;

/// Hosted previews live under this domain.
pub const PREVIEW_DOMAIN: &str = "wp.build";

/// Canonical failure text for a non-zero exit.
///
/// Always names the label and the exit code; stderr/stdout blocks are
/// included only when they have content.
pub fn format_cli_failure(label: &str, res: &CliOutput) -> String {
    let mut out = format!("`{label}` failed with exit code {}.", res.exit_code);
    let stderr = res.stderr.trim();
    if !stderr.is_empty() {
        out.push_str("\n\nstderr:\n");
        out.push_str(stderr);
    }
    let stdout = res.stdout.trim();
    if !stdout.is_empty() {
        out.push_str("\n\nstdout:\n");
        out.push_str(stdout);
    }
    out
}

/// Trimmed text, or `placeholder` when nothing is left.
pub fn text_or(text: &str, placeholder: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"https?://[^\s"'<>()\x00-\x1f\x7f]+"#)
            .expect("static URL pattern is valid")
    })
}

fn is_preview_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == PREVIEW_DOMAIN || host.ends_with(&format!(".{PREVIEW_DOMAIN}"))
}

/// First http(s) URL in `text` whose host is under [`PREVIEW_DOMAIN`].
///
/// Returned exactly as it appears in the text, minus trailing sentence
/// punctuation.
pub fn extract_preview_url(text: &str) -> Option<String> {
    url_pattern()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
        .find(|candidate| {
            Url::parse(candidate)
                .ok()
                .and_then(|u| u.host_str().map(is_preview_host))
                .unwrap_or(false)
        })
        .map(str::to_string)
}
