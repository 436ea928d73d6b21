//! File extension policies for downloaded media.
//!
//! Media URLs rarely end in a clean extension, so the name of a downloaded
//! file is guessed from a fixed list of policies, tried in order:
//!
//! 1. [`ExtensionSource::UrlPattern`]: an extension right before the query
//!    string, e.g. `https://cdn/abc.jpg?sig=1` gives `jpg`.
//! 2. [`ExtensionSource::TailHeuristic`]: the last three characters of the URL.
//! 3. [`ExtensionSource::ContentType`]: the MIME subtype of the response. Only
//!    known after the request, so it only names the alternate file checked
//!    before writing.

use std::sync::OnceLock;

use log::warn;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionSource {
    UrlPattern,
    TailHeuristic,
    ContentType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExtension {
    pub extension: String,
    pub source: ExtensionSource,
}

fn url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\.([a-z0-9]+)\?").ok())
        .as_ref()
}

/// Extension immediately preceding the query string, if any
pub fn url_pattern_extension(url: &str) -> Option<String> {
    url_pattern()?
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Last three characters of the URL
pub fn tail_heuristic_extension(url: &str) -> String {
    let chars: Vec<char> = url.chars().collect();
    let start = chars.len().saturating_sub(3);
    chars[start..].iter().collect()
}

/// Extension derived from a `Content-Type` header value, `jpeg` normalized to `jpg`
pub fn content_type_extension(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next()?.trim();
    let (_, subtype) = mime.split_once('/')?;
    let subtype = subtype.trim().to_lowercase();

    match subtype.as_str() {
        "" => None,
        "jpeg" => Some("jpg".to_string()),
        _ => Some(subtype),
    }
}

/// Resolve the extension used for the nominal file name of a source URL
pub fn resolve_url_extension(url: &str) -> ResolvedExtension {
    match url_pattern_extension(url) {
        Some(extension) => ResolvedExtension {
            extension,
            source: ExtensionSource::UrlPattern,
        },
        None => {
            let extension = tail_heuristic_extension(url);
            if !is_plain_extension(&extension) {
                warn!(
                    "Guessed extension '{}' for {} is not alphanumeric, the file may not be writable",
                    extension, url
                );
            }
            ResolvedExtension {
                extension,
                source: ExtensionSource::TailHeuristic,
            }
        }
    }
}

/// True when `extension` is non-empty ASCII letters and digits
pub fn is_plain_extension(extension: &str) -> bool {
    !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric())
}
