//! Normalized result types shared by every provider.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Normalized web search result.
///
/// `url` is always the de-redirected destination, never an intermediate
/// wrapper URL. `description` is populated only when detailed-mode
/// enrichment runs; results are rebuilt rather than mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Destination URL.
    pub url: String,
    /// Short text snippet from the results page.
    pub snippet: String,
    /// Human-readable URL as shown on the results page.
    #[serde(default)]
    pub display_url: String,
    /// Favicon URL derived from the destination host.
    #[serde(default)]
    pub favicon: String,
    /// Full page content, filled by detailed-mode enrichment.
    #[serde(default)]
    pub description: String,
}

/// Scrape output shape: basic listing or listing enriched with page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Short,
    Detailed,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Short => write!(f, "short"),
            SearchMode::Detailed => write!(f, "detailed"),
        }
    }
}

/// Question mode for the realtime answer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AskMode {
    Question,
    Academic,
    Forums,
    Wiki,
    #[default]
    Thinking,
}

impl fmt::Display for AskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskMode::Question => write!(f, "question"),
            AskMode::Academic => write!(f, "academic"),
            AskMode::Forums => write!(f, "forums"),
            AskMode::Wiki => write!(f, "wiki"),
            AskMode::Thinking => write!(f, "thinking"),
        }
    }
}

/// Answer length requested from the realtime backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Concise,
    Detailed,
    Comprehensive,
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailLevel::Concise => write!(f, "concise"),
            DetailLevel::Detailed => write!(f, "detailed"),
            DetailLevel::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

/// Favicon URL for a destination, or empty when the URL doesn't parse.
pub fn favicon_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("https://www.google.com/s2/favicons?domain={host}&sz=32"),
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}

/// Companion reader URL serving the destination as plain text, or None when
/// the URL doesn't parse.
pub fn reader_url(base: &str, url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Some(format!("{base}/{parsed}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_display_matches_serde() {
        assert_eq!(SearchMode::Short.to_string(), "short");
        assert_eq!(SearchMode::Detailed.to_string(), "detailed");
        assert_eq!(serde_json::to_string(&SearchMode::Detailed).unwrap(), "\"detailed\"");

        assert_eq!(AskMode::Academic.to_string(), "academic");
        assert_eq!(serde_json::to_string(&AskMode::Academic).unwrap(), "\"academic\"");

        assert_eq!(DetailLevel::Comprehensive.to_string(), "comprehensive");
        assert_eq!(serde_json::to_string(&DetailLevel::Comprehensive).unwrap(), "\"comprehensive\"");
    }

    #[test]
    fn test_favicon_url() {
        assert_eq!(
            favicon_url("https://example.com/page"),
            "https://www.google.com/s2/favicons?domain=example.com&sz=32"
        );
        assert_eq!(favicon_url("not a url"), "");
    }

    #[test]
    fn test_reader_url_normalizes() {
        assert_eq!(
            reader_url("https://r.jina.ai", "https://example.com").as_deref(),
            Some("https://r.jina.ai/https://example.com/")
        );
        assert!(reader_url("https://r.jina.ai", "not a url").is_none());
    }

    #[test]
    fn test_result_serde_roundtrip() {
        let result = SearchResult {
            title: "Example".into(),
            url: "https://example.com/page".into(),
            snippet: "An example page".into(),
            display_url: "example.com".into(),
            favicon: favicon_url("https://example.com/page"),
            description: String::new(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: SearchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
