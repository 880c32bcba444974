//! DuckDuckGo redirect-wrapper decoding.
//!
//! Result links on the HTML results page are usually wrapped in a redirect
//! URL (`/l/?uddg=...` for organic results, `/y.js?u3=...` for ads). This
//! module recovers the true destination. Decoding never fails; each
//! unrecognized or malformed shape degrades to the next fallback tier.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Origin used to anchor relative hrefs from the results page.
const ORIGIN: &str = "https://duckduckgo.com";

/// Rescue pattern for inputs that are not well-formed URLs but contain one.
static URL_RESCUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("valid URL rescue pattern"));

/// Extract the destination URL from a results-page href.
///
/// Protocol-relative and path-relative inputs are anchored to the backend
/// origin first. Recognized wrappers are unwrapped; anything else is
/// returned as-is, and inputs that fail URL parsing fall back to the first
/// URL-shaped substring, then to the input verbatim.
pub fn decode_redirect(href: &str) -> String {
    let anchored = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{ORIGIN}{href}")
    } else {
        href.to_string()
    };

    let Ok(url) = Url::parse(&anchored) else {
        return match URL_RESCUE_RE.find(&anchored) {
            Some(embedded) => embedded.as_str().to_string(),
            None => anchored,
        };
    };

    if url.host_str() == Some("duckduckgo.com") && url.path() == "/l/" {
        if let Some((_, uddg)) = url.query_pairs().find(|(key, _)| key == "uddg") {
            return uddg.into_owned();
        }
    }

    // Ad clicks wrap the destination one level deeper: the u3 parameter is
    // itself a URL whose ld parameter holds the real target.
    if url.host_str() == Some("duckduckgo.com") && url.path() == "/y.js" {
        if let Some((_, u3)) = url.query_pairs().find(|(key, _)| key == "u3") {
            let decoded = u3.into_owned();
            return match Url::parse(&decoded) {
                Ok(inner) => match inner.query_pairs().find(|(key, _)| key == "ld") {
                    Some((_, ld)) => ld.into_owned(),
                    None => decoded,
                },
                Err(_) => anchored,
            };
        }
    }

    anchored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_organic_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc123";
        assert_eq!(decode_redirect(href), "https://example.com/page");
    }

    #[test]
    fn test_decode_path_relative_redirect() {
        let href = "/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F";
        assert_eq!(decode_redirect(href), "https://www.rust-lang.org/");
    }

    #[test]
    fn test_decode_ad_redirect_with_ld() {
        let u3 = "https://www.bing.com/aclick?ld=https%3A%2F%2Fadvertiser.example%2Flanding&other=1";
        let href = format!("https://duckduckgo.com/y.js?u3={}", url::form_urlencoded::byte_serialize(u3.as_bytes()).collect::<String>());
        assert_eq!(decode_redirect(&href), "https://advertiser.example/landing");
    }

    #[test]
    fn test_decode_ad_redirect_without_ld_returns_inner_url() {
        let u3 = "https://www.bing.com/aclick?other=1";
        let href = format!("https://duckduckgo.com/y.js?u3={}", url::form_urlencoded::byte_serialize(u3.as_bytes()).collect::<String>());
        assert_eq!(decode_redirect(&href), u3);
    }

    #[test]
    fn test_decode_ad_redirect_with_malformed_inner_returns_input() {
        let href = "https://duckduckgo.com/y.js?u3=not%20a%20url";
        assert_eq!(decode_redirect(href), href);
    }

    #[test]
    fn test_non_wrapper_url_unchanged() {
        let href = "https://doc.rust-lang.org/book/";
        assert_eq!(decode_redirect(href), href);
    }

    #[test]
    fn test_malformed_input_extracts_embedded_url() {
        let href = "click here <https://example.com/embedded> now";
        assert_eq!(decode_redirect(href), "https://example.com/embedded");
    }

    #[test]
    fn test_malformed_input_without_url_returned_verbatim() {
        assert_eq!(decode_redirect("no url at all"), "no url at all");
    }

    #[test]
    fn test_other_duckduckgo_paths_unchanged() {
        let href = "https://duckduckgo.com/html/?q=rust";
        assert_eq!(decode_redirect(href), href);
    }
}
