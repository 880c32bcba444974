//! Results-page markup parsing.
//!
//! Extracted as free functions over the raw HTML so layouts can be tested
//! with fixture pages, without a network round trip.

use scraper::{Html, Selector};

use crate::duckduckgo::redirect::decode_redirect;
use crate::result::{favicon_url, reader_url};
use fathom_core::Error;

/// Candidate result-block selectors, one per page layout the backend may
/// serve. The first selector with at least one match wins; results are
/// never merged across selectors.
const RESULT_BLOCK_SELECTORS: &[&str] = &[".result", ".results_links", ".web-result"];

/// One result block as parsed off the page, before normalization.
#[derive(Debug, Clone)]
pub(crate) struct ParsedResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub display_url: String,
    pub favicon: String,
    pub reader_url: String,
}

/// Parse a results page into an ordered list of result blocks.
///
/// Blocks missing a title or a resolvable link are skipped. An empty vec
/// means the page carried no recognizable results under any known layout.
pub(crate) fn parse_results(html: &str, reader_base: &str) -> Result<Vec<ParsedResult>, Error> {
    let document = Html::parse_document(html);

    let title_sel = parse_selector(".result__title a, .rt-title a")?;
    let snippet_sel = parse_selector(".result__snippet, .rt-snippet")?;
    let display_sel = parse_selector(".result__url, .rt-url")?;

    for block_selector in RESULT_BLOCK_SELECTORS {
        let block_sel = parse_selector(block_selector)?;
        let mut items = Vec::new();

        for block in document.select(&block_sel) {
            let Some(title_el) = block.select(&title_sel).next() else {
                continue;
            };
            let title = title_el.text().collect::<String>().trim().to_string();
            let Some(href) = title_el.value().attr("href") else {
                continue;
            };

            let url = decode_redirect(href);
            if title.is_empty() || url.is_empty() {
                continue;
            }

            let snippet = block
                .select(&snippet_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let display_url = block
                .select(&display_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            items.push(ParsedResult {
                favicon: favicon_url(&url),
                reader_url: reader_url(reader_base, &url).unwrap_or_default(),
                title,
                url,
                snippet,
                display_url,
            });
        }

        if !items.is_empty() {
            tracing::debug!(selector = block_selector, count = items.len(), "results parsed");
            return Ok(items);
        }
    }

    Ok(Vec::new())
}

fn parse_selector(text: &str) -> Result<Selector, Error> {
    Selector::parse(text).map_err(|e| Error::Parse(format!("invalid selector {text:?}: {e:?}")))
}
