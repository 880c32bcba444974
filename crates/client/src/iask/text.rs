//! Answer fragment rendering.
//!
//! Streamed fragments arrive either as HTML or as plain text with literal
//! `<br/>` markers. HTML is flattened to readable text in document order:
//! headings become bolded lines, paragraphs lose the service's attribution
//! preamble and footnote markers, lists become dash items, and the
//! footnotes block becomes a labeled sources section.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

static PREAMBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^According to Ask AI & Question AI www\.iAsk\.ai:\s*").expect("valid preamble pattern")
});

static FOOTNOTE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]\(#fn:\d+ 'see footnote'\)").expect("valid footnote pattern"));

/// Render one streamed fragment to readable text.
///
/// HTML-tagged fragments go through the structural transform; plain
/// fragments only have their literal line-break markers replaced. Bare
/// `<br/>` markers alone don't count as markup, otherwise the marker path
/// would be unreachable.
pub(crate) fn render_chunk(chunk: &str) -> String {
    if TAG_RE.is_match(&chunk.replace("<br/>", "")) {
        html_to_text(chunk)
    } else {
        chunk.replace("<br/>", "\n")
    }
}

/// Flatten an HTML fragment to text, element by element in document order.
pub(crate) fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let (Ok(block_sel), Ok(li_sel), Ok(a_sel)) =
        (Selector::parse("h1, h2, h3, p, ol, ul, div"), Selector::parse("li"), Selector::parse("a"))
    else {
        return html.to_string();
    };

    let mut out = String::new();
    for element in fragment.select(&block_sel) {
        // footnote content renders only through the sources section
        if in_footnotes(element) {
            continue;
        }

        match element.value().name() {
            "h1" | "h2" | "h3" => {
                out.push_str(&format!("\n**{}**\n", text_of(element)));
            }
            "p" => {
                let text = text_of(element);
                let text = PREAMBLE_RE.replace(&text, "");
                let text = FOOTNOTE_MARKER_RE.replace_all(&text, "");
                let text = text.trim();
                if !text.is_empty() {
                    out.push_str(text);
                    out.push('\n');
                }
            }
            "ol" | "ul" => {
                for li in element.select(&li_sel) {
                    out.push_str(&format!("- {}\n", text_of(li)));
                }
            }
            "div" if has_class(element, "footnotes") => {
                out.push_str("\n**Authoritative Sources**\n");
                for li in element.select(&li_sel) {
                    if let Some(link) = li.select(&a_sel).next() {
                        let href = link.value().attr("href").unwrap_or("");
                        out.push_str(&format!("- {} ({href})\n", text_of(link)));
                    }
                }
            }
            _ => {}
        }
    }

    out
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn in_footnotes(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "div" && has_class(ancestor, "footnotes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_bolded() {
        assert_eq!(html_to_text("<h2>Overview</h2>"), "\n**Overview**\n");
    }

    #[test]
    fn test_paragraph_preamble_stripped() {
        let html = "<p>According to Ask AI &amp; Question AI www.iAsk.ai: Rust is a systems language.</p>";
        assert_eq!(html_to_text(html), "Rust is a systems language.\n");
    }

    #[test]
    fn test_footnote_markers_removed() {
        let html = "<p>Rust is memory safe[1](#fn:1 'see footnote') and fast[2](#fn:2 'see footnote').</p>";
        assert_eq!(html_to_text(html), "Rust is memory safe and fast.\n");
    }

    #[test]
    fn test_list_items_dashed() {
        let html = "<ul><li>Ownership</li><li>Borrowing</li></ul>";
        assert_eq!(html_to_text(html), "- Ownership\n- Borrowing\n");
    }

    #[test]
    fn test_footnotes_render_as_sources_section() {
        let html = concat!(
            "<p>Answer body.</p>",
            "<div class=\"footnotes\"><ol>",
            "<li><a href=\"https://example.com/a\">Example A</a></li>",
            "<li><a href=\"https://example.com/b\">Example B</a></li>",
            "</ol></div>",
        );
        let text = html_to_text(html);
        assert_eq!(
            text,
            "Answer body.\n\n**Authoritative Sources**\n- Example A (https://example.com/a)\n- Example B (https://example.com/b)\n"
        );
    }

    #[test]
    fn test_footnote_items_not_double_emitted() {
        let html = "<div class=\"footnotes\"><ol><li><a href=\"https://example.com\">Source</a></li></ol></div>";
        let text = html_to_text(html);
        assert_eq!(text.matches("Source").count(), 1);
    }

    #[test]
    fn test_empty_paragraph_skipped() {
        assert_eq!(html_to_text("<p>   </p><p>kept</p>"), "kept\n");
    }

    #[test]
    fn test_plain_chunk_replaces_break_markers() {
        assert_eq!(render_chunk("line one<br/>line two"), "line one\nline two");
    }

    #[test]
    fn test_tagged_chunk_goes_through_transform() {
        assert_eq!(render_chunk("<p>body</p>"), "body\n");
    }
}
