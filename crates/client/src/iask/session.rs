//! Session bootstrap page parsing.
//!
//! The landing page embeds everything the push channel needs: a CSRF token
//! in a meta tag, a LiveView component id (`phx-` prefixed), and an opaque
//! session blob on the same element. The session is request-scoped and
//! never reused.

use scraper::{Html, Selector};

use fathom_core::Error;

/// Ephemeral session state extracted from one bootstrap response.
#[derive(Debug, Clone)]
pub(crate) struct ProviderSession {
    pub csrf_token: String,
    pub phx_id: String,
    pub phx_session: String,
    /// Final page URL after redirects, echoed back in the join frame.
    pub page_url: String,
}

/// Extract session tokens from the landing page markup.
///
/// A missing component id or CSRF token means the service contract changed
/// or the request was rejected; that is fatal and not retried. A missing
/// session blob is tolerated.
pub(crate) fn parse_session_page(html: &str, page_url: &str) -> Result<ProviderSession, Error> {
    let document = Html::parse_document(html);

    let csrf_sel = parse_selector(r#"[name="csrf-token"]"#)?;
    let phx_sel = parse_selector(r#"[id^="phx-"]"#)?;

    let csrf_token = document
        .select(&csrf_sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string);
    let phx_node = document.select(&phx_sel).next();
    let phx_id = phx_node.and_then(|el| el.value().attr("id")).map(str::to_string);

    let (Some(csrf_token), Some(phx_id)) = (csrf_token, phx_id) else {
        return Err(Error::Protocol("iask: failed to extract session tokens from landing page".into()));
    };

    let phx_session = phx_node
        .and_then(|el| el.value().attr("data-phx-session"))
        .unwrap_or_default()
        .to_string();

    Ok(ProviderSession { csrf_token, phx_id, phx_session, page_url: page_url.to_string() })
}

fn parse_selector(text: &str) -> Result<Selector, Error> {
    Selector::parse(text).map_err(|e| Error::Parse(format!("invalid selector {text:?}: {e:?}")))
}
