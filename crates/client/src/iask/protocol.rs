//! Push-channel wire protocol helpers.
//!
//! The service speaks the Phoenix LiveView framing: JSON arrays of the form
//! `[join_ref, ref, topic, event, payload]`. After the join handshake the
//! payload at index 4 carries render diffs; the incremental content chunk
//! normally sits at `diff.e[0][1].data`, but the diff shape is not
//! contractually stable, so a bounded deep search backs the known path up.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use super::session::ProviderSession;

/// Maximum recursion depth for [`deep_find`], so a malformed payload cannot
/// recurse unboundedly.
pub(crate) const MAX_SEARCH_DEPTH: usize = 8;

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<p>.+?</p>").expect("valid paragraph pattern"));

/// Build the single join control frame sent on connection open.
pub(crate) fn join_frame(session: &ProviderSession) -> String {
    json!([
        null,
        null,
        format!("lv:{}", session.phx_id),
        "phx_join",
        {
            "params": { "_csrf_token": session.csrf_token },
            "url": session.page_url,
            "session": session.phx_session,
        }
    ])
    .to_string()
}

/// Read the incremental content chunk at the known diff path, if present.
pub(crate) fn chunk_at_known_path(diff: &Value) -> Option<&str> {
    diff.get("e")?.get(0)?.get(1)?.get("data")?.as_str()
}

/// Depth-first search of a diff for the first string that looks like a
/// rendered paragraph. Arrays and object values are descended in order;
/// scalars other than matching strings are skipped.
pub(crate) fn deep_find(value: &Value, depth: usize) -> Option<&str> {
    if depth == 0 {
        return None;
    }

    let children: Box<dyn Iterator<Item = &Value>> = match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(map) => Box::new(map.values()),
        _ => return None,
    };

    for child in children {
        if let Some(found) = deep_find(child, depth - 1) {
            return Some(found);
        }
        if let Value::String(text) = child {
            if PARAGRAPH_RE.is_match(text) {
                return Some(text);
            }
        }
    }

    None
}
