//! Shared HTTP plumbing: client construction, User-Agent rotation, and
//! network error classification.
//!
//! Both backends present a rotating browser identity instead of a bot
//! User-Agent; a configured identity pins it instead.

use std::time::Duration;

use fathom_core::Error;
use rand::seq::SliceRandom;

/// Realistic browser User-Agent strings, rotated per attempt.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Build a [`reqwest::Client`] with the given request timeout.
///
/// The User-Agent is set per request so each attempt can present a fresh
/// identity.
///
/// # Errors
///
/// Returns [`Error::Network`] if the client cannot be constructed.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest failure into the unified taxonomy, naming the backend.
pub(crate) fn map_reqwest_error(backend: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::Timeout(format!("{backend}: request timed out"));
    }
    classify_net_error(backend, &err)
}

/// Walk an error's source chain looking for an I/O failure to classify.
pub(crate) fn classify_net_error(backend: &str, err: &(dyn std::error::Error + 'static)) -> Error {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return classify_io_error(backend, io);
        }
        source = current.source();
    }
    Error::Network(format!("{backend}: {err}"))
}

pub(crate) fn classify_io_error(backend: &str, err: &std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::ConnectionRefused => Error::ConnectionRefused(format!("{backend}: connection refused")),
        std::io::ErrorKind::TimedOut => Error::Timeout(format!("{backend}: connection timed out")),
        _ if is_dns_failure(err) => Error::DnsFailure(format!("{backend}: unable to resolve host")),
        _ => Error::Network(format!("{backend}: {err}")),
    }
}

/// Resolver failures surface as uncategorized I/O errors; recognize them by
/// the getaddrinfo wording.
fn is_dns_failure(err: &std::io::Error) -> bool {
    let text = err.to_string();
    text.contains("lookup") || text.contains("resolve") || text.contains("Name or service not known")
}
