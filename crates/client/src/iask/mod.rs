//! iAsk.ai realtime question-answering provider.
//!
//! The backend has no documented API; answers are obtained by driving its
//! LiveView push channel directly. One request is one session: bootstrap
//! the landing page for tokens ([`session`]), open a websocket, send the
//! join frame ([`protocol`]), then accumulate streamed fragments
//! ([`text`]) until the peer closes, the response timeout elapses, or the
//! deep-search fallback yields a terminal answer. The connection is never
//! pooled or reused.

pub(crate) mod protocol;
pub(crate) mod session;
pub(crate) mod text;

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, Stream, StreamExt};
use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header};
use tokio_tungstenite::tungstenite::{self, Message};
use url::Url;

use crate::http;
use crate::result::{AskMode, DetailLevel};
use fathom_core::{CacheStore, Error};

use session::ProviderSession;

/// Answer returned when a session closes with nothing accumulated.
pub const NO_RESULTS_SENTINEL: &str = "No results found.";

/// TTL for cached answers.
const ANSWER_TTL_SECS: i64 = 300;

/// Push-channel protocol version presented on connect.
const WS_PROTO_VERSION: &str = "2.0.0";

/// iAsk provider configuration.
#[derive(Debug, Clone)]
pub struct IAskConfig {
    /// Landing endpoint (overridable for tests).
    pub base_url: String,
    /// Pinned User-Agent; None rotates through the browser pool.
    pub user_agent: Option<String>,
    /// Websocket connection-establishment timeout.
    pub connect_timeout: Duration,
    /// End-to-end answer timeout, started at join.
    pub response_timeout: Duration,
}

impl Default for IAskConfig {
    fn default() -> Self {
        Self {
            base_url: "https://iask.ai/".to_string(),
            user_agent: None,
            connect_timeout: Duration::from_secs(6),
            response_timeout: Duration::from_secs(20),
        }
    }
}

/// iAsk.ai realtime answer client.
#[derive(Clone, Debug)]
pub struct IAskClient {
    config: IAskConfig,
    cache: CacheStore,
}

/// One unit of websocket traffic as seen by the drive loop.
enum StreamEvent {
    Frame(String),
    Closed,
}

/// Whether a frame completed the answer.
enum FrameOutcome {
    Continue,
    Complete,
}

impl IAskClient {
    /// Create a client over the given cache.
    pub fn new(config: IAskConfig, cache: CacheStore) -> Self {
        Self { config, cache }
    }

    /// Ask the backend a question and return the accumulated answer text.
    ///
    /// A session that ends with nothing accumulated resolves to
    /// [`NO_RESULTS_SENTINEL`], not an error. Failures are not retried;
    /// the realtime protocol treats unexpected shapes as an upstream
    /// contract change.
    pub async fn ask(&self, query: &str, mode: AskMode, detail_level: Option<DetailLevel>) -> Result<String, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".into()));
        }

        let cache_key = answer_cache_key(query, mode, detail_level);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!(%mode, "answer cache hit");
            return Ok(cached);
        }

        let (session, cookie_header) = self.bootstrap(query, mode, detail_level).await?;
        let answer = self.stream_answer(&session, &cookie_header).await?;

        if !answer.is_empty() {
            self.cache.set(&cache_key, &answer, ANSWER_TTL_SECS).await;
        }
        tracing::debug!(%mode, chars = answer.len(), "answer completed");
        Ok(answer_or_sentinel(answer))
    }

    /// Fetch the landing page with a fresh cookie jar and extract the
    /// session tokens plus the cookie header for the websocket handshake.
    async fn bootstrap(
        &self, query: &str, mode: AskMode, detail_level: Option<DetailLevel>,
    ) -> Result<(ProviderSession, String), Error> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(self.config.response_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| Error::Network(format!("iask: failed to build HTTP client: {e}")))?;

        let mut params = vec![("mode".to_string(), mode.to_string()), ("q".to_string(), query.to_string())];
        if let Some(level) = detail_level {
            params.push(("options[detail_level]".to_string(), level.to_string()));
        }

        tracing::debug!(%mode, "fetching landing page");
        let response = client
            .get(&self.config.base_url)
            .query(&params)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .send()
            .await
            .map_err(|e| http::map_reqwest_error("iask", e))?;

        let page_url = response.url().clone();
        if !response.status().is_success() {
            return Err(Error::Protocol(format!("iask: landing page returned HTTP {}", response.status())));
        }

        let html = response.text().await.map_err(|e| http::map_reqwest_error("iask", e))?;
        let session = session::parse_session_page(&html, page_url.as_str())?;

        let cookie_header = jar
            .cookies(&page_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .unwrap_or_default();

        Ok((session, cookie_header))
    }

    /// Open the push channel, join, and accumulate the streamed answer.
    async fn stream_answer(&self, session: &ProviderSession, cookie_header: &str) -> Result<String, Error> {
        let (ws_url, origin) = self.websocket_url(session)?;

        let mut request = ws_url
            .into_client_request()
            .map_err(|e| Error::Protocol(format!("iask: invalid websocket request: {e}")))?;
        let headers = request.headers_mut();
        if !cookie_header.is_empty() {
            headers.insert(header::COOKIE, header_value(cookie_header)?);
        }
        headers.insert(header::ORIGIN, header_value(&origin)?);
        headers.insert(header::USER_AGENT, header_value(&self.user_agent())?);

        let (stream, _) = tokio::time::timeout(self.config.connect_timeout, connect_async(request))
            .await
            .map_err(|_| Error::Timeout("iask: unable to establish websocket connection".into()))?
            .map_err(|e| map_ws_error("iask", e))?;
        tracing::debug!("websocket connection established");

        let (mut write, read) = stream.split();
        write
            .send(Message::Text(protocol::join_frame(session)))
            .await
            .map_err(|e| map_ws_error("iask", e))?;

        let events = read.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(frame_text)) => Some(Ok(StreamEvent::Frame(frame_text))),
                Ok(Message::Close(_)) => Some(Ok(StreamEvent::Closed)),
                Ok(_) => None,
                Err(e) => Some(Err(map_ws_error("iask", e))),
            }
        });
        futures::pin_mut!(events);

        // dropping the halves tears the connection down on every exit path
        drive(events, self.config.response_timeout).await
    }

    fn websocket_url(&self, session: &ProviderSession) -> Result<(String, String), Error> {
        let page = Url::parse(&session.page_url)
            .or_else(|_| Url::parse(&self.config.base_url))
            .map_err(|e| Error::Protocol(format!("iask: invalid page URL: {e}")))?;
        let host = page
            .host_str()
            .ok_or_else(|| Error::Protocol("iask: page URL has no host".into()))?;

        let mut ws = Url::parse(&format!("wss://{host}/live/websocket"))
            .map_err(|e| Error::Protocol(format!("iask: invalid websocket URL: {e}")))?;
        ws.query_pairs_mut()
            .append_pair("_csrf_token", &session.csrf_token)
            .append_pair("vsn", WS_PROTO_VERSION);

        Ok((ws.into(), format!("https://{host}")))
    }

    fn user_agent(&self) -> String {
        self.config
            .user_agent
            .clone()
            .unwrap_or_else(|| http::random_user_agent().to_string())
    }
}

/// Consume events until a terminal condition, returning the accumulated
/// answer text.
///
/// Terminal conditions: the peer closes (possibly with nothing; the caller
/// maps that to the sentinel), a fallback deep-search hit completes the
/// answer, the response timeout elapses (partial content is returned if
/// anything accumulated, otherwise a timeout error), or a transport error.
async fn drive<S>(mut events: S, response_timeout: Duration) -> Result<String, Error>
where
    S: Stream<Item = Result<StreamEvent, Error>> + Unpin,
{
    let mut buffer = String::new();
    let deadline = tokio::time::sleep(response_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                if buffer.is_empty() {
                    return Err(Error::Timeout("iask: no response received".into()));
                }
                tracing::warn!(chars = buffer.len(), "response timeout elapsed, returning partial answer");
                break;
            }
            event = events.next() => match event {
                Some(Ok(StreamEvent::Frame(frame_text))) => {
                    if let FrameOutcome::Complete = apply_frame(&frame_text, &mut buffer) {
                        break;
                    }
                }
                Some(Ok(StreamEvent::Closed)) | None => break,
                Some(Err(e)) => return Err(e),
            }
        }
    }

    Ok(buffer)
}

/// Apply one inbound frame to the answer buffer.
fn apply_frame(frame_text: &str, buffer: &mut String) -> FrameOutcome {
    let Ok(msg) = serde_json::from_str::<Value>(frame_text) else {
        tracing::debug!("ignoring undecodable frame");
        return FrameOutcome::Continue;
    };
    let Some(diff) = msg.get(4) else {
        return FrameOutcome::Continue;
    };

    match protocol::chunk_at_known_path(diff) {
        Some(chunk) => {
            if !chunk.is_empty() {
                buffer.push_str(&text::render_chunk(chunk));
            }
            FrameOutcome::Continue
        }
        // The known path has drifted or this is a terminal render; take the
        // first paragraph-shaped value and stop streaming.
        None => match protocol::deep_find(diff, protocol::MAX_SEARCH_DEPTH) {
            Some(found) => {
                buffer.push_str(&text::render_chunk(found));
                FrameOutcome::Complete
            }
            None => FrameOutcome::Continue,
        },
    }
}

fn answer_cache_key(query: &str, mode: AskMode, detail_level: Option<DetailLevel>) -> String {
    let level = detail_level.map(|l| l.to_string()).unwrap_or_else(|| "default".to_string());
    format!("iask-{mode}-{level}-{query}")
}

fn answer_or_sentinel(answer: String) -> String {
    if answer.is_empty() { NO_RESULTS_SENTINEL.to_string() } else { answer }
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|e| Error::Protocol(format!("iask: invalid header value: {e}")))
}

fn map_ws_error(backend: &str, err: tungstenite::Error) -> Error {
    match err {
        tungstenite::Error::Io(io) => http::classify_io_error(backend, &io),
        other => Error::Protocol(format!("{backend}: websocket error: {other}")),
    }
}
