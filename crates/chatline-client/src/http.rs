//! HTTP plumbing shared by the session gate, auth, and turn endpoints.
//!
//! All requests go through one `reqwest::Client` wired to one cookie jar, so
//! the session cookie set by `/login` is sent on every later request and on
//! the chat channel handshake.

use std::sync::Arc;

use chatline_core::{ChatError, ChatResult};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

/// Parse and validate the server base URL (`http://` or `https://`).
pub fn parse_base_url(raw: &str) -> ChatResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| ChatError::Config(format!("invalid server URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ChatError::Config(format!(
            "unsupported URL scheme: {other} (expected http:// or https://)"
        ))),
    }
}

/// Resolve an absolute server path against the base URL.
pub fn endpoint(base: &Url, path: &str) -> ChatResult<Url> {
    base.join(path)
        .map_err(|e| ChatError::Config(format!("cannot build URL for {path}: {e}")))
}

/// Build the shared HTTP client around a cookie jar.
pub fn build_http_client(jar: Arc<Jar>) -> ChatResult<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_provider(jar)
        .build()
        .map_err(|e| ChatError::Http(format!("failed to build HTTP client: {e}")))
}

/// Seed a jar with a stored `Cookie` header (`a=1; b=2`).
pub fn load_cookie_header(jar: &Jar, header: &str, base: &Url) {
    for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        jar.add_cookie_str(pair, base);
    }
}

/// The `Cookie` header the jar would send to `base`, if any.
pub fn cookie_header(jar: &Jar, base: &Url) -> Option<String> {
    jar.cookies(base)
        .and_then(|value| value.to_str().ok().map(str::to_string))
        .filter(|value| !value.is_empty())
}

/// Map a transport-level reqwest failure.
pub(crate) fn request_error(e: reqwest::Error) -> ChatError {
    ChatError::Http(e.to_string())
}
