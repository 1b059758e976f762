//! Chat channel transport selection.
//!
//! The channel endpoint is derived from the server base URL:
//! - `http://`  → `ws://<host>/ws/chat`
//! - `https://` → `wss://<host>/ws/chat`

pub mod websocket;

pub use websocket::{WebSocketConnector, WebSocketTransport};

use chatline_core::{ChatError, ChatResult, CHAT_PATH};
use reqwest::Url;

/// Derive the chat channel URL from the HTTP base URL.
pub fn chat_endpoint(base: &Url) -> ChatResult<Url> {
    let scheme = match base.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(ChatError::Transport(format!(
                "unsupported URL scheme: {other} (expected http:// or https://)"
            )))
        }
    };

    let mut url = base
        .join(CHAT_PATH)
        .map_err(|e| ChatError::Transport(format!("cannot build chat URL: {e}")))?;
    url.set_scheme(scheme)
        .map_err(|_| ChatError::Transport(format!("cannot switch {base} to {scheme}://")))?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
