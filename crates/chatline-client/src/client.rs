//! The chatline client.
//!
//! `ChatClient` wires the shared cookie jar, HTTP client, session gate, and
//! channel factory together, and runs the startup sequence: verify the
//! session, then (and only then) connect the channel.

use std::sync::Arc;
use std::time::Duration;

use chatline_core::{ChatResult, Connector};
use reqwest::cookie::Jar;
use reqwest::Url;

use crate::auth::AuthClient;
use crate::channel::{ChannelConfig, ChannelManager, DEFAULT_RECONNECT_DELAY};
use crate::gate::{Session, SessionGate};
use crate::http::{build_http_client, cookie_header, load_cookie_header, parse_base_url};
use crate::transport::{chat_endpoint, WebSocketConnector};
use crate::turn::TurnClient;

/// Configuration for a chatline client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (`http://` or `https://`).
    pub server_url: String,
    /// A previously stored `Cookie` header to resume a session with.
    pub session_cookie: Option<String>,
    /// Delay before reconnecting a lost chat channel.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            session_cookie: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// The chatline client.
pub struct ChatClient {
    base: Url,
    jar: Arc<Jar>,
    http: reqwest::Client,
    gate: SessionGate,
    reconnect_delay: Duration,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> ChatResult<Self> {
        let base = parse_base_url(&config.server_url)?;
        let jar = Arc::new(Jar::default());
        if let Some(cookie) = config.session_cookie.as_deref() {
            load_cookie_header(&jar, cookie, &base);
        }
        let http = build_http_client(jar.clone())?;
        let gate = SessionGate::new(http.clone(), base.clone());

        Ok(Self {
            base,
            jar,
            http,
            gate,
            reconnect_delay: config.reconnect_delay,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.http.clone(), self.jar.clone(), self.base.clone())
    }

    pub fn turns(&self) -> TurnClient {
        TurnClient::new(self.http.clone(), self.base.clone())
    }

    /// The session cookie currently held, as a `Cookie` header.
    pub fn cookie_header(&self) -> Option<String> {
        cookie_header(&self.jar, &self.base)
    }

    /// An unconnected channel manager speaking WebSocket to this server.
    pub fn channel(&self) -> ChatResult<ChannelManager> {
        let endpoint = chat_endpoint(&self.base)?;
        let connector = WebSocketConnector::new(endpoint, self.jar.clone(), self.base.clone());
        Ok(self.channel_with(connector))
    }

    /// An unconnected channel manager over a custom connector.
    pub fn channel_with(&self, connector: impl Connector) -> ChannelManager {
        ChannelManager::new(
            connector,
            ChannelConfig {
                reconnect_delay: self.reconnect_delay,
            },
        )
    }

    /// Verify the session, then connect `channel`.
    ///
    /// On `Unauthenticated` the channel is left untouched; the caller should
    /// send the user to [`SessionGate::login_url`].
    pub async fn start(&self, channel: &mut ChannelManager) -> ChatResult<Session> {
        let session = self.gate.resolve_session().await?;
        channel.connect(&session);
        Ok(session)
    }
}
