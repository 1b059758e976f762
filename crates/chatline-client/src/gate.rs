//! Session verification ahead of the realtime channel.
//!
//! The chat channel authenticates with nothing but the ambient session
//! cookie, so it must never be opened before `/me` confirms that cookie is
//! valid. [`SessionGate::resolve_session`] performs that single check and
//! is the only way to obtain a [`Session`], which in turn is required by
//! [`ChannelManager::connect`](crate::channel::ChannelManager::connect).

use chatline_core::{ChatError, ChatResult};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http::{endpoint, request_error};

/// Identity endpoint.
pub const ME_PATH: &str = "/me";

/// Where an unauthenticated user is sent.
pub const LOGIN_PAGE_PATH: &str = "/login.html";

/// Identity resolved from the server session. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub(crate) fn new(username: Option<String>) -> Self {
        Self {
            username: username.filter(|name| !name.is_empty()),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl MeResponse {
    fn into_session(self) -> Session {
        let username = [self.username, self.name]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty());
        Session::new(username)
    }
}

/// Verifies the ambient session before anything realtime happens.
#[derive(Clone)]
pub struct SessionGate {
    http: reqwest::Client,
    base: Url,
}

impl SessionGate {
    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// The login boundary users are sent to when the session is rejected.
    pub fn login_url(&self) -> ChatResult<Url> {
        endpoint(&self.base, LOGIN_PAGE_PATH)
    }

    /// Issue one `GET /me`. Never retries.
    ///
    /// Any non-2xx status, or a 2xx body that is not the identity object,
    /// yields [`ChatError::Unauthenticated`].
    pub async fn resolve_session(&self) -> ChatResult<Session> {
        let url = endpoint(&self.base, ME_PATH)?;
        debug!(url = %url, "verifying session");

        let res = self.http.get(url).send().await.map_err(request_error)?;
        let status = res.status();
        if !status.is_success() {
            info!(status = %status, "session rejected by server");
            return Err(ChatError::Unauthenticated);
        }

        let me: MeResponse = res.json().await.map_err(|e| {
            warn!(error = %e, "unreadable identity response");
            ChatError::Unauthenticated
        })?;

        let session = me.into_session();
        info!(username = session.username().unwrap_or("<unnamed>"), "session verified");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_base_url;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gate_for(server: &MockServer) -> SessionGate {
        SessionGate::new(reqwest::Client::new(), parse_base_url(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn resolves_username() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "alice" })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gate_for(&server).resolve_session().await.unwrap();
        assert_eq!(session.username(), Some("alice"));
    }

    #[tokio::test]
    async fn falls_back_to_name_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "", "name": "bob" })))
            .mount(&server)
            .await;

        let session = gate_for(&server).resolve_session().await.unwrap();
        assert_eq!(session.username(), Some("bob"));
    }

    #[tokio::test]
    async fn identity_without_name_is_still_a_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let session = gate_for(&server).resolve_session().await.unwrap();
        assert_eq!(session.username(), None);
    }

    #[tokio::test]
    async fn unauthorized_is_unauthenticated_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid session" })))
            .expect(1)
            .mount(&server)
            .await;

        let err = gate_for(&server).resolve_session().await.unwrap_err();
        assert!(err.needs_login(), "{err:?}");
    }

    #[tokio::test]
    async fn server_error_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(matches!(
            gate_for(&server).resolve_session().await,
            Err(ChatError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn garbage_body_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            gate_for(&server).resolve_session().await,
            Err(ChatError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn sends_ambient_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("cookie", "session=session-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "alice" })))
            .expect(1)
            .mount(&server)
            .await;

        let base = parse_base_url(&server.uri()).unwrap();
        let jar = std::sync::Arc::new(reqwest::cookie::Jar::default());
        crate::http::load_cookie_header(&jar, "session=session-7", &base);
        let http = crate::http::build_http_client(jar).unwrap();

        let session = SessionGate::new(http, base).resolve_session().await.unwrap();
        assert_eq!(session.username(), Some("alice"));
    }

    #[test]
    fn login_url_points_at_login_page() {
        let gate = SessionGate::new(reqwest::Client::new(), parse_base_url("http://localhost:8080").unwrap());
        assert_eq!(gate.login_url().unwrap().as_str(), "http://localhost:8080/login.html");
    }
}
