//! Login boundary: form login, guest login, logout.
//!
//! The server owns authentication entirely. A successful `POST /login` sets
//! the `session` cookie in the shared jar; everything else (the session gate
//! and the chat channel) rides on that cookie.

use std::sync::Arc;

use chatline_core::{ChatError, ChatResult};
use reqwest::cookie::Jar;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::http::{cookie_header, endpoint, request_error};

pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";
pub const LOBBY_PATH: &str = "/lobby";

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Where the server sent us: the redirect target, or the lobby.
    pub landing: Url,
    /// The `Cookie` header now held by the jar, for persistence.
    pub cookie: Option<String>,
}

/// Generate a guest username: `Guest` plus the last four digits of the
/// millisecond clock.
pub fn guest_username(now_millis: i64) -> String {
    let digits = now_millis.unsigned_abs().to_string();
    let tail = &digits[digits.len().saturating_sub(4)..];
    format!("Guest{tail}")
}

/// Client for the login/logout endpoints.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, jar: Arc<Jar>, base: Url) -> Self {
        Self { http, jar, base }
    }

    /// Submit the login form.
    ///
    /// Redirects are followed; a redirected response lands wherever it ended
    /// up, a plain 2xx lands in the lobby. Any other status fails with the
    /// response body as the message.
    pub async fn login(&self, username: &str, password: &str) -> ChatResult<LoginOutcome> {
        let url = endpoint(&self.base, LOGIN_PATH)?;
        debug!(url = %url, username, "submitting login form");

        let res = self
            .http
            .post(url.clone())
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(request_error)?;

        let redirected = res.url() != &url;
        let status = res.status();

        let landing = if redirected {
            res.url().clone()
        } else if status.is_success() {
            endpoint(&self.base, LOBBY_PATH)?
        } else {
            let body = res.text().await.unwrap_or_default();
            let reason = body.trim();
            warn!(status = %status, "login rejected");
            return Err(ChatError::LoginFailed(if reason.is_empty() {
                status.to_string()
            } else {
                reason.to_string()
            }));
        };

        info!(username, landing = %landing, "logged in");
        Ok(LoginOutcome {
            landing,
            cookie: cookie_header(&self.jar, &self.base),
        })
    }

    /// Log in as a guest. An empty `username` is replaced by a generated one.
    pub async fn guest_login(&self, username: Option<&str>) -> ChatResult<(String, LoginOutcome)> {
        let name = match username.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => guest_username(chrono::Utc::now().timestamp_millis()),
        };
        let outcome = self.login(&name, "").await?;
        Ok((name, outcome))
    }

    /// End the server session. Failures are logged; the local cookie is
    /// considered gone either way.
    pub async fn logout(&self) -> ChatResult<()> {
        let url = endpoint(&self.base, LOGOUT_PATH)?;
        match self.http.post(url).send().await {
            Ok(res) if res.status().is_success() => {
                info!("logged out");
                Ok(())
            }
            Ok(res) => {
                warn!(status = %res.status(), "logout not acknowledged");
                Ok(())
            }
            Err(e) => Err(request_error(e)),
        }
    }
}
