//! CLI subcommand implementations.

pub mod chat;
pub mod login;
pub mod logout;
pub mod turn;
pub mod whoami;

use std::time::Duration;

use anyhow::{Context as _, Result};
use chatline_client::{ChatClient, ChatError, ClientConfig, SessionStore};

/// Everything a subcommand needs: the client with any stored session
/// cookie already loaded, and the store to update it.
pub struct Context {
    pub client: ChatClient,
    pub store: SessionStore,
}

impl Context {
    pub fn open(server_url: &str, reconnect_delay: Duration, store: SessionStore) -> Result<Self> {
        let session_cookie = store
            .load()
            .with_context(|| format!("failed to read session from {}", store.path().display()))?;

        let client = ChatClient::new(ClientConfig {
            server_url: server_url.to_string(),
            session_cookie,
            reconnect_delay,
        })
        .with_context(|| format!("invalid server URL '{server_url}'"))?;

        Ok(Self { client, store })
    }

    /// Error for commands that need a login, pointing at the login page.
    pub fn login_required(&self) -> anyhow::Error {
        anyhow::anyhow!(self.login_hint())
    }

    /// Map a failed session check. A rejected session and an unreachable
    /// `/me` both send the user back to the login boundary.
    pub fn session_error(&self, e: ChatError) -> anyhow::Error {
        match e {
            ChatError::Unauthenticated => self.login_required(),
            ChatError::Http(_) => anyhow::Error::new(e).context(self.login_hint()),
            other => anyhow::Error::new(other).context("failed to verify session"),
        }
    }

    fn login_hint(&self) -> String {
        match self.client.gate().login_url() {
            Ok(url) => format!("not logged in; run `chatline login` or sign in at {url}"),
            Err(_) => "not logged in; run `chatline login`".to_string(),
        }
    }
}
