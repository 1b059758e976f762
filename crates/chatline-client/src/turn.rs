//! Turn polling for the board game running alongside the chat.
//!
//! Plain request/response pairs over the same cookie-authenticated client.

use chatline_core::{ChatError, ChatResult};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::http::{endpoint, request_error};

pub const TURN_PATH: &str = "/turn";
pub const NEXT_TURN_PATH: &str = "/next";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentTurn {
    current_turn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NextTurn {
    next_turn: String,
}

#[derive(Clone)]
pub struct TurnClient {
    http: reqwest::Client,
    base: Url,
}

impl TurnClient {
    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// Whose turn it is now.
    pub async fn current_turn(&self) -> ChatResult<String> {
        let body: CurrentTurn = self.get_json(TURN_PATH).await?;
        Ok(body.current_turn)
    }

    /// Advance and return whose turn is next.
    pub async fn next_turn(&self) -> ChatResult<String> {
        let body: NextTurn = self.get_json(NEXT_TURN_PATH).await?;
        Ok(body.next_turn)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChatResult<T> {
        let url = endpoint(&self.base, path)?;
        debug!(url = %url, "polling");

        let res = self.http.get(url).send().await.map_err(request_error)?;
        match res.status() {
            StatusCode::UNAUTHORIZED => Err(ChatError::Unauthenticated),
            status if !status.is_success() => Err(ChatError::Http(format!("{path} returned {status}"))),
            _ => res
                .json()
                .await
                .map_err(|e| ChatError::Codec(format!("bad {path} response: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_base_url;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TurnClient {
        TurnClient::new(reqwest::Client::new(), parse_base_url(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn reads_current_turn() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/turn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "currentTurn": "black" })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).current_turn().await.unwrap(), "black");
    }

    #[tokio::test]
    async fn reads_next_turn() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nextTurn": "white" })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).next_turn().await.unwrap(), "white");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/turn"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).current_turn().await,
            Err(ChatError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn missing_route_is_http_error() {
        let server = MockServer::start().await;

        assert!(matches!(client_for(&server).next_turn().await, Err(ChatError::Http(_))));
    }
}
