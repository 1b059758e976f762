//! WebSocket transport for the chat channel.
//!
//! One text frame per JSON envelope. The handshake carries the session
//! cookie from the shared jar; no other credential is sent.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use reqwest::cookie::Jar;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chatline_core::{BoxFuture, ChatError, ChatResult, Connector, FrameTransport};

use crate::http::cookie_header;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open WebSocket chat connection.
pub struct WebSocketTransport {
    stream: WsStream,
}

impl WebSocketTransport {
    /// Open a connection to `endpoint`, sending `cookie` as the `Cookie` header.
    pub async fn connect(endpoint: &Url, cookie: Option<&str>) -> ChatResult<Self> {
        let mut request = endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| ChatError::Transport(format!("invalid chat URL {endpoint}: {e}")))?;

        if let Some(cookie) = cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ChatError::Transport(format!("invalid cookie header: {e}")))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| ChatError::Transport(format!("WebSocket connect error: {e}")))?;

        tracing::info!("chat channel connected to {}", endpoint);
        Ok(Self { stream })
    }
}

impl FrameTransport for WebSocketTransport {
    fn send_text<'a>(&'a mut self, text: &'a str) -> BoxFuture<'a, ChatResult<()>> {
        Box::pin(async move {
            self.stream
                .send(Message::Text(text.to_owned()))
                .await
                .map_err(|e| ChatError::TransportLost(format!("WS write error: {e}")))
        })
    }

    fn recv_text(&mut self) -> BoxFuture<'_, ChatResult<Option<String>>> {
        Box::pin(async move {
            while let Some(msg) = self.stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => return Ok(Some(text)),
                    Ok(Message::Close(frame)) => {
                        tracing::debug!("WebSocket close frame received: {:?}", frame);
                        return Ok(None);
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::debug!("ignoring {}-byte binary frame", data.len());
                    }
                    // Pings are answered by tungstenite on the next read/write.
                    Ok(_) => {}
                    Err(e) => return Err(ChatError::TransportLost(format!("WS read error: {e}"))),
                }
            }
            Ok(None)
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let _ = self.stream.close(None).await;
            Ok(())
        })
    }
}

/// Opens WebSocket chat connections, reading the cookie jar fresh on every
/// attempt so a re-login between reconnects is picked up.
pub struct WebSocketConnector {
    endpoint: Url,
    jar: Arc<Jar>,
    cookie_url: Url,
}

impl WebSocketConnector {
    /// `cookie_url` is the HTTP base the session cookie was issued for.
    pub fn new(endpoint: Url, jar: Arc<Jar>, cookie_url: Url) -> Self {
        Self {
            endpoint,
            jar,
            cookie_url,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self) -> BoxFuture<'_, ChatResult<Box<dyn FrameTransport>>> {
        Box::pin(async move {
            let cookie = cookie_header(&self.jar, &self.cookie_url);
            let transport = WebSocketTransport::connect(&self.endpoint, cookie.as_deref()).await?;
            Ok(Box::new(transport) as Box<dyn FrameTransport>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    /// Accept one WebSocket connection, report the Cookie header it carried,
    /// echo text frames back prefixed with "echo:", then close.
    async fn spawn_echo_server() -> (Url, tokio::sync::oneshot::Receiver<Option<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (cookie_tx, cookie_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut seen_cookie = None;
            let mut ws = tokio_tungstenite::accept_hdr_async(tcp, |req: &Request, res: Response| -> Result<Response, ErrorResponse> {
                seen_cookie = req
                    .headers()
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(res)
            })
            .await
            .unwrap();
            let _ = cookie_tx.send(seen_cookie);

            ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    ws.send(Message::Text(format!("echo:{text}"))).await.unwrap();
                    ws.close(None).await.unwrap();
                    break;
                }
            }
        });

        (Url::parse(&format!("ws://{addr}/ws/chat")).unwrap(), cookie_rx)
    }

    #[tokio::test]
    async fn handshake_carries_cookie_and_frames_flow() {
        let (endpoint, cookie_rx) = spawn_echo_server().await;

        let mut transport = WebSocketTransport::connect(&endpoint, Some("session=session-9"))
            .await
            .unwrap();
        assert_eq!(cookie_rx.await.unwrap().as_deref(), Some("session=session-9"));

        transport.send_text(r#"{"message":"hi"}"#).await.unwrap();
        // The binary frame sent first is skipped.
        let reply = transport.recv_text().await.unwrap();
        assert_eq!(reply.as_deref(), Some(r#"echo:{"message":"hi"}"#));

        assert_eq!(transport.recv_text().await.unwrap(), None);
    }

    #[tokio::test]
    async fn connector_reads_cookie_from_jar() {
        let (endpoint, cookie_rx) = spawn_echo_server().await;
        let base = Url::parse("http://127.0.0.1/").unwrap();
        let jar = Arc::new(Jar::default());
        crate::http::load_cookie_header(&jar, "session=from-jar", &base);

        let connector = WebSocketConnector::new(endpoint, jar, base);
        let _transport = connector.connect().await.unwrap();
        assert_eq!(cookie_rx.await.unwrap().as_deref(), Some("session=from-jar"));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Url::parse(&format!("ws://{addr}/ws/chat")).unwrap();
        let err = WebSocketTransport::connect(&endpoint, None).await.err().unwrap();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
