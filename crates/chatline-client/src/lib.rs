//! chatline-client: Rust client library for chatline.
//!
//! Verifies the login session over HTTP, then keeps a WebSocket chat channel
//! open, reconnecting after a fixed delay whenever it drops. Inbound chat
//! and presence frames are fanned out to registered subscribers.
//!
//! # Quick Start
//!
//! ```no_run
//! use chatline_client::{ChatClient, ClientConfig};
//! use chatline_core::OutgoingMessage;
//!
//! # async fn example() -> chatline_core::ChatResult<()> {
//! let client = ChatClient::new(ClientConfig {
//!     server_url: "http://localhost:8080".into(),
//!     session_cookie: Some("session=session-1".into()),
//!     ..Default::default()
//! })?;
//!
//! let mut channel = client.channel()?;
//! channel.on_message(|msg| println!("{}: {}", msg.sender, msg.body));
//! client.start(&mut channel).await?;
//!
//! if let Some(msg) = OutgoingMessage::compose("hello") {
//!     channel.send(&msg).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod channel;
pub mod client;
pub mod gate;
pub mod http;
pub mod session_store;
pub mod transport;
pub mod turn;

// Re-export primary public types.
pub use auth::{guest_username, AuthClient, LoginOutcome};
pub use channel::{ChannelConfig, ChannelManager, DEFAULT_RECONNECT_DELAY};
pub use client::{ChatClient, ClientConfig};
pub use gate::{Session, SessionGate};
pub use session_store::SessionStore;
pub use transport::{chat_endpoint, WebSocketConnector, WebSocketTransport};
pub use turn::TurnClient;

// Re-export chatline-core error types for convenience.
pub use chatline_core::{ChatError, ChatResult};
