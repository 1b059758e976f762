//! Abstract chat transport traits.
//!
//! The channel manager drives any transport that can move whole text frames.
//! The WebSocket implementation lives in `chatline-client`; tests plug in
//! in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use crate::error::ChatResult;

/// A boxed, `Send` future, as returned by the transport traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One established, message-oriented connection.
pub trait FrameTransport: Send {
    /// Write one text frame.
    fn send_text<'a>(&'a mut self, text: &'a str) -> BoxFuture<'a, ChatResult<()>>;

    /// Wait for the next text frame. `Ok(None)` means the peer closed the
    /// connection cleanly. Must be cancel-safe.
    fn recv_text(&mut self) -> BoxFuture<'_, ChatResult<Option<String>>>;

    /// Close the connection.
    fn close(&mut self) -> BoxFuture<'_, ChatResult<()>>;
}

/// Opens fresh transport instances, one per connection attempt.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'_, ChatResult<Box<dyn FrameTransport>>>;
}
