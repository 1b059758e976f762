//! chatline-core: Shared protocol library for the chatline client.
//!
//! Provides the chat and presence message types, the JSON frame codec,
//! the error taxonomy, and the abstract transport traits.

pub mod codec;
pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used items at crate root.
pub use codec::{decode_inbound, encode_outbound};
pub use error::{ChatError, ChatResult};
pub use messages::{
    ChannelState, ChatMessage, InboundFrame, OutgoingMessage, PresenceEvent, RosterEntry, ANON_SENDER, CHAT_PATH,
    USER_LIST_TYPE,
};
pub use transport::{BoxFuture, Connector, FrameTransport};
