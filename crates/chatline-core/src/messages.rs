//! Chat channel message types.
//!
//! Two layers live here: the domain values handed to subscribers
//! ([`ChatMessage`], [`PresenceEvent`], [`OutgoingMessage`]) and the JSON
//! shapes that travel over the channel ([`OutboundFrame`], [`ChatFrame`],
//! [`PresenceFrame`]).

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path of the realtime chat endpoint on the server.
pub const CHAT_PATH: &str = "/ws/chat";

/// Discriminator value carried by presence frames.
pub const USER_LIST_TYPE: &str = "userList";

/// Sender shown when an inbound chat frame names nobody.
pub const ANON_SENDER: &str = "Anon";

/// Lifecycle state of the chat channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
    Closing,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message received from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Display name of the author, already resolved (never empty).
    pub sender: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// A chat message composed locally. The server attaches the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl OutgoingMessage {
    pub fn new(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            timestamp,
        }
    }

    /// Compose a message from raw user input, stamped with the current time.
    ///
    /// Surrounding whitespace is trimmed. Returns `None` when nothing is left.
    pub fn compose(input: &str) -> Option<Self> {
        let body = input.trim();
        if body.is_empty() {
            return None;
        }
        Some(Self::new(body, Utc::now()))
    }
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
}

/// The full set of connected users. Each event replaces the previous roster.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenceEvent {
    pub users: Vec<RosterEntry>,
}

impl PresenceEvent {
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|u| u.username.as_str())
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Chat(ChatMessage),
    Presence(PresenceEvent),
}

// ── Wire shapes ──────────────────────────────────────────────────────

/// Client → server chat frame: `{"message": ..., "time": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub message: String,
    /// RFC 3339 UTC timestamp.
    pub time: String,
}

impl From<&OutgoingMessage> for OutboundFrame {
    fn from(msg: &OutgoingMessage) -> Self {
        Self {
            message: msg.body.clone(),
            time: msg.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

/// Server → client chat frame.
///
/// The server relays `time` exactly as the sending client wrote it, so it is
/// kept raw and parsed leniently; only `message` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatFrame {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    pub message: String,
    #[serde(default)]
    pub time: Option<Value>,
}

impl ChatFrame {
    /// Resolve the display sender: `username`, then `user`, then `"Anon"`.
    /// Empty names count as missing.
    pub fn sender(&self) -> &str {
        [self.username.as_deref(), self.user.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or(ANON_SENDER)
    }

    /// The sent-at time, if `time` is RFC 3339 or an offset-less ISO-8601
    /// timestamp (read as UTC).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.time.as_ref().and_then(Value::as_str).and_then(parse_timestamp)
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl From<ChatFrame> for ChatMessage {
    /// A frame whose `time` cannot be read is stamped with the receive time.
    fn from(frame: ChatFrame) -> Self {
        let timestamp = frame.timestamp().unwrap_or_else(Utc::now);
        Self {
            sender: frame.sender().to_string(),
            body: frame.message,
            timestamp,
        }
    }
}

/// Server → client presence frame: `{"type": "userList", "users": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceFrame {
    pub users: Vec<RosterEntry>,
}

impl From<PresenceFrame> for PresenceEvent {
    fn from(frame: PresenceFrame) -> Self {
        Self { users: frame.users }
    }
}
