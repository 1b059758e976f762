use thiserror::Error;

/// Errors produced by the chatline client and protocol layer.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The server did not recognize the session credential.
    #[error("not authenticated")]
    Unauthenticated,

    #[error("login failed: {0}")]
    LoginFailed(String),

    /// An established channel closed or errored.
    #[error("transport lost: {0}")]
    TransportLost(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Inbound data that does not match either frame variant.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A send was attempted while the channel was not open.
    #[error("channel not open")]
    SendRejected,

    #[error("http error: {0}")]
    Http(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// Whether the caller should send the user back to the login boundary.
    pub fn needs_login(&self) -> bool {
        matches!(self, ChatError::Unauthenticated)
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
