//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is JSON but its `type` is missing or not one we know.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The `type` is known but the payload doesn't fit it.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// The text sent back to the client in an `ERROR` message.
    ///
    /// A known type with a bad payload is treated like an illegal move and
    /// gets no reply.
    pub fn client_message(&self) -> Option<&'static str> {
        match self {
            Self::Decode(_) => Some("Invalid JSON."),
            Self::UnknownType(_) => Some("Unknown event."),
            Self::InvalidMessage(_) => None,
            Self::Encode(_) => Some("Internal error."),
        }
    }
}
