//! Error types for the room layer.

use cardhall_protocol::RoomCode;

/// Errors from room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// A join arrived without a usable room code.
    #[error("room code required")]
    CodeRequired,

    /// The room is at capacity and the joiner is not a returning member.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The `ERROR` text a client is shown, if this error is reported at all.
    pub fn client_message(&self) -> Option<&'static str> {
        match self {
            Self::CodeRequired => Some("Room code required."),
            Self::RoomFull(_) => Some("Room is full."),
            Self::Unavailable(_) => None,
        }
    }
}
