//! Unified error type for the Cardhall server.

use cardhall_protocol::ProtocolError;
use cardhall_room::RoomError;
use cardhall_session::SessionError;
use cardhall_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CardhallError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Joining or reaching a room failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}
