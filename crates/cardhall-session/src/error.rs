//! Error types for the session layer.

use cardhall_protocol::PlayerId;

/// Errors from membership changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The room already holds `capacity` members and the joiner is new.
    #[error("room is full ({capacity} players)")]
    Full { capacity: usize },

    /// No member with this id.
    #[error("no member {0}")]
    NotFound(PlayerId),

    /// The member came back (or was detached again) since the grace period
    /// being expired was started.
    #[error("member {0} reconnected during the grace period")]
    Reconnected(PlayerId),
}
