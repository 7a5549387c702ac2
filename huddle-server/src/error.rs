use huddle_core::{EventKind, ParticipantId, RoomId};
use thiserror::Error;

/// Why an envelope could not be delivered. Reported back to the sender; never fatal
/// for the sender's connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingFailure {
    #[error("sender has not joined a room")]
    NotJoined,

    #[error("recipient {0} is not in the room")]
    RecipientNotFound(ParticipantId),

    #[error("`{0}` envelopes are not routed point-to-point")]
    NotRoutable(EventKind),

    #[error("envelope is addressed to its own sender")]
    SelfAddressed,

    #[error("room {0} is unavailable")]
    RoomUnavailable(RoomId),

    #[error("participant id {0} is held by another login")]
    ParticipantTaken(ParticipantId),

    #[error("superseded by a newer connection")]
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing or expired one-time password")]
    InvalidToken,
}
