use crate::error::RoutingFailure;
use crate::room::{ConnectionHandle, ConnectionId};
use huddle_core::{Envelope, ParticipantId};
use tokio::sync::oneshot;

/// Commands processed one at a time by a room's actor task.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a member, or replace one held by the same login. Replies with the other
    /// members.
    Join {
        handle: ConnectionHandle,
        reply: oneshot::Sender<Result<Vec<ParticipantId>, RoutingFailure>>,
    },

    /// Remove a member, but only if it is still bound to `connection_id`.
    Leave {
        participant_id: ParticipantId,
        connection_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    /// Forward a point-to-point envelope to its recipient.
    Route {
        sender: ParticipantId,
        connection_id: ConnectionId,
        envelope: Envelope,
        reply: oneshot::Sender<Result<(), RoutingFailure>>,
    },

    /// Fan an envelope out to every member, the sender only if `echo` is set.
    Broadcast {
        sender: ParticipantId,
        connection_id: ConnectionId,
        envelope: Envelope,
        echo: bool,
    },

    Members {
        reply: oneshot::Sender<Vec<ParticipantId>>,
    },
}
