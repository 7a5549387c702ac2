use huddle_core::{EventKind, ParticipantId};

/// Notifications for the embedding application, e.g. to drive a connection indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    Reconnecting {
        attempt: u32,
    },
    /// Automatic reconnection gave up; the user has to restart the session.
    ReconnectFailed {
        reason: String,
    },
    PeerConnected(ParticipantId),
    PeerClosed(ParticipantId),
    NegotiationFailed {
        peer: ParticipantId,
        reason: String,
    },
    RoutingFailed {
        kind: EventKind,
        to: Option<ParticipantId>,
        reason: String,
    },
    /// Chat text relayed to the room, including this session's own messages.
    Message {
        from: ParticipantId,
        message: String,
        sent: u64,
    },
}
