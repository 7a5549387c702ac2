use crate::model::{Candidate, ParticipantId, RoomId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Typed signaling message. On the wire it is `{"type": <kind>, "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Envelope {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room: RoomId,
        participant_id: ParticipantId,
    },
    RoomInfo {
        room: RoomId,
        members: Vec<ParticipantId>,
    },
    #[serde(rename_all = "camelCase")]
    NewPeer { participant_id: ParticipantId },
    #[serde(rename_all = "camelCase")]
    PeerLeft { participant_id: ParticipantId },
    Offer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: String,
    },
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        from: ParticipantId,
        to: ParticipantId,
        candidate: Candidate,
    },
    #[serde(rename_all = "camelCase")]
    Ready { participant_id: ParticipantId },
    LeaveRoom { room: RoomId },
    /// Chat text for everyone in the sender's room.
    SendMessage { message: String },
    /// Chat text relayed by the registry. `sent` is unix milliseconds.
    NewMessage {
        from: ParticipantId,
        message: String,
        sent: u64,
    },
    RoutingFailure {
        kind: EventKind,
        #[serde(default)]
        to: Option<ParticipantId>,
        reason: String,
    },
}

impl Envelope {
    pub fn kind(&self) -> EventKind {
        match self {
            Envelope::JoinRoom { .. } => EventKind::JoinRoom,
            Envelope::RoomInfo { .. } => EventKind::RoomInfo,
            Envelope::NewPeer { .. } => EventKind::NewPeer,
            Envelope::PeerLeft { .. } => EventKind::PeerLeft,
            Envelope::Offer { .. } => EventKind::Offer,
            Envelope::Answer { .. } => EventKind::Answer,
            Envelope::IceCandidate { .. } => EventKind::IceCandidate,
            Envelope::Ready { .. } => EventKind::Ready,
            Envelope::LeaveRoom { .. } => EventKind::LeaveRoom,
            Envelope::SendMessage { .. } => EventKind::SendMessage,
            Envelope::NewMessage { .. } => EventKind::NewMessage,
            Envelope::RoutingFailure { .. } => EventKind::RoutingFailure,
        }
    }

    /// Addressee of a point-to-point envelope.
    pub fn recipient(&self) -> Option<&ParticipantId> {
        match self {
            Envelope::Offer { to, .. }
            | Envelope::Answer { to, .. }
            | Envelope::IceCandidate { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Participant that produced a relayed envelope. `new_message` is authored by the
    /// registry and reaches its sender too, so it has none.
    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            Envelope::Offer { from, .. }
            | Envelope::Answer { from, .. }
            | Envelope::IceCandidate { from, .. } => Some(from),
            Envelope::Ready { participant_id } => Some(participant_id),
            _ => None,
        }
    }

    /// Rewrites the sender of a point-to-point or `ready` envelope.
    pub fn stamp_sender(&mut self, sender: &ParticipantId) {
        match self {
            Envelope::Offer { from, .. }
            | Envelope::Answer { from, .. }
            | Envelope::IceCandidate { from, .. } => *from = sender.clone(),
            Envelope::Ready { participant_id } => *participant_id = sender.clone(),
            _ => {}
        }
    }
}

/// Closed set of envelope kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    JoinRoom,
    RoomInfo,
    NewPeer,
    PeerLeft,
    Offer,
    Answer,
    IceCandidate,
    Ready,
    LeaveRoom,
    SendMessage,
    NewMessage,
    RoutingFailure,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::JoinRoom,
        EventKind::RoomInfo,
        EventKind::NewPeer,
        EventKind::PeerLeft,
        EventKind::Offer,
        EventKind::Answer,
        EventKind::IceCandidate,
        EventKind::Ready,
        EventKind::LeaveRoom,
        EventKind::SendMessage,
        EventKind::NewMessage,
        EventKind::RoutingFailure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JoinRoom => "join_room",
            EventKind::RoomInfo => "room_info",
            EventKind::NewPeer => "new_peer",
            EventKind::PeerLeft => "peer_left",
            EventKind::Offer => "offer",
            EventKind::Answer => "answer",
            EventKind::IceCandidate => "ice_candidate",
            EventKind::Ready => "ready",
            EventKind::LeaveRoom => "leave_room",
            EventKind::SendMessage => "send_message",
            EventKind::NewMessage => "new_message",
            EventKind::RoutingFailure => "routing_failure",
        }
    }

    pub fn is_point_to_point(&self) -> bool {
        matches!(
            self,
            EventKind::Offer | EventKind::Answer | EventKind::IceCandidate
        )
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_owned())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
