use crate::error::RoutingFailure;
use crate::room::{ConnectionHandle, ConnectionId, RoomManager};
use huddle_core::{Envelope, EventKind, ParticipantId, RoomId, decode};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room: RoomId,
    pub participant_id: ParticipantId,
}

/// Server-side state of one signaling connection. Frames are handled one at a time:
/// each call runs to completion, including any room round trip, before the next.
pub struct ClientConnection {
    id: ConnectionId,
    owner: String,
    rooms: RoomManager,
    outbound: mpsc::UnboundedSender<Envelope>,
    membership: Option<Membership>,
}

impl ClientConnection {
    /// `owner` is the login the connection authenticated as.
    pub fn new(
        rooms: RoomManager,
        owner: impl Into<String>,
        outbound: mpsc::UnboundedSender<Envelope>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            rooms,
            outbound,
            membership: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    pub async fn handle_frame(&mut self, frame: &[u8]) {
        match decode(frame) {
            Ok(envelope) => self.handle_envelope(envelope).await,
            Err(e) if e.is_forward_compatible() => {
                warn!("Ignoring frame on {}: {}", self.id, e);
            }
            Err(e) => warn!("Discarding malformed frame on {}: {}", self.id, e),
        }
    }

    pub async fn handle_envelope(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::JoinRoom {
                room,
                participant_id,
            } => self.join(room, participant_id).await,

            Envelope::LeaveRoom { room } => {
                if self.membership.as_ref().is_some_and(|m| m.room == room) {
                    self.leave().await;
                } else {
                    debug!("Ignoring leave_room for {} on {}", room, self.id);
                }
            }

            Envelope::Offer { .. } | Envelope::Answer { .. } | Envelope::IceCandidate { .. } => {
                self.route(envelope).await
            }

            Envelope::Ready { .. } => {
                let Some(membership) = self.membership.clone() else {
                    warn!("Dropping ready from {} before join", self.id);
                    return;
                };
                let mut envelope = envelope;
                envelope.stamp_sender(&membership.participant_id);
                self.rooms
                    .broadcast(&membership.room, &membership.participant_id, self.id, envelope, false)
                    .await;
            }

            Envelope::SendMessage { message } => self.relay_message(message).await,

            Envelope::RoomInfo { .. }
            | Envelope::NewPeer { .. }
            | Envelope::PeerLeft { .. }
            | Envelope::NewMessage { .. }
            | Envelope::RoutingFailure { .. } => {
                warn!(
                    "Dropping server-only envelope `{}` sent by {}",
                    envelope.kind(),
                    self.id
                );
            }
        }
    }

    async fn join(&mut self, room: RoomId, participant_id: ParticipantId) {
        if room.is_empty() || participant_id.is_empty() {
            warn!("Rejecting join with empty room or participant id on {}", self.id);
            return;
        }

        if let Some(current) = &self.membership {
            if current.room != room || current.participant_id != participant_id {
                info!(
                    "{} switching from room {} to {}",
                    current.participant_id, current.room, room
                );
                self.leave().await;
            }
        }

        let handle = ConnectionHandle::new(
            self.id,
            participant_id.clone(),
            self.owner.clone(),
            self.outbound.clone(),
        );
        match self.rooms.join(&room, handle).await {
            Ok(members) => {
                debug!("{} sees {} other members in {}", participant_id, members.len(), room);
                self.membership = Some(Membership {
                    room,
                    participant_id,
                });
            }
            Err(failure) => {
                warn!("Join of {} to {} failed: {}", participant_id, room, failure);
                self.membership = None;
                let _ = self.outbound.send(Envelope::RoutingFailure {
                    kind: EventKind::JoinRoom,
                    to: Some(participant_id),
                    reason: failure.to_string(),
                });
            }
        }
    }

    /// Relays chat text to the whole room, the sender included, stamped with the
    /// sender's id and the relay time.
    async fn relay_message(&mut self, message: String) {
        let Some(membership) = self.membership.clone() else {
            warn!("Dropping send_message from {} before join", self.id);
            let _ = self.outbound.send(Envelope::RoutingFailure {
                kind: EventKind::SendMessage,
                to: None,
                reason: RoutingFailure::NotJoined.to_string(),
            });
            return;
        };
        if message.is_empty() {
            debug!("Ignoring empty message from {}", membership.participant_id);
            return;
        }

        let sent = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        let envelope = Envelope::NewMessage {
            from: membership.participant_id.clone(),
            message,
            sent,
        };
        self.rooms
            .broadcast(&membership.room, &membership.participant_id, self.id, envelope, true)
            .await;
    }

    async fn route(&mut self, mut envelope: Envelope) {
        let kind = envelope.kind();
        let to = envelope.recipient().cloned();

        let result = match &self.membership {
            None => Err(RoutingFailure::NotJoined),
            Some(membership) => {
                envelope.stamp_sender(&membership.participant_id);
                self.rooms
                    .route(&membership.room, &membership.participant_id, self.id, envelope)
                    .await
            }
        };

        if let Err(failure) = result {
            warn!("Routing {} from {} failed: {}", kind, self.id, failure);
            let _ = self.outbound.send(Envelope::RoutingFailure {
                kind,
                to,
                reason: failure.to_string(),
            });
        }
    }

    /// Leaves the current room, if any.
    pub async fn leave(&mut self) {
        let Some(membership) = self.membership.take() else {
            return;
        };
        self.rooms
            .leave(&membership.room, &membership.participant_id, self.id)
            .await;
    }
}
