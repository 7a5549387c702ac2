use huddle_core::{Envelope, ParticipantId};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Live outbound side of one client connection, as seen by a room.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: ConnectionId,
    pub participant_id: ParticipantId,
    /// Login the connection authenticated as.
    pub owner: String,
    sender: mpsc::UnboundedSender<Envelope>,
}

impl ConnectionHandle {
    pub fn new(
        connection_id: ConnectionId,
        participant_id: ParticipantId,
        owner: impl Into<String>,
        sender: mpsc::UnboundedSender<Envelope>,
    ) -> Self {
        Self {
            connection_id,
            participant_id,
            owner: owner.into(),
            sender,
        }
    }

    /// Queues an envelope for the connection's writer. Returns false once the
    /// connection is gone.
    pub fn deliver(&self, envelope: Envelope) -> bool {
        self.sender.send(envelope).is_ok()
    }
}
