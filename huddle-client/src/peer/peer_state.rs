use std::fmt;

/// Lifecycle of one [`PeerLink`](crate::PeerLink).
///
/// Initiator: `Idle -> Offering -> Connected`. Responder:
/// `Idle -> ReceivedOffer -> Answering -> Connected`. Any state may end in `Failed`
/// or `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    Idle,
    Offering,
    ReceivedOffer,
    Answering,
    Connected,
    Failed,
    Closed,
}

impl PeerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerState::Idle => "idle",
            PeerState::Offering => "offering",
            PeerState::ReceivedOffer => "received_offer",
            PeerState::Answering => "answering",
            PeerState::Connected => "connected",
            PeerState::Failed => "failed",
            PeerState::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PeerState::Failed | PeerState::Closed)
    }

    /// Negotiation is under way or done; a new offer toward the peer would be redundant.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PeerState::Offering
                | PeerState::ReceivedOffer
                | PeerState::Answering
                | PeerState::Connected
        )
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
