use crate::error::NegotiationFailure;
use crate::peer::MediaSource;
use async_trait::async_trait;
use huddle_core::{Candidate, ParticipantId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Events a peer transport raises on its own, outside of any call into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A local network candidate was gathered and must be signaled to the peer.
    CandidateGenerated(ParticipantId, Candidate),

    /// The direct connection to the peer went away.
    Disconnected(ParticipantId),
}

/// The peer-to-peer transport for one remote participant. Session descriptions and
/// candidates are opaque to the signaling layer.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_local_media(&self, media: &dyn MediaSource) -> Result<(), NegotiationFailure>;

    /// Generates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<String, NegotiationFailure>;

    /// Generates an answer and installs it as the local description.
    async fn create_answer(&self) -> Result<String, NegotiationFailure>;

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationFailure>;

    async fn add_remote_candidate(&self, candidate: Candidate) -> Result<(), NegotiationFailure>;

    async fn close(&self);
}

#[async_trait]
pub trait PeerTransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, NegotiationFailure>;
}
