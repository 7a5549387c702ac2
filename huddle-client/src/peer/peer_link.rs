use crate::error::NegotiationFailure;
use crate::peer::{MediaSource, PeerState, PeerTransport, SdpKind};
use huddle_core::{Candidate, Envelope, ParticipantId};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One client's negotiation state toward one remote participant.
///
/// Remote candidates that arrive before the remote description are buffered and
/// applied, in arrival order, as soon as the description is set.
pub struct PeerLink {
    local: ParticipantId,
    remote: ParticipantId,
    state: PeerState,
    local_description: Option<String>,
    remote_description: Option<String>,
    pending_candidates: Vec<Candidate>,
    transport: Box<dyn PeerTransport>,
    offered_at: Option<Instant>,
}

impl PeerLink {
    pub fn new(local: ParticipantId, remote: ParticipantId, transport: Box<dyn PeerTransport>) -> Self {
        Self {
            local,
            remote,
            state: PeerState::Idle,
            local_description: None,
            remote_description: None,
            pending_candidates: Vec::new(),
            transport,
            offered_at: None,
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn local_description(&self) -> Option<&str> {
        self.local_description.as_deref()
    }

    pub fn remote_description(&self) -> Option<&str> {
        self.remote_description.as_deref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// `Idle -> Offering`. Without local media the link stays `Idle`.
    pub async fn create_offer(
        &mut self,
        media: Option<&dyn MediaSource>,
    ) -> Result<Envelope, NegotiationFailure> {
        self.expect_state(PeerState::Idle, "create an offer")?;
        let media = media.ok_or(NegotiationFailure::NoLocalMedia)?;

        let generated = self.generate(media, SdpKind::Offer).await;
        let sdp = match generated {
            Ok(sdp) => sdp,
            Err(e) => return Err(self.fail(e)),
        };

        self.local_description = Some(sdp.clone());
        self.offered_at = Some(Instant::now());
        self.transition(PeerState::Offering);

        Ok(Envelope::Offer {
            from: self.local.clone(),
            to: self.remote.clone(),
            sdp,
        })
    }

    /// `Idle -> ReceivedOffer`.
    pub async fn receive_offer(&mut self, sdp: String) -> Result<(), NegotiationFailure> {
        self.expect_state(PeerState::Idle, "accept an offer")?;
        self.apply_remote_description(SdpKind::Offer, sdp).await?;
        self.transition(PeerState::ReceivedOffer);
        Ok(())
    }

    /// `ReceivedOffer -> Answering -> Connected`. Without local media the link keeps
    /// waiting in `ReceivedOffer`.
    pub async fn create_answer(
        &mut self,
        media: Option<&dyn MediaSource>,
    ) -> Result<Envelope, NegotiationFailure> {
        self.expect_state(PeerState::ReceivedOffer, "create an answer")?;
        let media = media.ok_or(NegotiationFailure::NoLocalMedia)?;
        self.transition(PeerState::Answering);

        let generated = self.generate(media, SdpKind::Answer).await;
        let sdp = match generated {
            Ok(sdp) => sdp,
            Err(e) => return Err(self.fail(e)),
        };

        self.local_description = Some(sdp.clone());
        self.transition(PeerState::Connected);

        Ok(Envelope::Answer {
            from: self.local.clone(),
            to: self.remote.clone(),
            sdp,
        })
    }

    /// `Offering -> Connected`.
    pub async fn receive_answer(&mut self, sdp: String) -> Result<(), NegotiationFailure> {
        self.expect_state(PeerState::Offering, "accept an answer")?;
        self.apply_remote_description(SdpKind::Answer, sdp).await?;
        self.offered_at = None;
        self.transition(PeerState::Connected);
        Ok(())
    }

    /// Buffers or applies a remote candidate. Never fails the link.
    pub async fn receive_candidate(&mut self, candidate: Candidate) {
        if self.state.is_terminal() {
            debug!("Dropping candidate for {} link to {}", self.state, self.remote);
            return;
        }
        if !candidate.is_well_formed() {
            warn!("Dropping malformed candidate from {}: {:?}", self.remote, candidate);
            return;
        }

        if self.remote_description.is_none() {
            debug!("Buffering candidate from {} until the remote description is set", self.remote);
            self.pending_candidates.push(candidate);
            return;
        }
        self.apply_candidate(candidate).await;
    }

    /// Moves the link to `Closed` and releases the transport and buffered candidates.
    pub async fn teardown(&mut self) {
        if self.state == PeerState::Closed {
            return;
        }
        self.transition(PeerState::Closed);
        self.pending_candidates.clear();
        self.offered_at = None;
        self.transport.close().await;
    }

    /// Whether an outstanding offer has waited longer than `timeout` for its answer.
    pub fn expired(&self, now: Instant, timeout: Duration) -> bool {
        self.state == PeerState::Offering
            && self
                .offered_at
                .is_some_and(|offered_at| now.duration_since(offered_at) >= timeout)
    }

    /// Marks an unanswered offer as failed.
    pub fn expire(&mut self) -> NegotiationFailure {
        self.fail(NegotiationFailure::Timeout(self.remote.clone()))
    }

    async fn generate(
        &self,
        media: &dyn MediaSource,
        kind: SdpKind,
    ) -> Result<String, NegotiationFailure> {
        self.transport.add_local_media(media).await?;
        match kind {
            SdpKind::Offer => self.transport.create_offer().await,
            SdpKind::Answer => self.transport.create_answer().await,
        }
    }

    async fn apply_remote_description(
        &mut self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationFailure> {
        if let Err(e) = self.transport.set_remote_description(kind, sdp.clone()).await {
            return Err(self.fail(e));
        }
        self.remote_description = Some(sdp);

        let buffered = std::mem::take(&mut self.pending_candidates);
        if !buffered.is_empty() {
            debug!("Applying {} buffered candidates from {}", buffered.len(), self.remote);
        }
        for candidate in buffered {
            self.apply_candidate(candidate).await;
        }
        Ok(())
    }

    async fn apply_candidate(&self, candidate: Candidate) {
        if let Err(e) = self.transport.add_remote_candidate(candidate).await {
            warn!("Dropping candidate from {}: {}", self.remote, e);
        }
    }

    fn expect_state(&self, expected: PeerState, action: &'static str) -> Result<(), NegotiationFailure> {
        if self.state == expected {
            Ok(())
        } else {
            Err(NegotiationFailure::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    fn fail(&mut self, error: NegotiationFailure) -> NegotiationFailure {
        warn!("Negotiation with {} failed: {}", self.remote, error);
        self.offered_at = None;
        self.transition(PeerState::Failed);
        error
    }

    fn transition(&mut self, next: PeerState) {
        if next == PeerState::Connected {
            info!("Link {} -> {} connected", self.local, self.remote);
        } else {
            debug!("Link {} -> {}: {} => {}", self.local, self.remote, self.state, next);
        }
        self.state = next;
    }
}
