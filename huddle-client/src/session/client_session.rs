use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState, RetryOutcome};
use crate::error::{ClientError, NegotiationFailure};
use crate::peer::{MediaSource, PeerLink, PeerState, PeerTransportFactory, TransportEvent};
use crate::session::{ClientEvent, SessionCommand, SessionHandle};
use crate::transport::Connector;
use huddle_core::election::{initiator_for, offer_targets, room_leader, should_initiate};
use huddle_core::{Candidate, Envelope, EventKind, ParticipantId, RoomId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

const TRANSPORT_EVENT_CAPACITY: usize = 64;
const COMMAND_CAPACITY: usize = 16;
const OFFER_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Everything one participant owns: the signaling connection, its queue, the room
/// view and one [`PeerLink`] per remote participant.
///
/// Every input (inbound envelope, transport event, command, timer) is handled to
/// completion before the next one is looked at.
pub struct ClientSession {
    local: ParticipantId,
    room: RoomId,
    offer_timeout: Option<Duration>,
    connection: ConnectionManager,
    factory: Arc<dyn PeerTransportFactory>,
    media: Option<Arc<dyn MediaSource>>,
    peers: HashMap<ParticipantId, PeerLink>,
    members: BTreeSet<ParticipantId>,
    in_room: bool,
    retry_at: Option<Instant>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    command_tx: mpsc::Sender<SessionCommand>,
    command_rx: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl ClientSession {
    pub fn new(
        config: &ClientConfig,
        connector: Arc<dyn Connector>,
        factory: Arc<dyn PeerTransportFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, events_rx) = mpsc::unbounded_channel();

        let session = Self {
            local: config.participant_id.clone(),
            room: config.room.clone(),
            offer_timeout: config.offer_timeout,
            connection: ConnectionManager::new(connector, config.reconnect, config.queue_capacity),
            factory,
            media: None,
            peers: HashMap::new(),
            members: BTreeSet::new(),
            in_room: false,
            retry_at: None,
            transport_tx,
            transport_rx,
            command_tx,
            command_rx,
            events,
        };
        (session, events_rx)
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            commands: self.command_tx.clone(),
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn peer_state(&self, remote: &ParticipantId) -> Option<PeerState> {
        self.peers.get(remote).map(PeerLink::state)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Other participants this session believes are in the room, sorted.
    pub fn members(&self) -> Vec<ParticipantId> {
        self.members.iter().cloned().collect()
    }

    /// Opens the signaling channel and announces the room.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        self.connection.connect().await?;
        self.in_room = true;
        self.send_join();
        self.emit(ClientEvent::Connected);
        Ok(())
    }

    /// Drives the session until it is shut down or reconnection gives up.
    pub async fn run(mut self) {
        let mut offer_check = tokio::time::interval(OFFER_CHECK_INTERVAL);

        loop {
            self.schedule_retry();
            let retry_at = self.retry_at;

            tokio::select! {
                inbound = self.connection.recv() => match inbound {
                    Some(envelope) => self.handle_envelope(envelope).await,
                    None => self.on_transport_lost(),
                },
                Some(event) = self.transport_rx.recv() => self.handle_transport_event(event).await,
                command = self.command_rx.recv() => match command {
                    Some(SessionCommand::AttachMedia(media)) => self.attach_media(media).await,
                    Some(SessionCommand::SendMessage(message)) => {
                        self.send_message(message);
                    }
                    Some(SessionCommand::Leave) => self.leave().await,
                    Some(SessionCommand::Shutdown) | None => break,
                },
                _ = wait_until(retry_at) => self.retry().await,
                _ = offer_check.tick(), if self.offer_timeout.is_some() => {
                    self.expire_offers(Instant::now()).await
                }
            }

            if self.connection.state() == ConnectionState::Failed {
                break;
            }
        }

        self.close().await;
    }

    pub async fn handle_envelope(&mut self, envelope: Envelope) {
        if envelope.sender() == Some(&self.local) {
            debug!("Ignoring `{}` echoed back to its sender", envelope.kind());
            return;
        }
        match envelope {
            Envelope::RoomInfo { room, members } => self.on_room_info(room, members).await,
            Envelope::NewPeer { participant_id } => self.on_new_peer(participant_id).await,
            Envelope::PeerLeft { participant_id } => {
                self.members.remove(&participant_id);
                self.close_link(&participant_id).await;
            }
            Envelope::Ready { participant_id } => self.on_ready(participant_id).await,
            Envelope::Offer { from, sdp, .. } => self.on_offer(from, sdp).await,
            Envelope::Answer { from, sdp, .. } => self.on_answer(from, sdp).await,
            Envelope::IceCandidate {
                from, candidate, ..
            } => self.on_candidate(from, candidate).await,
            Envelope::RoutingFailure { kind, to, reason } => {
                self.on_routing_failure(kind, to, reason).await
            }
            Envelope::NewMessage {
                from,
                message,
                sent,
            } => self.emit(ClientEvent::Message {
                from,
                message,
                sent,
            }),
            Envelope::JoinRoom { .. } | Envelope::LeaveRoom { .. } | Envelope::SendMessage { .. } => {
                warn!("Ignoring client-only envelope `{}` from server", envelope.kind());
            }
        }
    }

    /// Makes local media available. Offers deferred for lack of media are sent now
    /// and pending offers are answered.
    pub async fn attach_media(&mut self, media: Arc<dyn MediaSource>) {
        info!("Local media attached ({} tracks)", media.tracks().len());
        self.media = Some(media);
        if !self.in_room {
            return;
        }

        self.connection.send(Envelope::Ready {
            participant_id: self.local.clone(),
        });

        let waiting: Vec<ParticipantId> = self
            .peers
            .iter()
            .filter(|(_, link)| link.state() == PeerState::ReceivedOffer)
            .map(|(remote, _)| remote.clone())
            .collect();
        for remote in waiting {
            self.answer(&remote).await;
        }

        for remote in offer_targets(&self.local, &self.members) {
            self.discover(&remote).await;
        }
    }

    /// Sends chat text to everyone in the room. Returns `false` outside a room.
    pub fn send_message(&mut self, message: impl Into<String>) -> bool {
        if !self.in_room {
            debug!("Not in a room; message dropped");
            return false;
        }
        self.connection.send(Envelope::SendMessage {
            message: message.into(),
        });
        true
    }

    pub async fn leave(&mut self) {
        if !self.in_room {
            return;
        }
        self.connection.send(Envelope::LeaveRoom {
            room: self.room.clone(),
        });
        self.drop_room().await;
        info!("{} left room {}", self.local, self.room);
    }

    /// Forgets the room: every link is closed and the member view emptied.
    async fn drop_room(&mut self) {
        self.in_room = false;
        let remotes: Vec<ParticipantId> = self.peers.keys().cloned().collect();
        for remote in remotes {
            self.close_link(&remote).await;
        }
        self.members.clear();
    }

    /// Fails every offer that has waited longer than the configured timeout.
    pub async fn expire_offers(&mut self, now: Instant) {
        let Some(timeout) = self.offer_timeout else {
            return;
        };

        let expired: Vec<ParticipantId> = self
            .peers
            .values()
            .filter(|link| link.expired(now, timeout))
            .map(|link| link.remote().clone())
            .collect();
        for remote in expired {
            if let Some(link) = self.peers.get_mut(&remote) {
                let error = link.expire();
                self.report_failure(&remote, error).await;
            }
        }
    }

    async fn on_room_info(&mut self, room: RoomId, members: Vec<ParticipantId>) {
        if room != self.room {
            debug!("Ignoring room_info for {}", room);
            return;
        }

        let members: BTreeSet<ParticipantId> =
            members.into_iter().filter(|m| m != &self.local).collect();
        let departed: Vec<ParticipantId> = self
            .peers
            .keys()
            .filter(|remote| !members.contains(*remote))
            .cloned()
            .collect();
        for remote in departed {
            self.close_link(&remote).await;
        }

        info!("{} is in room {} with {} others", self.local, room, members.len());
        debug!(
            "Room {} leader: {:?}",
            room,
            room_leader(members.iter().chain([&self.local]))
        );
        self.members = members;
        for remote in offer_targets(&self.local, &self.members) {
            self.discover(&remote).await;
        }
    }

    async fn on_new_peer(&mut self, remote: ParticipantId) {
        if remote == self.local {
            return;
        }
        self.members.insert(remote.clone());
        // A fresh join means the remote side has no state for this pair any more.
        if self.peers.contains_key(&remote) {
            info!("{} rejoined; dropping the old link", remote);
            self.close_link(&remote).await;
        }
        self.discover(&remote).await;
    }

    async fn on_ready(&mut self, remote: ParticipantId) {
        self.members.insert(remote.clone());
        if self
            .peers
            .get(&remote)
            .is_some_and(|link| link.state().is_active())
        {
            return;
        }
        self.discover(&remote).await;
    }

    /// Offers to `remote` if this side is the pair's initiator and nothing is under way.
    async fn discover(&mut self, remote: &ParticipantId) {
        if !should_initiate(&self.local, remote) {
            debug!("Waiting for {} to offer", remote);
            return;
        }
        if self
            .peers
            .get(remote)
            .is_some_and(|link| link.state().is_active())
        {
            return;
        }
        let Some(media) = self.media.clone() else {
            debug!("Offer to {} deferred until local media is attached", remote);
            return;
        };

        if let Err(e) = self.replace_link(remote).await {
            self.report_failure(remote, e).await;
            return;
        }
        let Some(link) = self.peers.get_mut(remote) else {
            return;
        };
        match link.create_offer(Some(&*media)).await {
            Ok(offer) => self.connection.send(offer),
            Err(e) => self.report_failure(remote, e).await,
        }
    }

    async fn on_offer(&mut self, from: ParticipantId, sdp: String) {
        self.members.insert(from.clone());

        let reuse = match self.peers.get(&from).map(PeerLink::state) {
            None => false,
            Some(PeerState::Idle) => true,
            Some(PeerState::Offering) if initiator_for(&self.local, &from) != &from => {
                warn!("Ignoring competing offer from {}; this side initiates", from);
                return;
            }
            Some(state) => {
                info!("Offer from {} supersedes the {} link", from, state);
                false
            }
        };
        if !reuse {
            if let Err(e) = self.replace_link(&from).await {
                self.report_failure(&from, e).await;
                return;
            }
        }

        let Some(link) = self.peers.get_mut(&from) else {
            return;
        };
        if let Err(e) = link.receive_offer(sdp).await {
            self.report_failure(&from, e).await;
            return;
        }
        self.answer(&from).await;
    }

    async fn answer(&mut self, remote: &ParticipantId) {
        let media = self.media.clone();
        let Some(link) = self.peers.get_mut(remote) else {
            return;
        };
        match link.create_answer(media.as_deref()).await {
            Ok(answer) => {
                self.connection.send(answer);
                self.emit(ClientEvent::PeerConnected(remote.clone()));
            }
            Err(NegotiationFailure::NoLocalMedia) => {
                debug!("Answer to {} deferred until local media is attached", remote);
            }
            Err(e) => self.report_failure(remote, e).await,
        }
    }

    async fn on_answer(&mut self, from: ParticipantId, sdp: String) {
        let Some(link) = self.peers.get_mut(&from) else {
            warn!("Answer from {} without a pending offer", from);
            return;
        };
        match link.receive_answer(sdp).await {
            Ok(()) => self.emit(ClientEvent::PeerConnected(from)),
            Err(e @ NegotiationFailure::InvalidState { .. }) => {
                warn!("Ignoring answer from {}: {}", from, e);
            }
            Err(e) => self.report_failure(&from, e).await,
        }
    }

    async fn on_candidate(&mut self, from: ParticipantId, candidate: Candidate) {
        match self.peers.get_mut(&from) {
            Some(link) => link.receive_candidate(candidate).await,
            None => debug!("Dropping candidate from {} without a link", from),
        }
    }

    async fn on_routing_failure(
        &mut self,
        kind: EventKind,
        to: Option<ParticipantId>,
        reason: String,
    ) {
        warn!("Server could not deliver `{}` to {:?}: {}", kind, to, reason);
        match (kind, &to) {
            (EventKind::Offer | EventKind::Answer, Some(remote)) => {
                self.members.remove(remote);
                self.close_link(remote).await;
            }
            // the registry refused our id or handed it to a newer connection
            (EventKind::JoinRoom, _) if self.in_room => {
                error!("{} is no longer in room {}: {}", self.local, self.room, reason);
                self.drop_room().await;
            }
            _ => {}
        }
        self.emit(ClientEvent::RoutingFailed { kind, to, reason });
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(remote, candidate) => {
                if self
                    .peers
                    .get(&remote)
                    .is_some_and(|link| !link.state().is_terminal())
                {
                    self.connection.send(Envelope::IceCandidate {
                        from: self.local.clone(),
                        to: remote,
                        candidate,
                    });
                }
            }
            TransportEvent::Disconnected(remote) => {
                if !self.peers.contains_key(&remote) {
                    return;
                }
                info!("Direct connection to {} lost", remote);
                self.close_link(&remote).await;
                if self.members.contains(&remote) {
                    self.discover(&remote).await;
                }
            }
        }
    }

    fn on_transport_lost(&mut self) {
        self.connection.on_transport_lost();
        if self.connection.state() == ConnectionState::Failed {
            self.emit(ClientEvent::Disconnected);
            self.emit(ClientEvent::ReconnectFailed {
                reason: "reconnecting is disabled".into(),
            });
        }
    }

    /// Arms the retry timer once per reconnect attempt.
    fn schedule_retry(&mut self) {
        if self.retry_at.is_some() {
            return;
        }
        let ConnectionState::Reconnecting { attempt } = self.connection.state() else {
            return;
        };
        let Some(delay) = self.connection.next_retry() else {
            return;
        };

        if attempt == 1 {
            self.emit(ClientEvent::Disconnected);
        }
        self.retry_at = Some(Instant::now() + delay);
        self.emit(ClientEvent::Reconnecting { attempt });
    }

    async fn retry(&mut self) {
        self.retry_at = None;
        match self.connection.retry().await {
            Ok(RetryOutcome::Reconnected) => self.resume().await,
            Ok(RetryOutcome::Retrying { attempt }) => {
                debug!("Next reconnect attempt will be #{}", attempt);
            }
            Err(e) => {
                error!("Giving up on the signaling connection: {}", e);
                self.emit(ClientEvent::ReconnectFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Restores the room after a reconnect. Every link is discarded together with its
    /// queued traffic: the registry announces the rejoin as `peer_left` then `new_peer`,
    /// and each remote resets its side of the pair when it sees that.
    async fn resume(&mut self) {
        let discarded: HashSet<ParticipantId> = self.peers.keys().cloned().collect();
        for remote in &discarded {
            self.close_link(remote).await;
        }

        let before = self.connection.queued();
        self.connection.retain_queued(|envelope| match envelope {
            Envelope::JoinRoom { .. } => false,
            _ => envelope
                .recipient()
                .is_none_or(|to| !discarded.contains(to)),
        });
        debug!(
            "Purged {} queued envelopes after reconnect",
            before - self.connection.queued()
        );

        if self.in_room {
            self.send_join();
        }
        self.connection.flush();
        self.emit(ClientEvent::Connected);
    }

    /// Tears down any existing link to `remote` and installs a fresh `Idle` one.
    async fn replace_link(&mut self, remote: &ParticipantId) -> Result<(), NegotiationFailure> {
        if let Some(mut stale) = self.peers.remove(remote) {
            stale.teardown().await;
        }
        let transport = self
            .factory
            .create(remote, self.transport_tx.clone())
            .await?;
        self.peers.insert(
            remote.clone(),
            PeerLink::new(self.local.clone(), remote.clone(), transport),
        );
        Ok(())
    }

    async fn close_link(&mut self, remote: &ParticipantId) {
        if let Some(mut link) = self.peers.remove(remote) {
            link.teardown().await;
            self.emit(ClientEvent::PeerClosed(remote.clone()));
        }
    }

    async fn report_failure(&mut self, remote: &ParticipantId, error: NegotiationFailure) {
        if let Some(mut link) = self.peers.remove(remote) {
            link.teardown().await;
        }
        self.emit(ClientEvent::NegotiationFailed {
            peer: remote.clone(),
            reason: error.to_string(),
        });
    }

    fn send_join(&mut self) {
        self.connection.send(Envelope::JoinRoom {
            room: self.room.clone(),
            participant_id: self.local.clone(),
        });
    }

    async fn close(&mut self) {
        for (_, mut link) in self.peers.drain() {
            link.teardown().await;
        }
        self.connection.close();
        info!("Session for {} closed", self.local);
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
