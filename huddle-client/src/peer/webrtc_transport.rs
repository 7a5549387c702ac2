use crate::error::NegotiationFailure;
use crate::peer::{MediaKind, MediaSource, PeerTransport, PeerTransportFactory, SdpKind, TransportEvent};
use async_trait::async_trait;
use huddle_core::{Candidate, ParticipantId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

fn rtc_error(error: webrtc::Error) -> NegotiationFailure {
    NegotiationFailure::Transport(error.to_string())
}

/// Hands a callback event to the session without waiting for room in the channel.
fn forward(tx: &mpsc::Sender<TransportEvent>, event: TransportEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(event)) => {
            warn!("Transport event channel full; dropping {:?}", event);
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("Session gone; transport event dropped");
            false
        }
    }
}

/// Builds one webrtc-rs peer connection per remote participant.
#[derive(Clone)]
pub struct WebRtcTransportFactory {
    ice_servers: Vec<String>,
}

impl WebRtcTransportFactory {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl PeerTransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, NegotiationFailure> {
        let transport = WebRtcTransport::new(remote.clone(), &self.ice_servers, events).await?;
        Ok(Box::new(transport))
    }
}

pub struct WebRtcTransport {
    remote: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
    closing: Arc<AtomicBool>,
}

impl WebRtcTransport {
    pub async fn new(
        remote: ParticipantId,
        ice_servers: &[String],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, NegotiationFailure> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(rtc_error)?;
        let registry =
            register_default_interceptors(Registry::new(), &mut media_engine).map_err(rtc_error)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: ice_servers.to_vec(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await.map_err(rtc_error)?);
        let closing = Arc::new(AtomicBool::new(false));

        let state_tx = events.clone();
        let state_remote = remote.clone();
        let state_closing = closing.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let remote = state_remote.clone();
                let closing = state_closing.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", remote, s);
                    // A close we started ourselves is not news to the session.
                    if closing.load(Ordering::Acquire) {
                        return;
                    }
                    if matches!(
                        s,
                        RTCPeerConnectionState::Failed
                            | RTCPeerConnectionState::Disconnected
                            | RTCPeerConnectionState::Closed
                    ) {
                        forward(&tx, TransportEvent::Disconnected(remote));
                    }
                })
            },
        ));

        let ice_tx = events;
        let ice_remote = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let remote = ice_remote.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = Candidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                forward(&tx, TransportEvent::CandidateGenerated(remote, candidate));
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
            closing,
        })
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn add_local_media(&self, media: &dyn MediaSource) -> Result<(), NegotiationFailure> {
        for track in media.tracks() {
            let mime_type = match track.kind {
                MediaKind::Audio => MIME_TYPE_OPUS,
                MediaKind::Video => MIME_TYPE_VP8,
            };
            let local: Arc<dyn TrackLocal + Send + Sync> = Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: mime_type.to_owned(),
                    ..Default::default()
                },
                track.id.clone(),
                track.stream_id.clone(),
            ));
            self.peer_connection
                .add_track(local)
                .await
                .map_err(rtc_error)?;
            debug!("Added local {:?} track {} for {}", track.kind, track.id, self.remote);
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<String, NegotiationFailure> {
        let offer = self.peer_connection.create_offer(None).await.map_err(rtc_error)?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(rtc_error)?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, NegotiationFailure> {
        let answer = self.peer_connection.create_answer(None).await.map_err(rtc_error)?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(rtc_error)?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationFailure> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp),
            SdpKind::Answer => RTCSessionDescription::answer(sdp),
        }
        .map_err(rtc_error)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(rtc_error)
    }

    async fn add_remote_candidate(&self, candidate: Candidate) -> Result<(), NegotiationFailure> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(rtc_error)
    }

    async fn close(&self) {
        self.closing.store(true, Ordering::Release);
        if let Err(e) = self.peer_connection.close().await {
            warn!("Closing peer connection to {} failed: {}", self.remote, e);
        }
    }
}
