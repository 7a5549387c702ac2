use huddle_core::{ParticipantId, RoomId};
use std::time::Duration;

/// Fixed-delay reconnect schedule with a capped number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP(S) address of the signaling server, e.g. `http://127.0.0.1:9090`.
    pub server_url: String,
    pub room: RoomId,
    pub participant_id: ParticipantId,
    pub queue_capacity: usize,
    pub reconnect: ReconnectPolicy,
    /// How long an offer may wait for its answer. `None` waits forever.
    pub offer_timeout: Option<Duration>,
    pub ice_servers: Vec<String>,
}

impl ClientConfig {
    pub fn new(
        server_url: impl Into<String>,
        room: impl Into<RoomId>,
        participant_id: impl Into<ParticipantId>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            room: room.into(),
            participant_id: participant_id.into(),
            queue_capacity: 50,
            reconnect: ReconnectPolicy::default(),
            offer_timeout: Some(Duration::from_secs(30)),
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
        }
    }

    /// Websocket base derived from `server_url` (`http` -> `ws`, `https` -> `wss`).
    pub fn ws_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_owned()
        }
    }

    pub fn http_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}
