use crate::auth::{Authenticator, OtpStore, StaticAuthenticator};
use crate::config::ServerConfig;
use crate::room::RoomManager;
use std::sync::Arc;
use tracing::warn;

struct SignalingInner {
    rooms: RoomManager,
    otps: OtpStore,
    authenticator: Arc<dyn Authenticator>,
}

/// Shared state behind the HTTP and websocket handlers.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    /// Must be called inside a tokio runtime; it starts the OTP sweeper.
    pub fn new(config: &ServerConfig) -> Self {
        let authenticator = StaticAuthenticator::new(&config.credentials);
        if authenticator.is_empty() {
            warn!("No credentials configured; every login will be rejected");
        }
        Self::with_authenticator(config, Arc::new(authenticator))
    }

    pub fn with_authenticator(config: &ServerConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        let otps = OtpStore::new(config.otp_retention);
        otps.spawn_sweeper();

        Self {
            inner: Arc::new(SignalingInner {
                rooms: RoomManager::new(config.room_command_capacity),
                otps,
                authenticator,
            }),
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.inner.rooms
    }

    pub fn otps(&self) -> &OtpStore {
        &self.inner.otps
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.inner.authenticator.as_ref()
    }
}
