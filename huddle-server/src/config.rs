use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    /// Parses `name:password`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (username, password) = raw.split_once(':')?;
        if username.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }
}

/// Registry server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// How long an issued one-time password stays redeemable.
    pub otp_retention: Duration,
    /// Buffered commands per room actor.
    pub room_command_capacity: usize,
    pub credentials: Vec<Credential>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            otp_retention: Duration::from_secs(5),
            room_command_capacity: 100,
            credentials: Vec::new(),
        }
    }
}
