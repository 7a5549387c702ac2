use crate::peer::PeerState;
use huddle_core::ParticipantId;
use thiserror::Error;

/// The login step or the token it produced was refused. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("credentials rejected by the login endpoint")]
    Rejected,

    #[error("session token rejected by the signaling server")]
    TokenRejected,
}

/// The signaling channel could not be opened or went away. Triggers the reconnect flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("login request failed: {0}")]
    Login(String),

    #[error("signaling channel closed")]
    Closed,
}

/// Setup of one peer connection failed. Only that peer's link is affected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationFailure {
    #[error("no local media attached")]
    NoLocalMedia,

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: PeerState,
    },

    #[error("offer to {0} was not answered in time")]
    Timeout(ParticipantId),

    #[error("peer transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    Transport(#[from] TransportFailure),

    #[error("gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

impl ClientError {
    /// Errors after which no automatic reconnect is attempted.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClientError::Transport(_))
    }
}
