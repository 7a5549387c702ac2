use crate::error::ClientError;
use async_trait::async_trait;
use huddle_core::Envelope;
use tokio::sync::mpsc;

/// One open signaling channel. The channel is lost once `inbound` yields `None` or
/// `outbound` refuses a send.
pub struct SignalChannel {
    pub outbound: mpsc::UnboundedSender<Envelope>,
    pub inbound: mpsc::UnboundedReceiver<Envelope>,
}

impl SignalChannel {
    /// Two in-memory ends wired to each other.
    pub fn pair() -> (SignalChannel, SignalChannel) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            SignalChannel {
                outbound: a_tx,
                inbound: b_rx,
            },
            SignalChannel {
                outbound: b_tx,
                inbound: a_rx,
            },
        )
    }
}

/// Opens signaling channels to the registry. Called once per (re)connect.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<SignalChannel, ClientError>;
}
