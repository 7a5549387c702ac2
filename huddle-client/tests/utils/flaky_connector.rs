use async_trait::async_trait;
use huddle_client::{ClientError, Connector, SignalChannel, WsConnector};
use huddle_core::Envelope;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Tapped {
    Sent(Envelope),
    Received(Envelope),
}

/// Real websocket connector whose current channel the test can cut at will. All
/// traffic is mirrored to a tap.
pub struct FlakyConnector {
    inner: WsConnector,
    kill: Mutex<Option<oneshot::Sender<()>>>,
    tap: mpsc::UnboundedSender<Tapped>,
}

impl FlakyConnector {
    pub fn new(inner: WsConnector) -> (Self, mpsc::UnboundedReceiver<Tapped>) {
        let (tap, tap_rx) = mpsc::unbounded_channel();
        (
            Self {
                inner,
                kill: Mutex::new(None),
                tap,
            },
            tap_rx,
        )
    }

    /// Drops the current channel on both sides.
    pub fn sever(&self) {
        if let Some(kill) = self.kill.lock().unwrap().take() {
            let _ = kill.send(());
        }
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    async fn connect(&self) -> Result<SignalChannel, ClientError> {
        let mut real = self.inner.connect().await?;
        let (session_side, mut relay_side) = SignalChannel::pair();
        let (kill_tx, mut kill_rx) = oneshot::channel();
        *self.kill.lock().unwrap() = Some(kill_tx);
        let tap = self.tap.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut kill_rx => break,
                    inbound = real.inbound.recv() => match inbound {
                        Some(envelope) => {
                            let _ = tap.send(Tapped::Received(envelope.clone()));
                            if relay_side.outbound.send(envelope).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    outbound = relay_side.inbound.recv() => match outbound {
                        Some(envelope) => {
                            let _ = tap.send(Tapped::Sent(envelope.clone()));
                            if real.outbound.send(envelope).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Ok(session_side)
    }
}
