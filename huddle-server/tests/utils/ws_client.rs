use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use huddle_core::{Envelope, EventKind, ParticipantId, RoomId, codec};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected envelope (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// Window used to assert that nothing arrives (ms).
pub const QUIET_WINDOW_MS: u64 = 200;

/// Raw websocket peer speaking the envelope protocol.
pub struct WsTestClient {
    pub participant_id: ParticipantId,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTestClient {
    pub async fn connect(url: &str, participant_id: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await.context("websocket connect failed")?;
        Ok(Self {
            participant_id: ParticipantId::from(participant_id),
            stream,
        })
    }

    pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.stream
            .send(Message::text(codec::encode_text(envelope)))
            .await
            .context("websocket send failed")
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::text(text.to_owned()))
            .await
            .context("websocket send failed")
    }

    /// Sends `join_room` and waits for the matching `room_info`.
    pub async fn join(&mut self, room: &str) -> Result<Vec<ParticipantId>> {
        let envelope = Envelope::JoinRoom {
            room: RoomId::from(room),
            participant_id: self.participant_id.clone(),
        };
        self.send(&envelope).await?;

        match self.expect(EventKind::RoomInfo).await? {
            Envelope::RoomInfo { members, .. } => Ok(members),
            other => bail!("unexpected envelope {:?}", other),
        }
    }

    pub async fn recv(&mut self, timeout_ms: u64) -> Result<Option<Envelope>> {
        let deadline = Duration::from_millis(timeout_ms);
        loop {
            let next = match tokio::time::timeout(deadline, self.stream.next()).await {
                Ok(next) => next,
                Err(_) => return Ok(None),
            };
            match next {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(codec::decode(text.as_bytes())?));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Waits for the next envelope and checks its kind.
    pub async fn expect(&mut self, kind: EventKind) -> Result<Envelope> {
        let envelope = self
            .recv(RECV_TIMEOUT_MS)
            .await?
            .with_context(|| format!("timed out waiting for {}", kind))?;
        if envelope.kind() != kind {
            bail!("expected {}, got {:?}", kind, envelope);
        }
        Ok(envelope)
    }

    pub async fn expect_silence(&mut self) -> Result<()> {
        if let Some(envelope) = self.recv(QUIET_WINDOW_MS).await? {
            bail!("expected no traffic, got {:?}", envelope);
        }
        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
