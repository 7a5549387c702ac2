use crate::error::{AuthFailure, ClientError, TransportFailure};
use crate::transport::{Connector, SignalChannel, TokenProvider};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::codec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

/// Websocket connector for `{ws_url}/ws?otp=...`.
pub struct WsConnector {
    ws_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl WsConnector {
    pub fn new(ws_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            ws_url: ws_url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<SignalChannel, ClientError> {
        let otp = self.tokens.token().await?;
        let url = format!("{}/ws?otp={}", self.ws_url, otp);

        let (stream, _) = match connect_async(url.as_str()).await {
            Ok(connected) => connected,
            Err(WsError::Http(response)) if response.status().as_u16() == 401 => {
                return Err(AuthFailure::TokenRejected.into());
            }
            Err(e) => {
                return Err(TransportFailure::Connect {
                    url: self.ws_url.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
        };
        info!("Signaling websocket connected to {}", self.ws_url);

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(envelope) = outbound_rx.recv().await {
                let text = codec::encode_text(&envelope);
                if sink.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let decoded = match frame {
                    Ok(Message::Text(text)) => codec::decode(text.as_bytes()),
                    Ok(Message::Binary(data)) => codec::decode(&data),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Signaling websocket error: {}", e);
                        break;
                    }
                };

                match decoded {
                    Ok(envelope) => {
                        if inbound_tx.send(envelope).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_forward_compatible() => {
                        warn!("Ignoring frame from server: {}", e);
                    }
                    Err(e) => warn!("Discarding malformed frame from server: {}", e),
                }
            }
            debug!("Signaling reader finished");
        });

        Ok(SignalChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
