use crate::error::AuthError;
use crate::signaling::{ClientConnection, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use huddle_core::{Envelope, codec};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub otp: Option<String>,
}

/// `GET /ws?otp=...`. Upgrades only when the one-time password is valid.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(service): State<SignalingService>,
) -> Response {
    let owner = params
        .otp
        .filter(|otp| !otp.is_empty())
        .and_then(|otp| service.otps().verify(&otp));
    let Some(owner) = owner else {
        warn!("Rejected websocket upgrade: {}", AuthError::InvalidToken);
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, service, owner))
}

async fn handle_socket(socket: WebSocket, service: SignalingService, owner: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

    let mut connection = ClientConnection::new(service.rooms().clone(), owner, tx);
    let connection_id = connection.id();
    info!("New WebSocket connection: {} ({})", connection_id, connection.owner());

    let mut send_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let text = codec::encode_text(&envelope);
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => connection.handle_frame(text.as_bytes()).await,
                Some(Ok(Message::Binary(data))) => connection.handle_frame(&data).await,
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    connection.leave().await;
    info!("WebSocket disconnected: {}", connection_id);
}
