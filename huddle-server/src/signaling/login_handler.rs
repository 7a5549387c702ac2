use crate::signaling::SignalingService;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub otp: String,
}

/// `POST /login`. Exchanges credentials for a one-time password that opens `/ws`.
pub async fn login_handler(
    State(service): State<SignalingService>,
    Json(req): Json<LoginRequest>,
) -> Response {
    match service
        .authenticator()
        .authenticate(&req.username, &req.password)
        .await
    {
        Ok(()) => {
            info!("Issued one-time password for {}", req.username);
            let otp = service.otps().issue(&req.username);
            Json(LoginResponse { otp }).into_response()
        }
        Err(e) => {
            warn!("Login rejected for {}: {}", req.username, e);
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
