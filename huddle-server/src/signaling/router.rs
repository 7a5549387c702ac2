use crate::signaling::{SignalingService, login_handler, ws_handler};
use axum::Router;
use axum::routing::{get, post};

pub fn signaling_router(service: SignalingService) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/ws", get(ws_handler))
        .with_state(service)
}
