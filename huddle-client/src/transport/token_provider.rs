use crate::error::{AuthFailure, ClientError, TransportFailure};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Source of the one-time token that authorizes a websocket upgrade. Asked again
/// before every reconnect since tokens are single use.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, ClientError>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    otp: String,
}

/// Obtains tokens from the server's `/login` endpoint.
pub struct LoginTokenProvider {
    http: reqwest::Client,
    login_url: String,
    username: String,
    password: String,
}

impl LoginTokenProvider {
    pub fn new(server_url: &str, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            login_url: format!("{}/login", server_url.trim_end_matches('/')),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for LoginTokenProvider {
    async fn token(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(&self.login_url)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| TransportFailure::Login(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AuthFailure::Rejected.into()),
            status if !status.is_success() => {
                Err(TransportFailure::Login(format!("unexpected status {status}")).into())
            }
            _ => {
                let body: LoginResponse = response
                    .json()
                    .await
                    .map_err(|e| TransportFailure::Login(e.to_string()))?;
                Ok(body.otp)
            }
        }
    }
}
