use crate::config::Credential;
use crate::error::AuthError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Credential check performed by `POST /login`. The registry treats it as a black box.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError>;
}

/// Fixed username/password table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, String>,
}

impl StaticAuthenticator {
    pub fn new(credentials: &[Credential]) -> Self {
        Self {
            users: credentials
                .iter()
                .map(|c| (c.username.clone(), c.password.clone()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        match self.users.get(username) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}
