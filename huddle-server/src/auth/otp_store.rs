use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Login a one-time password was issued to, and when.
#[derive(Debug, Clone)]
struct Issued {
    owner: String,
    at: Instant,
}

/// One-time passwords handed out by `/login` and redeemed by the websocket upgrade.
/// Each key is valid once, within the retention window, and carries the login that
/// asked for it.
#[derive(Clone)]
pub struct OtpStore {
    issued: Arc<DashMap<String, Issued>>,
    retention: Duration,
}

impl OtpStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            issued: Arc::new(DashMap::new()),
            retention,
        }
    }

    pub fn issue(&self, owner: &str) -> String {
        let key = Uuid::new_v4().to_string();
        self.issued.insert(
            key.clone(),
            Issued {
                owner: owner.to_owned(),
                at: Instant::now(),
            },
        );
        key
    }

    /// Consumes `key` and returns the login it was issued to. Expired or unknown keys
    /// yield `None`.
    pub fn verify(&self, key: &str) -> Option<String> {
        let (_, issued) = self.issued.remove(key)?;
        (issued.at.elapsed() <= self.retention).then_some(issued.owner)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    /// Periodically drops expired keys. Stops once every clone of the store is dropped.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let issued: Weak<DashMap<String, Issued>> = Arc::downgrade(&self.issued);
        let retention = self.retention;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(retention);
            loop {
                ticker.tick().await;
                let Some(issued) = issued.upgrade() else {
                    break;
                };
                let before = issued.len();
                issued.retain(|_, issued| issued.at.elapsed() <= retention);
                let swept = before.saturating_sub(issued.len());
                if swept > 0 {
                    debug!("Swept {} expired one-time passwords", swept);
                }
            }
        })
    }
}
