use crate::config::ReconnectPolicy;
use crate::connection::OutboundQueue;
use crate::error::ClientError;
use crate::transport::{Connector, SignalChannel};
use huddle_core::Envelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
    /// Automatic reconnection gave up. Only a new session recovers from this.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Reconnected,
    Retrying { attempt: u32 },
}

/// Owns the signaling channel, its outbound queue and the reconnect schedule.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    state: ConnectionState,
    channel: Option<SignalChannel>,
    queue: OutboundQueue,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, policy: ReconnectPolicy, queue_capacity: usize) -> Self {
        Self {
            connector,
            policy,
            state: ConnectionState::Disconnected,
            channel: None,
            queue: OutboundQueue::new(queue_capacity),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub async fn connect(&mut self) -> Result<(), ClientError> {
        match self.connector.connect().await {
            Ok(channel) => {
                self.channel = Some(channel);
                self.state = ConnectionState::Connected;
                info!("Signaling channel connected");
                Ok(())
            }
            Err(e) => {
                self.state = if e.is_terminal() {
                    ConnectionState::Failed
                } else {
                    ConnectionState::Disconnected
                };
                Err(e)
            }
        }
    }

    /// Transmits `envelope` now if the channel is open, otherwise queues it.
    pub fn send(&mut self, envelope: Envelope) {
        if self.state == ConnectionState::Failed {
            warn!("Dropping `{}`: connection has failed", envelope.kind());
            return;
        }

        let Some(channel) = &self.channel else {
            debug!("Queueing `{}` while disconnected", envelope.kind());
            self.queue.push(envelope);
            return;
        };

        if let Err(mpsc::error::SendError(envelope)) = channel.outbound.send(envelope) {
            warn!("Signaling channel refused `{}`", envelope.kind());
            self.queue.push(envelope);
            self.on_transport_lost();
        }
    }

    /// Sends every queued envelope in enqueue order.
    pub fn flush(&mut self) -> usize {
        let Some(outbound) = self.channel.as_ref().map(|c| c.outbound.clone()) else {
            return 0;
        };

        let mut pending = self.queue.drain().into_iter();
        let mut sent = 0;
        while let Some(envelope) = pending.next() {
            if let Err(mpsc::error::SendError(envelope)) = outbound.send(envelope) {
                self.queue.push(envelope);
                for rest in pending {
                    self.queue.push(rest);
                }
                self.on_transport_lost();
                break;
            }
            sent += 1;
        }
        if sent > 0 {
            debug!("Flushed {} queued envelopes", sent);
        }
        sent
    }

    pub fn retain_queued(&mut self, keep: impl FnMut(&Envelope) -> bool) {
        self.queue.retain(keep);
    }

    /// Next inbound envelope. Yields `None` once the channel is lost; pends forever
    /// while there is no channel.
    pub async fn recv(&mut self) -> Option<Envelope> {
        match self.channel.as_mut() {
            Some(channel) => channel.inbound.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Drops the channel and enters the reconnect schedule. Returns the delay before
    /// the first attempt, or `None` when no attempt will be made.
    pub fn on_transport_lost(&mut self) -> Option<Duration> {
        if self.channel.take().is_none() && self.state != ConnectionState::Connected {
            return self.next_retry();
        }

        if self.policy.max_attempts == 0 {
            error!("Signaling channel lost and reconnecting is disabled");
            self.state = ConnectionState::Failed;
            return None;
        }

        warn!("Signaling channel lost, reconnecting in {:?}", self.policy.delay);
        self.state = ConnectionState::Reconnecting { attempt: 1 };
        Some(self.policy.delay)
    }

    pub fn next_retry(&self) -> Option<Duration> {
        match self.state {
            ConnectionState::Reconnecting { .. } => Some(self.policy.delay),
            _ => None,
        }
    }

    /// Performs the pending reconnect attempt. An `Err` is terminal.
    pub async fn retry(&mut self) -> Result<RetryOutcome, ClientError> {
        let ConnectionState::Reconnecting { attempt } = self.state else {
            return Ok(RetryOutcome::Reconnected);
        };
        info!("Reconnect attempt {}/{}", attempt, self.policy.max_attempts);

        match self.connector.connect().await {
            Ok(channel) => {
                self.channel = Some(channel);
                self.state = ConnectionState::Connected;
                info!("Signaling channel restored after {} attempts", attempt);
                Ok(RetryOutcome::Reconnected)
            }
            Err(e) if e.is_terminal() => {
                error!("Reconnect refused: {}", e);
                self.state = ConnectionState::Failed;
                Err(e)
            }
            Err(e) if attempt >= self.policy.max_attempts => {
                error!("Reconnect attempt {} failed: {}; giving up", attempt, e);
                self.state = ConnectionState::Failed;
                Err(ClientError::ReconnectExhausted { attempts: attempt })
            }
            Err(e) => {
                warn!("Reconnect attempt {} failed: {}", attempt, e);
                let attempt = attempt + 1;
                self.state = ConnectionState::Reconnecting { attempt };
                Ok(RetryOutcome::Retrying { attempt })
            }
        }
    }

    /// Closes the channel without scheduling a reconnect.
    pub fn close(&mut self) {
        self.channel = None;
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Disconnected;
        }
    }
}
