use crate::error::RoutingFailure;
use crate::room::{ConnectionHandle, ConnectionId, RoomCommand, RoomManager};
use huddle_core::{Envelope, EventKind, ParticipantId, RoomId};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Actor owning the membership of one room. All membership mutations for the room
/// go through its command channel, so they are applied one at a time.
pub struct Room {
    id: RoomId,
    generation: u64,
    members: HashMap<ParticipantId, ConnectionHandle>,
    command_rx: mpsc::Receiver<RoomCommand>,
    manager: RoomManager,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        generation: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        manager: RoomManager,
    ) -> Self {
        Self {
            id,
            generation,
            members: HashMap::new(),
            command_rx,
            manager,
        }
    }

    pub async fn run(mut self) {
        info!("Room {} event loop started", self.id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);

            if self.members.is_empty() {
                break;
            }
        }

        self.shutdown().await;
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { handle, reply } => {
                let others = self.join(handle);
                let _ = reply.send(others);
            }

            RoomCommand::Leave {
                participant_id,
                connection_id,
                reply,
            } => {
                let removed = self.leave(&participant_id, connection_id);
                let _ = reply.send(removed);
            }

            RoomCommand::Route {
                sender,
                connection_id,
                envelope,
                reply,
            } => {
                let result = self.route(&sender, connection_id, envelope);
                let _ = reply.send(result);
            }

            RoomCommand::Broadcast {
                sender,
                connection_id,
                envelope,
                echo,
            } => {
                if !self.is_bound(&sender, connection_id) {
                    warn!(
                        "Dropping {} broadcast from non-member {} in room {}",
                        envelope.kind(),
                        sender,
                        self.id
                    );
                    return;
                }
                let excluded = (!echo).then_some(&sender);
                self.fan_out(excluded, envelope);
            }

            RoomCommand::Members { reply } => {
                let _ = reply.send(self.sorted_members(None));
            }
        }
    }

    fn join(&mut self, handle: ConnectionHandle) -> Result<Vec<ParticipantId>, RoutingFailure> {
        let participant_id = handle.participant_id.clone();

        match self.members.get(&participant_id) {
            Some(held) if held.connection_id == handle.connection_id => {
                debug!("{} re-sent join for room {}", participant_id, self.id);
            }
            Some(held) if held.owner != handle.owner => {
                warn!(
                    "{} tried to join room {} as {}, which {} holds",
                    handle.owner, self.id, participant_id, held.owner
                );
                return Err(RoutingFailure::ParticipantTaken(participant_id));
            }
            Some(held) => {
                info!(
                    "{} rejoined room {} on a new connection; superseding the old one",
                    participant_id, self.id
                );
                held.deliver(Envelope::RoutingFailure {
                    kind: EventKind::JoinRoom,
                    to: Some(participant_id.clone()),
                    reason: RoutingFailure::Superseded.to_string(),
                });
                self.announce_new_peer(&participant_id);
            }
            None => {
                info!(
                    "{} joined room {} ({} members)",
                    participant_id,
                    self.id,
                    self.members.len() + 1
                );
                self.announce_new_peer(&participant_id);
            }
        }

        self.members.insert(participant_id.clone(), handle.clone());
        let others = self.sorted_members(Some(&participant_id));
        handle.deliver(Envelope::RoomInfo {
            room: self.id.clone(),
            members: others.clone(),
        });

        Ok(others)
    }

    fn announce_new_peer(&self, participant_id: &ParticipantId) {
        self.fan_out(
            Some(participant_id),
            Envelope::NewPeer {
                participant_id: participant_id.clone(),
            },
        );
    }

    fn leave(&mut self, participant_id: &ParticipantId, connection_id: ConnectionId) -> bool {
        if !self.is_bound(participant_id, connection_id) {
            debug!(
                "Ignoring stale leave for {} in room {}",
                participant_id, self.id
            );
            return false;
        }

        self.members.remove(participant_id);
        info!(
            "{} left room {} ({} members remain)",
            participant_id,
            self.id,
            self.members.len()
        );

        self.fan_out(
            Some(participant_id),
            Envelope::PeerLeft {
                participant_id: participant_id.clone(),
            },
        );
        true
    }

    fn route(
        &self,
        sender: &ParticipantId,
        connection_id: ConnectionId,
        envelope: Envelope,
    ) -> Result<(), RoutingFailure> {
        if !self.is_bound(sender, connection_id) {
            return Err(RoutingFailure::NotJoined);
        }

        let to = envelope
            .recipient()
            .cloned()
            .ok_or(RoutingFailure::NotRoutable(envelope.kind()))?;
        if &to == sender {
            return Err(RoutingFailure::SelfAddressed);
        }

        let Some(recipient) = self.members.get(&to) else {
            return Err(RoutingFailure::RecipientNotFound(to));
        };

        debug!(
            "Routing {} {} -> {} in room {}",
            envelope.kind(),
            sender,
            to,
            self.id
        );
        if !recipient.deliver(envelope) {
            // The socket is gone but its leave has not been processed yet.
            return Err(RoutingFailure::RecipientNotFound(to));
        }
        Ok(())
    }

    /// Delivers `envelope` to every member other than `excluded`.
    fn fan_out(&self, excluded: Option<&ParticipantId>, envelope: Envelope) {
        for (participant_id, handle) in &self.members {
            if Some(participant_id) == excluded {
                continue;
            }
            if !handle.deliver(envelope.clone()) {
                debug!(
                    "Skipping {} for closed connection of {}",
                    envelope.kind(),
                    participant_id
                );
            }
        }
    }

    fn is_bound(&self, participant_id: &ParticipantId, connection_id: ConnectionId) -> bool {
        self.members
            .get(participant_id)
            .is_some_and(|handle| handle.connection_id == connection_id)
    }

    fn sorted_members(&self, excluding: Option<&ParticipantId>) -> Vec<ParticipantId> {
        let mut members: Vec<ParticipantId> = self
            .members
            .keys()
            .filter(|id| Some(*id) != excluding)
            .cloned()
            .collect();
        members.sort();
        members
    }

    /// Unregisters the room, then hands any command that raced the shutdown back to
    /// the manager so it lands in a fresh room.
    async fn shutdown(mut self) {
        self.manager.forget(&self.id, self.generation);
        self.command_rx.close();

        let mut redispatched = 0usize;
        while let Some(cmd) = self.command_rx.recv().await {
            redispatched += 1;
            self.manager.redispatch(self.id.clone(), cmd).await;
        }

        info!(
            "Room {} destroyed ({} late commands redispatched)",
            self.id, redispatched
        );
    }
}
