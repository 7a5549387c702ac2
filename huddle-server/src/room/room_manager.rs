use crate::error::RoutingFailure;
use crate::room::{ConnectionHandle, ConnectionId, Room, RoomCommand};
use dashmap::DashMap;
use huddle_core::{Envelope, ParticipantId, RoomId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

#[derive(Clone)]
struct RoomEntry {
    generation: u64,
    sender: mpsc::Sender<RoomCommand>,
}

/// Directory of live room actors. Rooms are spawned on first join and remove
/// themselves once their last member leaves.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomEntry>>,
    next_generation: Arc<AtomicU64>,
    command_capacity: usize,
}

impl RoomManager {
    pub fn new(command_capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            next_generation: Arc::new(AtomicU64::new(0)),
            command_capacity: command_capacity.max(1),
        }
    }

    /// Registers `handle` in `room_id` and returns the other members. The joiner also
    /// receives them as a `room_info` envelope, and everyone else gets `new_peer`.
    /// Fails with [`RoutingFailure::ParticipantTaken`] when a live member of another
    /// login holds the id.
    pub async fn join(
        &self,
        room_id: &RoomId,
        handle: ConnectionHandle,
    ) -> Result<Vec<ParticipantId>, RoutingFailure> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(room_id.clone(), RoomCommand::Join { handle, reply }, true)
            .await;
        rx.await
            .unwrap_or_else(|_| Err(RoutingFailure::RoomUnavailable(room_id.clone())))
    }

    /// Removes the participant if it is still bound to `connection_id`. Returns whether
    /// anything was removed.
    pub async fn leave(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        connection_id: ConnectionId,
    ) -> bool {
        let (reply, rx) = oneshot::channel();
        let cmd = RoomCommand::Leave {
            participant_id: participant_id.clone(),
            connection_id,
            reply,
        };
        self.dispatch(room_id.clone(), cmd, false).await;
        rx.await.unwrap_or(false)
    }

    /// Forwards a point-to-point envelope to its recipient inside `room_id`.
    pub async fn route(
        &self,
        room_id: &RoomId,
        sender: &ParticipantId,
        connection_id: ConnectionId,
        envelope: Envelope,
    ) -> Result<(), RoutingFailure> {
        if !envelope.kind().is_point_to_point() {
            return Err(RoutingFailure::NotRoutable(envelope.kind()));
        }

        let (reply, rx) = oneshot::channel();
        let cmd = RoomCommand::Route {
            sender: sender.clone(),
            connection_id,
            envelope,
            reply,
        };
        self.dispatch(room_id.clone(), cmd, false).await;
        // A missing room means the sender is not a member of it either.
        rx.await.unwrap_or(Err(RoutingFailure::NotJoined))
    }

    /// Fans `envelope` out to the room. The sender gets a copy too when `echo` is set.
    pub async fn broadcast(
        &self,
        room_id: &RoomId,
        sender: &ParticipantId,
        connection_id: ConnectionId,
        envelope: Envelope,
        echo: bool,
    ) {
        let cmd = RoomCommand::Broadcast {
            sender: sender.clone(),
            connection_id,
            envelope,
            echo,
        };
        self.dispatch(room_id.clone(), cmd, false).await;
    }

    /// Membership snapshot, sorted. Empty for rooms that do not exist.
    pub async fn members(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(room_id.clone(), RoomCommand::Members { reply }, false)
            .await;
        rx.await.unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub(crate) async fn redispatch(&self, room_id: RoomId, cmd: RoomCommand) {
        let create = matches!(cmd, RoomCommand::Join { .. });
        self.dispatch(room_id, cmd, create).await;
    }

    /// Drops the directory entry for a room, unless it has already been replaced by a
    /// newer generation.
    pub(crate) fn forget(&self, room_id: &RoomId, generation: u64) {
        self.rooms
            .remove_if(room_id, |_, entry| entry.generation == generation);
    }

    /// Delivers a command to the room's actor. When `create` is false and the room does
    /// not exist, the command is dropped, which resolves its reply channel as closed.
    async fn dispatch(&self, room_id: RoomId, mut cmd: RoomCommand, create: bool) {
        loop {
            let entry = if create {
                self.get_or_spawn(&room_id)
            } else {
                match self.rooms.get(&room_id) {
                    Some(entry) => entry.clone(),
                    None => {
                        debug!("Dropping command for missing room {}", room_id);
                        return;
                    }
                }
            };

            match entry.sender.send(cmd).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    // The actor shut down between lookup and send.
                    self.forget(&room_id, entry.generation);
                    cmd = returned;
                    if !create {
                        return;
                    }
                }
            }
        }
    }

    fn get_or_spawn(&self, room_id: &RoomId) -> RoomEntry {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                info!("Creating new room: {} (generation {})", room_id, generation);

                let (tx, rx) = mpsc::channel(self.command_capacity);
                let room = Room::new(room_id.clone(), generation, rx, self.clone());
                tokio::spawn(room.run());

                RoomEntry {
                    generation,
                    sender: tx,
                }
            })
            .clone()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(100)
    }
}
