//! Shared protocol types for the huddle signaling core: participant and room ids,
//! the signaling [`Envelope`], its JSON codec and the initiator election rule.

pub mod codec;
pub mod election;
pub mod model;

pub use codec::{DecodeError, decode, encode};
pub use model::{Candidate, Envelope, EventKind, ParticipantId, RoomId};
