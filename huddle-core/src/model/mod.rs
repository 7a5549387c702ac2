mod candidate;
mod envelope;
mod participant;
mod room;

pub use candidate::Candidate;
pub use envelope::{Envelope, EventKind};
pub use participant::ParticipantId;
pub use room::RoomId;
