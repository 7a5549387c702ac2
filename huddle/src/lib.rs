pub use huddle_core::{Candidate, Envelope, EventKind, ParticipantId, RoomId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod codec {
    pub use huddle_core::codec::*;
}

pub mod election {
    pub use huddle_core::election::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}
