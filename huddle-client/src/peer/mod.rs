mod media;
mod peer_link;
mod peer_state;
mod peer_transport;
#[cfg(feature = "webrtc")]
mod webrtc_transport;

pub use media::*;
pub use peer_link::*;
pub use peer_state::*;
pub use peer_transport::*;
#[cfg(feature = "webrtc")]
pub use webrtc_transport::*;
