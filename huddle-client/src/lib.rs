//! Client half of the huddle signaling core.
//!
//! A [`ClientSession`] owns everything one participant needs: the signaling channel
//! (through [`ConnectionManager`]), the outbound queue and one [`PeerLink`] per remote
//! participant. Nothing is global, so several sessions can live in one process.

mod config;
mod connection;
mod error;
mod peer;
mod session;
mod transport;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use peer::*;
pub use session::*;
pub use transport::*;
