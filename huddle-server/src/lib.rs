//! Room Registry for the huddle signaling core.
//!
//! The registry tracks room membership, fans out join/leave notifications and routes
//! negotiation envelopes point-to-point. It never inspects session descriptions or
//! candidates beyond their routing fields.

mod auth;
mod config;
mod error;
mod room;
mod signaling;

pub use auth::*;
pub use config::*;
pub use error::*;
pub use room::*;
pub use signaling::*;
