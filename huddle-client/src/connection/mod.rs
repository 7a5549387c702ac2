mod connection_manager;
mod outbound_queue;

pub use connection_manager::*;
pub use outbound_queue::*;
