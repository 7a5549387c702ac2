mod connection_handle;
mod room;
mod room_command;
mod room_manager;

pub use connection_handle::*;
pub use room::*;
pub use room_command::*;
pub use room_manager::*;
