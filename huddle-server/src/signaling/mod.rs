mod connection;
mod login_handler;
mod router;
mod signaling_service;
mod ws_handler;

pub use connection::*;
pub use login_handler::*;
pub use router::*;
pub use signaling_service::*;
pub use ws_handler::*;
