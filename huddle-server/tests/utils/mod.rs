pub mod test_server;
pub mod ws_client;

pub use test_server::*;
pub use ws_client::*;
