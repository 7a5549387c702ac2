pub mod flaky_connector;
pub mod test_server;

pub use flaky_connector::*;
pub use mock_connector::*;
pub use mock_transport::*;
pub use test_server::*;
