mod connector;
mod token_provider;
mod ws_connector;

pub use connector::*;
pub use token_provider::*;
pub use ws_connector::*;
