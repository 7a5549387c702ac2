mod authenticator;
mod otp_store;

pub use authenticator::*;
pub use otp_store::*;
