//! Live HTTP clients for the two remote systems.
//!
//! Each client is an explicitly constructed object holding injected
//! endpoint configuration and an internal bearer-token session; nothing in
//! this module is global state.

pub mod ebs;
pub mod p6;
pub mod session;

pub use ebs::EbsClient;
pub use p6::P6Client;
pub use session::BearerSession;
