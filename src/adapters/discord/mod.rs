//! Discord REST adapter. Session bootstrap, wire models, mapping, gateway.

pub mod client;
pub mod mapper;
pub mod models;
pub mod session;

pub use client::DiscordRestGateway;
pub use session::{DEFAULT_API_BASE, DiscordSession};
