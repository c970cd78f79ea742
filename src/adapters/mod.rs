//! Infrastructure adapters. Implement outbound ports.
//!
//! Discord REST, terminal UI, and (tests only) an in-memory platform. Map errors to DomainError.

pub mod discord;
#[cfg(test)]
pub mod memory;
pub mod ui;
