//! Cross-cutting application concerns.

pub mod config;
