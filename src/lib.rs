//! discord-ttl: scheduled message retention for a Discord guild, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
