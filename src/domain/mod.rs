//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod permissions;
pub mod retention;

pub use entities::{BotIdentity, Channel, ChannelKind, Message};
pub use errors::DomainError;
pub use permissions::{
    PermissionResult, Permissions, RequiredPermission, check_channel_permissions,
};
pub use retention::{
    BULK_DELETE_MAX_AGE, RetentionPolicy, SweepConfig, is_bulk_deletable, is_older_than,
};
