//! Iris Shared Protocol Types
//!
//! This crate provides the command protocol types and line codec used by the
//! camera device firmware and the host-side tooling that talks to it.

pub mod catalog;
pub mod codec;
pub mod message;
pub mod operation;
pub mod payload;
pub mod result;

// Re-export commonly used types at crate root
pub use catalog::{FieldSpec, FieldType, ValidationError};
pub use message::{CommandMessage, Request};
pub use operation::{OperationId, UnknownOperation};
pub use payload::{Payload, PayloadExt};
pub use result::{BatchEnvelope, CommandResult, Envelope, Reply, Status};

/// Protocol limits and timings shared by device and host
pub mod limits {
    /// Line buffer bound; a line is flushed when it reaches this size
    pub const LINE_BUFFER_SIZE: usize = 1024;

    /// Delay before a requested restart is carried out
    pub const RESTART_DELAY_MS: u64 = 2000;

    /// Delay before streaming is activated from a command context
    pub const STREAMING_DELAY_MS: u64 = 150;

    /// Default Wi-Fi scan timeout when the caller gives none
    pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 15_000;

    /// Lowest port accepted for OTA updates
    pub const MIN_OTA_PORT: i64 = 82;
}
