//! Command failure taxonomy

use crate::registry::SubsystemKey;
use iris_shared::ValidationError;
use thiserror::Error;

/// Why a command did not succeed
///
/// Every variant is recovered by the dispatcher and reported to the caller as
/// a failure result carrying the variant's message.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Payload bytes are not a JSON object
    #[error("malformed payload")]
    Parse,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Operation missing from a message or not in the catalog
    #[error("unknown command")]
    UnknownOperation,

    #[error("{0} unavailable")]
    SubsystemUnavailable(SubsystemKey),

    /// Well-typed value rejected by a handler
    #[error("{0}")]
    BusinessRule(String),

    /// A subsystem call reported failure
    #[error("{0:#}")]
    Subsystem(#[from] anyhow::Error),
}

impl CommandError {
    pub fn rule(message: impl Into<String>) -> Self {
        CommandError::BusinessRule(message.into())
    }
}
