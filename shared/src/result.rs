//! Command outcomes and their wire envelope
//!
//! Every command produces a [`CommandResult`]. On the wire it is wrapped as
//! ```text
//! {"result": {"status": "success" | "failure", <data fields>}}
//! ```
//! Callers decide success solely from `result.status`. A batch request is
//! answered with `{"results": [<envelope>, ...]}` in request order.

use crate::payload::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key used for plain-text messages in result data
pub const MESSAGE_KEY: &str = "message";

/// Outcome of a single command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

/// Result of one handler invocation
///
/// Data fields are flattened next to `status` when serialized, so data must
/// not contain a `status` key of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub status: Status,
    #[serde(flatten)]
    pub data: Payload,
}

impl CommandResult {
    /// Successful result carrying `data`
    pub fn success(data: Payload) -> Self {
        debug_assert!(!data.contains_key("status"), "result data must not use the status key");
        Self {
            status: Status::Success,
            data,
        }
    }

    /// Successful result carrying only a message
    pub fn success_message(message: impl Into<String>) -> Self {
        Self::success(message_payload(message))
    }

    /// Failed result carrying a human-readable message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            data: message_payload(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// The `message` field, if the data carries one
    pub fn message(&self) -> Option<&str> {
        self.data.get(MESSAGE_KEY).and_then(Value::as_str)
    }
}

fn message_payload(message: impl Into<String>) -> Payload {
    let mut data = Payload::new();
    data.insert(MESSAGE_KEY.into(), Value::String(message.into()));
    data
}

/// Wire form of a [`CommandResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub result: CommandResult,
}

impl Envelope {
    pub fn status(&self) -> Status {
        self.result.status
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// Serialize to compact JSON bytes
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse an envelope from JSON bytes
    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

impl From<CommandResult> for Envelope {
    fn from(result: CommandResult) -> Self {
        Self { result }
    }
}

/// Answer to a batch request, one envelope per entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchEnvelope {
    pub results: Vec<Envelope>,
}

/// Answer to one line of the line protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Single(Envelope),
    Batch(BatchEnvelope),
}

impl Reply {
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Reply::Single(envelope) => envelope.to_vec(),
            Reply::Batch(batch) => serde_json::to_vec(batch),
        }
    }
}
