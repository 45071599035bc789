//! Self-describing command messages
//!
//! Transports that cannot pre-select an operation (a serial line, a raw TCP
//! stream) carry messages of the form
//! ```text
//! {"command": "set_device_mode", "data": {"mode": 1}}
//! ```
//! When `data` is absent, every field other than `command` is the payload.
//! A line may also carry several messages as `{"commands": [...]}`.

use crate::operation::{OperationId, UnknownOperation};
use crate::payload::Payload;
use serde_json::Value;

/// Key naming the operation in a self-describing message
pub const COMMAND_KEY: &str = "command";

/// Key carrying the nested payload
pub const DATA_KEY: &str = "data";

/// Key holding the messages of a batch request
pub const COMMANDS_KEY: &str = "commands";

/// One line of the line protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// A single self-describing message
    Single(Payload),
    /// Entries of a `{"commands": [...]}` batch, each handled on its own
    Batch(Vec<Value>),
}

impl Request {
    /// Classify a parsed line
    ///
    /// Only a document without `command` whose `commands` is an array is a
    /// batch; anything else is treated as a single message.
    pub fn from_payload(mut doc: Payload) -> Self {
        if !doc.contains_key(COMMAND_KEY) {
            if let Some(Value::Array(items)) = doc.get_mut(COMMANDS_KEY) {
                return Self::Batch(std::mem::take(items));
            }
        }
        Self::Single(doc)
    }
}

/// A command split into its identifier and payload
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMessage {
    pub command: OperationId,
    pub data: Payload,
}

/// Why a parsed document could not be turned into a [`CommandMessage`]
#[derive(Debug, Clone, PartialEq)]
pub enum MessageError {
    /// `command` missing, not a string, or not a known operation
    Unknown(Option<UnknownOperation>),
    /// `data` present but not an object
    MalformedData,
}

impl CommandMessage {
    pub fn new(command: OperationId, data: Payload) -> Self {
        Self { command, data }
    }

    /// Split a parsed document into operation and payload
    pub fn from_payload(mut doc: Payload) -> Result<Self, MessageError> {
        let command = match doc.remove(COMMAND_KEY) {
            Some(Value::String(name)) => name
                .parse::<OperationId>()
                .map_err(|e| MessageError::Unknown(Some(e)))?,
            _ => return Err(MessageError::Unknown(None)),
        };

        let data = match doc.remove(DATA_KEY) {
            Some(Value::Object(data)) => data,
            Some(_) => return Err(MessageError::MalformedData),
            None => doc,
        };

        Ok(Self { command, data })
    }

    /// Serialize as a single JSON document
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut doc = Payload::new();
        doc.insert(COMMAND_KEY.into(), Value::String(self.command.as_str().into()));
        if !self.data.is_empty() {
            doc.insert(DATA_KEY.into(), Value::Object(self.data.clone()));
        }
        serde_json::to_vec(&doc)
    }
}
