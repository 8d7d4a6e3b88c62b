//! Wire format shared by the daemon and the command line client.
//!
//! One request and one response per connection, each a single UTF-8 JSON
//! document written in one chunk. A response starting with [`ERROR_PREFIX`]
//! carries a human-readable failure instead of a value; cancel responses are
//! literal indicator strings rather than JSON.

use std::io;

use interprocess::local_socket::{prelude::*, GenericFilePath, GenericNamespaced, Name};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::alarm::Alarm;

/// Well-known local channel name shared by client and server.
pub const SOCKET_NAME: &str = "salarm_pipe";

/// A response starting with this marks a failure; the rest is the message.
pub const ERROR_PREFIX: &str = "Error:";

/// A whole message fits in one chunk of this size.
pub const MAX_MESSAGE_BYTES: usize = 4096;

pub const CANCELLED_RESPONSE: &str = "Alarm cancelled successfully";
pub const NOT_FOUND_RESPONSE: &str = "Alarm not found";
pub const ALL_CANCELLED_RESPONSE: &str = "All alarms cancelled successfully";

/// Action tags. The short aliases are accepted too.
pub mod action {
    pub const SET_ALARM: &str = "setalarm";
    pub const ADD: &str = "add";
    pub const GET_ACTIVE_ALARMS: &str = "getactivealarms";
    pub const LIST: &str = "list";
    pub const CANCEL_ALARM: &str = "cancelalarm";
    pub const REMOVE: &str = "remove";
    pub const CANCEL_ALL_ALARMS: &str = "cancelallalarms";
}

/// The request envelope: an action tag plus its payload, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm: Option<Alarm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<Uuid>,
}

impl Command {
    #[must_use]
    pub fn set_alarm(alarm: Alarm) -> Self {
        Self {
            action: action::SET_ALARM.to_string(),
            alarm: Some(alarm),
            alarm_id: None,
        }
    }

    #[must_use]
    pub fn get_active_alarms() -> Self {
        Self {
            action: action::GET_ACTIVE_ALARMS.to_string(),
            alarm: None,
            alarm_id: None,
        }
    }

    #[must_use]
    pub fn cancel_alarm(alarm_id: Uuid) -> Self {
        Self {
            action: action::CANCEL_ALARM.to_string(),
            alarm: None,
            alarm_id: Some(alarm_id),
        }
    }

    #[must_use]
    pub fn cancel_all_alarms() -> Self {
        Self {
            action: action::CANCEL_ALL_ALARMS.to_string(),
            alarm: None,
            alarm_id: None,
        }
    }
}

/// A byte sequence that does not decode as the expected message.
#[derive(Debug, thiserror::Error)]
#[error("malformed message: {0}")]
pub struct MalformedMessage(#[from] serde_json::Error);

pub fn encode<T: Serialize>(value: &T) -> Result<String, MalformedMessage> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MalformedMessage> {
    serde_json::from_slice(bytes).map_err(Into::into)
}

/// Reads one message chunk, retrying interrupted reads. An empty result means
/// the peer closed the connection without sending anything.
pub fn read_chunk<R: io::Read>(conn: &mut R) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0_u8; MAX_MESSAGE_BYTES];
    let read = loop {
        match conn.read(&mut buffer) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    };
    buffer.truncate(read);
    Ok(buffer)
}

/// Resolves the channel name, preferring the namespaced form where the
/// platform supports it.
pub fn socket_name(name: &str) -> io::Result<Name<'static>> {
    if GenericNamespaced::is_supported() {
        format!("{name}.sock").to_ns_name::<GenericNamespaced>()
    } else {
        format!("/tmp/{name}.sock").to_fs_name::<GenericFilePath>()
    }
}
