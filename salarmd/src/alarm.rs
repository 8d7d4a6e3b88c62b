use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// longest message text accepted for an alarm, enforced by the client before
/// a request reaches the daemon
pub const MAX_MESSAGE_LEN: usize = 500;

/// message shown when an alarm was set without one
pub const DEFAULT_MESSAGE: &str = "Alarm!";

/// A one-shot alarm.
///
/// Only the store mutates an alarm after creation: firing flips
/// `is_triggered` and drops it from the active set in the same step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: Uuid,
    pub trigger_time: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub is_triggered: bool,
}

impl Alarm {
    #[must_use]
    pub fn new(
        trigger_time: DateTime<Local>,
        sound_file_path: Option<PathBuf>,
        message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_time,
            sound_file_path,
            message,
            is_triggered: false,
        }
    }
}
