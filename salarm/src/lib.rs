#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! Client-side pieces of the `salarm` command line tool: the IPC client plus
//! the id-matching and time-formatting helpers the front end prints with.

use chrono::TimeDelta;
use salarmd::alarm::{Alarm, MAX_MESSAGE_LEN};

pub mod client;

/// The message exceeds [`MAX_MESSAGE_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("message cannot be longer than {MAX_MESSAGE_LEN} characters")]
pub struct MessageTooLong;

/// Checks the message length limit before a request reaches the daemon.
pub fn validate_message(message: Option<&str>) -> Result<(), MessageTooLong> {
    if message.is_some_and(|message| message.chars().count() > MAX_MESSAGE_LEN) {
        Err(MessageTooLong)
    } else {
        Ok(())
    }
}

/// Alarms whose id starts with `partial`, compared case-insensitively
/// against both the hyphenated and the separator-free rendering.
#[must_use]
pub fn matching_alarms<'a>(alarms: &'a [Alarm], partial: &str) -> Vec<&'a Alarm> {
    let partial = partial.to_lowercase();
    alarms
        .iter()
        .filter(|alarm| {
            alarm.id.to_string().starts_with(&partial)
                || alarm.id.simple().to_string().starts_with(&partial)
        })
        .collect()
}

/// Renders a remaining duration the way `salarm list` shows it, e.g.
/// `1d 2h 3m`. Seconds only show up under an hour; a past duration is
/// `Overdue`.
#[must_use]
pub fn format_remaining(remaining: TimeDelta) -> String {
    if remaining < TimeDelta::zero() {
        return "Overdue".to_string();
    }
    let total_seconds = remaining.num_seconds();
    let (days, hours, minutes, seconds) = (
        total_seconds / 86400,
        total_seconds % 86400 / 3600,
        total_seconds % 3600 / 60,
        total_seconds % 60,
    );
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 && total_seconds < 3600 {
        parts.push(format!("{seconds}s"));
    }
    if parts.is_empty() {
        "Less than 1s".to_string()
    } else {
        parts.join(" ")
    }
}
