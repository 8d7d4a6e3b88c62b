//! One-shot IPC client: connect, send one command, read one response.

use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use chrono::{Local, TimeDelta};
use interprocess::local_socket::{prelude::*, Stream};
use salarmd::{
    alarm::Alarm,
    protocol::{self, Command, MalformedMessage},
};
use uuid::Uuid;

/// How long to keep trying to reach the daemon before giving up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not connect to the alarm service, make sure salarmd is running")]
    ServiceUnavailable,
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedMessage),
    /// The daemon answered with an `Error:` response.
    #[error("{0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct AlarmClient {
    socket_name: String,
    connect_timeout: Duration,
}

impl Default for AlarmClient {
    fn default() -> Self {
        Self::new(protocol::SOCKET_NAME)
    }
}

impl AlarmClient {
    #[must_use]
    pub fn new(socket_name: &str) -> Self {
        Self {
            socket_name: socket_name.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// How long to keep retrying the connection before reporting
    /// [`ClientError::ServiceUnavailable`].
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Asks the daemon to schedule an alarm `duration` from now and returns
    /// it with its daemon-assigned id.
    pub fn set_alarm(
        &self,
        duration: TimeDelta,
        sound_file_path: Option<PathBuf>,
        message: Option<String>,
    ) -> Result<Alarm, ClientError> {
        let alarm = Alarm::new(Local::now() + duration, sound_file_path, message);
        let response = self.round_trip(&Command::set_alarm(alarm))?;
        Ok(protocol::decode(response.as_bytes())?)
    }

    /// Pending alarms, ordered by trigger time.
    pub fn active_alarms(&self) -> Result<Vec<Alarm>, ClientError> {
        let response = self.round_trip(&Command::get_active_alarms())?;
        Ok(protocol::decode(response.as_bytes())?)
    }

    /// True if the daemon found and cancelled the alarm.
    pub fn cancel_alarm(&self, id: Uuid) -> Result<bool, ClientError> {
        // cancel responses are literal indicator strings, not json
        let response = self.round_trip(&Command::cancel_alarm(id))?;
        Ok(response.contains("successfully"))
    }

    pub fn cancel_all_alarms(&self) -> Result<bool, ClientError> {
        let response = self.round_trip(&Command::cancel_all_alarms())?;
        Ok(response.contains("successfully"))
    }

    fn round_trip(&self, command: &Command) -> Result<String, ClientError> {
        let mut conn = self.connect()?;
        conn.write_all(protocol::encode(command)?.as_bytes())?;
        conn.flush()?;
        let response = protocol::read_chunk(&mut conn)?;
        let response = String::from_utf8_lossy(&response).into_owned();
        match response.strip_prefix(protocol::ERROR_PREFIX) {
            Some(message) => Err(ClientError::Server(message.trim().to_string())),
            None => Ok(response),
        }
    }

    /// The transport serves one client at a time, so a busy daemon shows up
    /// as a refused connection; retry until the connect timeout runs out.
    fn connect(&self) -> Result<Stream, ClientError> {
        let deadline = Instant::now() + self.connect_timeout;
        loop {
            match Stream::connect(protocol::socket_name(&self.socket_name)?) {
                Ok(conn) => return Ok(conn),
                Err(_) if Instant::now() < deadline => thread::sleep(Duration::from_millis(100)),
                Err(_) => return Err(ClientError::ServiceUnavailable),
            }
        }
    }
}
