//! The request loop: one client, one request, one response, then back to
//! listening. A failed request becomes an `Error:` response (or a logged
//! connection error) and never takes the loop down.

use std::io::{self, Write};

use chrono::Local;
use interprocess::local_socket::{prelude::*, ListenerOptions, Stream};

use crate::{
    protocol::{
        self, action, Command, MalformedMessage, ALL_CANCELLED_RESPONSE, CANCELLED_RESPONSE,
        ERROR_PREFIX, NOT_FOUND_RESPONSE,
    },
    store::AlarmStore,
};

#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error(transparent)]
    Malformed(#[from] MalformedMessage),
    #[error("No alarm data provided")]
    MissingAlarm,
    #[error("No alarm ID provided")]
    MissingAlarmId,
    #[error("Unknown command")]
    Unsupported,
}

/// Accepts connections on `name` and serves them sequentially until the
/// process exits. Fails early only if the listener itself cannot be created.
pub fn serve(name: &str, store: &AlarmStore) -> io::Result<()> {
    let opts = ListenerOptions::new().name(protocol::socket_name(name)?);
    let listener = match opts.create_sync() {
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            log::error!("socket {name} is already in use, is another salarmd running?");
            return Err(e);
        }
        x => x?,
    };
    log::info!("listening on {name}");

    for conn in listener.incoming() {
        let mut conn = match conn {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("incoming connection failed: {e}");
                continue;
            }
        };
        if let Err(e) = handle_client(&mut conn, store) {
            log::warn!("client connection error: {e}");
        }
    }
    Ok(())
}

fn handle_client(conn: &mut Stream, store: &AlarmStore) -> io::Result<()> {
    let request = protocol::read_chunk(conn)?;
    let response =
        handle_request(&request, store).unwrap_or_else(|e| format!("{ERROR_PREFIX} {e}"));
    conn.write_all(response.as_bytes())?;
    conn.flush()
}

fn handle_request(request: &[u8], store: &AlarmStore) -> Result<String, RequestError> {
    let command: Command = protocol::decode(request)?;
    log::info!("handling '{}' request", command.action);
    match command.action.to_lowercase().as_str() {
        action::SET_ALARM | action::ADD => {
            let alarm = command.alarm.ok_or(RequestError::MissingAlarm)?;
            let duration = alarm.trigger_time - Local::now();
            let created = store.set_alarm(duration, alarm.sound_file_path, alarm.message);
            Ok(protocol::encode(&created)?)
        }
        action::GET_ACTIVE_ALARMS | action::LIST => Ok(protocol::encode(&store.active_alarms())?),
        action::CANCEL_ALARM | action::REMOVE => {
            let id = command.alarm_id.ok_or(RequestError::MissingAlarmId)?;
            Ok(if store.cancel_alarm(id) {
                CANCELLED_RESPONSE.to_string()
            } else {
                NOT_FOUND_RESPONSE.to_string()
            })
        }
        action::CANCEL_ALL_ALARMS => {
            store.cancel_all_alarms();
            Ok(ALL_CANCELLED_RESPONSE.to_string())
        }
        _ => Err(RequestError::Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::handle_request;
    use crate::{
        alarm::Alarm,
        protocol::{self, Command, CANCELLED_RESPONSE, NOT_FOUND_RESPONSE},
        store::{AlarmStore, Notifier},
    };
    use chrono::{Local, TimeDelta};
    use std::sync::Arc;
    use uuid::Uuid;

    #[derive(Debug)]
    struct NullNotifier;

    impl Notifier for NullNotifier {
        fn alarm_fired(&self, _alarm: &Alarm) {}
    }

    fn store() -> AlarmStore {
        AlarmStore::new(Arc::new(NullNotifier))
    }

    fn request(store: &AlarmStore, command: &Command) -> Result<String, String> {
        handle_request(protocol::encode(command).unwrap().as_bytes(), store)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn set_alarm_returns_the_created_alarm() {
        let store = store();
        let requested = Alarm::new(
            Local::now() + TimeDelta::minutes(5),
            None,
            Some("stretch".to_string()),
        );
        let response = request(&store, &Command::set_alarm(requested.clone())).unwrap();
        let created: Alarm = protocol::decode(response.as_bytes()).unwrap();
        // the daemon assigns a fresh id
        assert_ne!(created.id, requested.id);
        assert_eq!(created.message, requested.message);
        assert_eq!(store.active_alarms(), vec![created]);
    }

    #[test]
    fn list_returns_active_alarms_as_json() {
        let store = store();
        let alarm = store.set_alarm(TimeDelta::minutes(5), None, None);
        let response = request(&store, &Command::get_active_alarms()).unwrap();
        let listed: Vec<Alarm> = protocol::decode(response.as_bytes()).unwrap();
        assert_eq!(listed, vec![alarm]);
    }

    #[test]
    fn cancel_reports_found_and_not_found() {
        let store = store();
        let alarm = store.set_alarm(TimeDelta::minutes(5), None, None);
        let response = request(&store, &Command::cancel_alarm(alarm.id)).unwrap();
        assert_eq!(response, CANCELLED_RESPONSE);
        let response = request(&store, &Command::cancel_alarm(alarm.id)).unwrap();
        assert_eq!(response, NOT_FOUND_RESPONSE);
        assert_eq!(
            request(&store, &Command::cancel_alarm(Uuid::new_v4())).unwrap(),
            NOT_FOUND_RESPONSE
        );
    }

    #[test]
    fn action_matching_is_case_insensitive_and_accepts_aliases() {
        let store = store();
        let mut command = Command::get_active_alarms();
        command.action = "GetActiveAlarms".to_string();
        assert!(request(&store, &command).is_ok());
        command.action = "list".to_string();
        assert!(request(&store, &command).is_ok());
    }

    #[test]
    fn unknown_action_is_an_error_not_a_crash() {
        let store = store();
        let mut command = Command::get_active_alarms();
        command.action = "snooze".to_string();
        assert_eq!(request(&store, &command), Err("Unknown command".to_string()));
    }

    #[test]
    fn missing_payloads_are_reported() {
        let store = store();
        let mut command = Command::set_alarm(Alarm::new(Local::now(), None, None));
        command.alarm = None;
        assert_eq!(
            request(&store, &command),
            Err("No alarm data provided".to_string())
        );
        let mut command = Command::cancel_alarm(Uuid::nil());
        command.alarm_id = None;
        assert_eq!(
            request(&store, &command),
            Err("No alarm ID provided".to_string())
        );
    }

    #[test]
    fn malformed_requests_are_reported() {
        let store = store();
        let result = handle_request(b"not json", &store);
        assert!(result.unwrap_err().to_string().starts_with("malformed"));
    }
}
