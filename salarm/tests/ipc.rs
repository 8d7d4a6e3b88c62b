//! Client and daemon talking over a real local socket.

use std::{
    io::Write,
    process,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use chrono::{Local, TimeDelta};
use interprocess::local_socket::{prelude::*, Stream};
use salarm::client::{AlarmClient, ClientError};
use salarmd::{
    alarm::Alarm,
    protocol::{self, ERROR_PREFIX},
    server,
    store::{AlarmStore, Notifier},
};

#[derive(Debug, Default)]
struct CountingNotifier {
    fired: AtomicUsize,
}

impl Notifier for CountingNotifier {
    fn alarm_fired(&self, _alarm: &Alarm) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}

/// Starts a daemon on a socket name unique to this test run and returns a
/// client pointed at it. The client's connect retry covers listener startup.
fn start_daemon(tag: &str) -> (AlarmClient, Arc<CountingNotifier>) {
    let name = format!("salarm-test-{}-{tag}", process::id());
    let notifier = Arc::new(CountingNotifier::default());
    let store = Arc::new(AlarmStore::new(notifier.clone()));
    let server_name = name.clone();
    thread::spawn(move || {
        let _ = server::serve(&server_name, &store);
    });
    (AlarmClient::new(&name), notifier)
}

#[test]
fn set_list_cancel_round_trip() {
    let (client, _) = start_daemon("round-trip");

    let before = Local::now();
    let alarm = client
        .set_alarm(TimeDelta::seconds(5), None, Some("Take a break".to_string()))
        .unwrap();
    assert_eq!(alarm.message.as_deref(), Some("Take a break"));
    let offset = alarm.trigger_time - (before + TimeDelta::seconds(5));
    assert!(
        offset.abs() < TimeDelta::seconds(2),
        "trigger time drifted by {offset}"
    );

    let active = client.active_alarms().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, alarm.id);

    assert!(client.cancel_alarm(alarm.id).unwrap());
    assert!(client.active_alarms().unwrap().is_empty());
    // a second cancel is a no-op
    assert!(!client.cancel_alarm(alarm.id).unwrap());
}

#[test]
fn due_alarm_fires_and_disappears() {
    let (client, notifier) = start_daemon("fires");

    client
        .set_alarm(TimeDelta::milliseconds(100), None, None)
        .unwrap();
    thread::sleep(Duration::from_millis(500));
    assert!(client.active_alarms().unwrap().is_empty());
    assert_eq!(notifier.fired.load(Ordering::SeqCst), 1);
}

#[test]
fn cancel_all_clears_every_alarm() {
    let (client, _) = start_daemon("cancel-all");

    // succeeds even with nothing pending
    assert!(client.cancel_all_alarms().unwrap());
    for _ in 0..3 {
        client.set_alarm(TimeDelta::minutes(5), None, None).unwrap();
    }
    assert!(client.cancel_all_alarms().unwrap());
    assert!(client.active_alarms().unwrap().is_empty());
}

#[test]
fn missing_daemon_reports_service_unavailable() {
    // nothing ever listens on this name; the bounded retry must give up
    // instead of hanging
    let name = format!("salarm-test-{}-no-daemon", process::id());
    let client = AlarmClient::new(&name).with_connect_timeout(Duration::from_millis(300));
    match client.active_alarms() {
        Err(ClientError::ServiceUnavailable) => {}
        other => panic!("expected ServiceUnavailable, got {other:?}"),
    }
}

#[test]
fn server_survives_bad_requests() {
    let (client, _) = start_daemon("bad-requests");
    // make sure the listener is up before talking to it raw
    assert!(client.active_alarms().unwrap().is_empty());

    let name = format!("salarm-test-{}-bad-requests", process::id());
    for request in [&b"not json at all"[..], &br#"{"action":"snooze"}"#[..]] {
        let mut conn = Stream::connect(protocol::socket_name(&name).unwrap()).unwrap();
        conn.write_all(request).unwrap();
        conn.flush().unwrap();
        let response = protocol::read_chunk(&mut conn).unwrap();
        let response = String::from_utf8(response).unwrap();
        assert!(
            response.starts_with(ERROR_PREFIX),
            "expected an error response, got {response}"
        );
    }

    // the loop is still serving after both failures
    let alarm = client
        .set_alarm(TimeDelta::minutes(5), None, None)
        .unwrap();
    assert_eq!(client.active_alarms().unwrap()[0].id, alarm.id);
}
