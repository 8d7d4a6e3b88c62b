//! The alarm store: the single owner of every pending alarm and the armed
//! timer behind it.
//!
//! One mutex guards the active set and the deadline heap together, so a
//! cancellation and a firing can never both win for the same alarm. A
//! dedicated scheduler thread sleeps until the nearest deadline (or a re-arm
//! signal after any mutation), then fires whatever is due. The notifier runs
//! after the lock is released since it may block on audio playback.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    thread,
};

use chrono::{DateTime, Local, TimeDelta};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use uuid::Uuid;

use crate::alarm::{Alarm, DEFAULT_MESSAGE};

/// What the store calls into when an alarm fires. Implemented outside the
/// core so it carries no presentation or audio dependency of its own.
pub trait Notifier: Send + Sync + 'static {
    /// Called once per fired alarm, off the request path and without the
    /// store's lock held.
    fn alarm_fired(&self, alarm: &Alarm);
}

#[derive(Debug, Default)]
struct State {
    active: HashMap<Uuid, Alarm>,
    deadlines: BinaryHeap<Reverse<(DateTime<Local>, Uuid)>>,
}

/// In-memory registry of pending alarms plus their armed timers.
#[derive(Debug)]
pub struct AlarmStore {
    state: Arc<Mutex<State>>,
    rearm: Sender<()>,
}

impl AlarmStore {
    /// Creates the store and spawns its scheduler thread. The thread exits
    /// when the store is dropped.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let state = Arc::new(Mutex::new(State::default()));
        let (rearm, signals) = crossbeam_channel::unbounded();
        let scheduler_state = Arc::clone(&state);
        thread::Builder::new()
            .name("alarm-scheduler".to_string())
            .spawn(move || run_scheduler(&scheduler_state, &signals, notifier.as_ref()))
            .expect("couldn't spawn the scheduler thread");
        Self { state, rearm }
    }

    /// Registers an alarm firing `duration` from now and arms its timer.
    /// A zero or negative duration fires as soon as the scheduler wakes.
    pub fn set_alarm(
        &self,
        duration: TimeDelta,
        sound_file_path: Option<PathBuf>,
        message: Option<String>,
    ) -> Alarm {
        let message = message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
        let alarm = Alarm::new(Local::now() + duration, sound_file_path, Some(message));
        {
            let mut state = self.lock();
            state.active.insert(alarm.id, alarm.clone());
            state.deadlines.push(Reverse((alarm.trigger_time, alarm.id)));
        }
        self.signal_rearm();
        alarm
    }

    /// Alarms not yet triggered or cancelled, ordered by trigger time.
    #[must_use]
    pub fn active_alarms(&self) -> Vec<Alarm> {
        let mut alarms: Vec<_> = self.lock().active.values().cloned().collect();
        alarms.sort_by_key(|alarm| alarm.trigger_time);
        alarms
    }

    /// Disarms and removes the alarm. Returns false if no active alarm has
    /// that id, including when it already fired or was already cancelled.
    pub fn cancel_alarm(&self, id: Uuid) -> bool {
        // the heap entry goes stale; the scheduler prunes it the next time
        // it looks for a deadline
        let removed = self.lock().active.remove(&id).is_some();
        if removed {
            self.signal_rearm();
        }
        removed
    }

    /// Disarms and removes every active alarm. Succeeds even on an empty set.
    pub fn cancel_all_alarms(&self) -> bool {
        {
            let mut state = self.lock();
            state.active.clear();
            state.deadlines.clear();
        }
        self.signal_rearm();
        true
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("alarm store lock poisoned")
    }

    #[cfg(test)]
    fn armed_timers(&self) -> usize {
        self.lock().deadlines.len()
    }

    fn signal_rearm(&self) {
        // fails only once the scheduler has shut down
        let _ = self.rearm.send(());
    }
}

fn run_scheduler(state: &Mutex<State>, signals: &Receiver<()>, notifier: &dyn Notifier) {
    loop {
        let wait = match next_deadline(state) {
            Some(at) => {
                let now = Local::now();
                match (at - now).to_std() {
                    Ok(until_due) => signals.recv_timeout(until_due),
                    // already due (or overdue, for zero/negative durations)
                    Err(_) => {
                        fire_due(state, notifier, now);
                        continue;
                    }
                }
            }
            None => match signals.recv() {
                Ok(()) => continue,
                Err(_) => break,
            },
        };
        match wait {
            // a mutation changed the nearest deadline; re-evaluate
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// The earliest deadline still backing an active alarm. Entries whose alarm
/// was cancelled are dropped here so set/cancel churn neither grows the heap
/// nor wakes the scheduler for nothing.
fn next_deadline(state: &Mutex<State>) -> Option<DateTime<Local>> {
    let mut state = state.lock().expect("alarm store lock poisoned");
    while let Some(Reverse((at, id))) = state.deadlines.peek().copied() {
        if state.active.contains_key(&id) {
            return Some(at);
        }
        state.deadlines.pop();
    }
    None
}

fn fire_due(state: &Mutex<State>, notifier: &dyn Notifier, now: DateTime<Local>) {
    let mut fired = Vec::new();
    {
        let mut state = state.lock().expect("alarm store lock poisoned");
        while let Some(Reverse((at, id))) = state.deadlines.peek().copied() {
            if at > now {
                break;
            }
            state.deadlines.pop();
            // a cancelled alarm leaves a stale heap entry behind; removal
            // from the active set here is what makes firing win the race
            if let Some(mut alarm) = state.active.remove(&id) {
                alarm.is_triggered = true;
                fired.push(alarm);
            }
        }
    }
    for alarm in &fired {
        notifier.alarm_fired(alarm);
    }
}
