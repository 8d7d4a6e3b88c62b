//! The daemon's notifier: prints the alarm message and plays its sound.
//!
//! All audio failures degrade to the built-in alert tone (or to a logged
//! warning when no output device exists); a bad sound file never loses the
//! visible notification and never reaches the scheduler.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf, thread, time::Duration};

use rodio::{source::SineWave, Decoder, OutputStreamBuilder, Sink, Source};

use crate::{
    alarm::{Alarm, DEFAULT_MESSAGE},
    store::Notifier,
};

const TONE_FREQUENCY_HZ: f32 = 880.0;
const TONE_DURATION: Duration = Duration::from_secs(3);

/// Shows fired alarms on the daemon's console and plays their sound through
/// the default audio output.
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    /// played when an alarm has no sound of its own
    default_sound: Option<PathBuf>,
}

impl DesktopNotifier {
    #[must_use]
    pub const fn new(default_sound: Option<PathBuf>) -> Self {
        Self { default_sound }
    }
}

impl Notifier for DesktopNotifier {
    fn alarm_fired(&self, alarm: &Alarm) {
        let message = alarm.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
        println!(
            "[{}] {message}",
            alarm.trigger_time.format("%Y-%m-%d %H:%M:%S")
        );
        log::info!("alarm {} fired: {message}", alarm.id);

        let sound = alarm
            .sound_file_path
            .clone()
            .or_else(|| self.default_sound.clone());
        // playback blocks until the sound finishes, keep it off the
        // scheduler thread
        thread::spawn(move || play_alert(sound.as_deref()));
    }
}

fn play_alert(sound: Option<&Path>) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("no audio output available: {e}");
            return;
        }
    };
    let sink = Sink::connect_new(stream.mixer());
    if !sound.is_some_and(|path| append_file(&sink, path)) {
        sink.append(default_tone());
    }
    sink.play();
    sink.sleep_until_end();
}

/// Queues the sound file on the sink; false if it cannot be opened or
/// decoded, in which case the caller falls back to the default tone.
fn append_file(sink: &Sink, path: &Path) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log::warn!("couldn't open sound file {}: {e}", path.display());
            return false;
        }
    };
    match Decoder::new(BufReader::new(file)) {
        Ok(source) => {
            sink.append(source);
            true
        }
        Err(e) => {
            log::warn!("couldn't decode sound file {}: {e}", path.display());
            false
        }
    }
}

fn default_tone() -> impl Source + Send + 'static {
    SineWave::new(TONE_FREQUENCY_HZ)
        .take_duration(TONE_DURATION)
        .amplify(0.4)
}
