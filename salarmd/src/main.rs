#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms, missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use salarmd::{config::Config, notify::DesktopNotifier, server, store::AlarmStore};

fn main() -> std::io::Result<()> {
    // initilize the logger
    simple_file_logger::init_logger!("salarmd").expect("couldn't initialize logger");

    let config = Config::load();
    let notifier = Arc::new(DesktopNotifier::new(config.default_sound.clone()));
    let store = AlarmStore::new(notifier);

    eprintln!("Server running at {}", config.socket_name);
    server::serve(&config.socket_name, &store)
}
