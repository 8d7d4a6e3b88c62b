#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms, missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

use std::{error::Error, path::PathBuf, process::ExitCode};

use chrono::Local;
use clap::{Parser, Subcommand};
use salarm::{client::AlarmClient, format_remaining, matching_alarms, validate_message};
use salarmd::{alarm::Alarm, duration::parse_duration};

#[derive(Parser)]
#[command(author, version, about = "Set, list, and cancel timed alarms", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
    /// Time until the alarm fires, e.g. 5s, 10m, 2h, 1d, or 4h2m
    #[clap(short, long)]
    time: Option<String>,
    /// Sound file to play when the alarm fires
    #[clap(short, long)]
    file: Option<PathBuf>,
    /// Message to display (max 500 characters)
    #[clap(short, long)]
    message: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Show pending alarms
    List,
    /// Cancel an alarm by its id or a unique prefix of it
    Cancel { id: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let client = AlarmClient::default();
    let result = match args.command {
        Some(Command::List) => list_alarms(&client),
        Some(Command::Cancel { id }) => cancel_alarm(&client, &id),
        None => set_alarm(&client, args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn set_alarm(client: &AlarmClient, args: Args) -> Result<(), Box<dyn Error>> {
    let Some(time) = args.time else {
        return Err("time parameter (-t) is required, see --help".into());
    };
    // validated here so a bad request never reaches the daemon
    validate_message(args.message.as_deref())?;
    let duration = parse_duration(&time)?;
    let alarm = client.set_alarm(duration, args.file, args.message)?;
    println!("Alarm set successfully (ID: {})", alarm.id);
    Ok(())
}

fn list_alarms(client: &AlarmClient) -> Result<(), Box<dyn Error>> {
    let alarms = client.active_alarms()?;
    if alarms.is_empty() {
        println!("No pending alarms.");
        return Ok(());
    }
    println!("Pending alarms:");
    println!("================");
    for alarm in &alarms {
        println!("ID: {}", alarm.id);
        println!(
            "  Trigger Time: {}",
            alarm.trigger_time.format("%Y-%m-%d %H:%M:%S")
        );
        println!(
            "  Time Remaining: {}",
            format_remaining(alarm.trigger_time - Local::now())
        );
        if let Some(message) = &alarm.message {
            println!("  Message: {message}");
        }
        if let Some(path) = &alarm.sound_file_path {
            println!("  Sound File: {}", path.display());
        }
        println!();
    }
    Ok(())
}

fn cancel_alarm(client: &AlarmClient, partial: &str) -> Result<(), Box<dyn Error>> {
    let alarms = client.active_alarms()?;
    if alarms.is_empty() {
        println!("No pending alarms to cancel.");
        return Ok(());
    }
    match matching_alarms(&alarms, partial).as_slice() {
        [] => {
            println!("No alarm found with ID starting with '{partial}'.");
            println!("Use 'salarm list' to see all pending alarms.");
        }
        [alarm] => {
            if client.cancel_alarm(alarm.id)? {
                println!("Alarm cancelled successfully (ID: {})", alarm.id);
                if let Some(message) = &alarm.message {
                    println!("Message: {message}");
                }
            } else {
                // it fired or was cancelled since we listed it
                println!("Failed to cancel alarm.");
            }
        }
        candidates => {
            println!("Multiple alarms found starting with '{partial}':");
            println!("Please be more specific. Matching alarms:");
            for alarm in candidates {
                println!(
                    "  {} - {} ({} remaining)",
                    alarm.id,
                    describe(alarm),
                    format_remaining(alarm.trigger_time - Local::now())
                );
            }
        }
    }
    Ok(())
}

fn describe(alarm: &Alarm) -> &str {
    alarm.message.as_deref().unwrap_or("no message")
}
