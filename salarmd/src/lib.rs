#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! The alarm scheduling service behind the `salarm` command line tool.
//!
//! The daemon owns every pending alarm, fires it at its trigger time and
//! answers one client request at a time over a local socket. The `salarm`
//! front end talks to it through [`protocol`].

pub mod alarm;
pub mod config;
pub mod duration;
pub mod notify;
pub mod protocol;
pub mod server;
pub mod store;
