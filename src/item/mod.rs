//! # Item processes.
//!
//! An item process competes for the single processing slot by talking to the
//! controller through [`ItemClient`]. What it does once admitted is an [`ItemWork`].

mod client;
mod config;
mod work;

pub use client::{ItemClient, ItemOutcome, ItemReport};
pub use config::ItemConfig;
pub use work::{ItemWork, SleepWork, WorkFn};
