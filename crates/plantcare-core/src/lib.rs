//! Hardware-independent sensing core for plantcare
//!
//! This crate contains the platform-agnostic logic of the plant monitor:
//! the lock-free sample exchange between the acquisition task and the
//! consumer, the TEST/NORMAL mode controller, hourly statistics, alarm
//! evaluation and unit conversion. Bus-level sensor drivers and GPIO live
//! behind the collaborator traits in [`sensors`] and [`output`].
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod alarm;
pub mod app_state;
pub mod config;
pub mod mode;
pub mod output;
pub mod producer;
pub mod sample;
pub mod sensors;
pub mod state_plane;
pub mod stats;
pub mod units;
