#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core measurement logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent sag meter. All device
//! interactions go through `sag_traits::Sensor` and `sag_traits::Panel`;
//! the network layer talks to it only through `link::LinkEvent`.
//!
//! ## Architecture
//!
//! - **Filtering**: fixed-window moving average over raw readings (`filter`)
//! - **Calibration**: two-anchor linear map from filtered raw to length (`calibration`)
//! - **Capture**: max / static / dynamic snapshots driven by commands (`state`)
//! - **Scheduling**: three independent periodic tasks on one thread (`scheduler`)
//! - **Link**: single-client handoff from network threads (`link`)
//! - **Loop**: `Instrument::step` is one deterministic tick; `runner::run` drives it

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod link;
pub mod mocks;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod status;

pub use builder::{Instrument, InstrumentBuilder, Missing, Set, build_instrument};
pub use calibration::Calibration;
pub use config::{DisplayCfg, FilterCfg, ScheduleCfg};
pub use error::{BuildError, SagError};
pub use filter::SampleFilter;
pub use link::{BroadcastOutcome, ClientId, LinkEvent};
pub use scheduler::{Due, Scheduler, Task};
pub use state::{Command, CommandEvent, SagState, Snapshot};
pub use status::{StepReport, Stats};
