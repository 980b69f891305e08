#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Presentation adapters: the local display panels and the browser link.

pub mod panel;
pub mod web;

pub use panel::{LogPanel, TerminalPanel};
pub use web::{WebCfg, WebServer};
