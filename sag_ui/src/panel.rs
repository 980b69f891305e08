//! `Panel` implementations for a terminal and for the log.

use std::io::{self, Write};

use sag_traits::Panel;

/// Clear screen and home the cursor.
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Redraws the rows in place on an ANSI terminal.
///
/// Each frame is composed in memory and written with a single `write_all`,
/// so a reader never sees a half-drawn frame.
#[derive(Debug)]
pub struct TerminalPanel<W: Write = io::Stdout> {
    out: W,
    buf: String,
}

impl TerminalPanel<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPanel<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: String::with_capacity(128),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn compose(&mut self, rows: &[String]) {
        self.buf.clear();
        self.buf.push_str(CLEAR);
        for row in rows {
            self.buf.push_str(row);
            self.buf.push('\n');
        }
    }
}

impl<W: Write> Panel for TerminalPanel<W> {
    fn draw(&mut self, rows: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.compose(rows);
        self.out.write_all(self.buf.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Emits each frame as one `info` event; for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPanel;

impl Panel for LogPanel {
    fn draw(&mut self, rows: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(target: "sag::display", frame = %rows.join(" | "), "display");
        Ok(())
    }
}
