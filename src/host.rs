//! The narrow interface between the interpreter core and the outside world:
//! program output, diagnostics and the clock read by `clock()`.

use std::io::{self, Write};

use chrono::{Local, Timelike};
use log::{debug, warn};

pub trait Host {
    /// Output of a `print` statement, already stringified.
    fn print(&mut self, text: &str);

    /// A compile‑time (scan, parse or resolve) diagnostic.
    fn error(&mut self, line: usize, location: Option<&str>, message: &str);

    /// An uncaught runtime error.
    fn runtime_error(&mut self, message: &str, line: usize);

    /// Fractional seconds since an implementation‑defined epoch.
    fn clock(&self) -> f64;
}

/// Console host: `print` to stdout, diagnostics to stderr, local wall clock.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl Host for ConsoleHost {
    fn print(&mut self, text: &str) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{}", text) {
            warn!("Failed to write program output: {}", e);
        }
    }

    fn error(&mut self, line: usize, location: Option<&str>, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location.unwrap_or(""), message);
    }

    fn runtime_error(&mut self, message: &str, line: usize) {
        eprintln!("{}\n[line {}]", message, line);
    }

    /// Seconds since local midnight, with sub‑second precision.
    fn clock(&self) -> f64 {
        let now = Local::now();
        let seconds = now.num_seconds_from_midnight() as f64
            + f64::from(now.nanosecond() % 1_000_000_000) / 1e9;

        debug!("clock() read {}", seconds);

        seconds
    }
}
