//! Binary output lines (LEDs).
//!
//! - [`gpio`] - ESP-IDF `PinDriver` output (ESP32 only)
//! - [`MemoryOutput`] - in-memory line for the host build and tests

#[cfg(feature = "esp32")]
mod gpio;

#[cfg(feature = "esp32")]
pub use gpio::GpioOutput;

use log::trace;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A named output line with a binary level.
pub trait OutputLine: Send {
    /// Drive the line high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool) -> Result<(), OutputError>;

    /// Last level driven onto the line.
    fn level(&self) -> bool;
}

/// Output line kept in memory.
///
/// Clones share the same level so tests (and the host binary) can watch a
/// line that has been moved into a resource or the indicator loop.
#[derive(Debug, Clone)]
pub struct MemoryOutput {
    name: &'static str,
    level: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryOutput {
    /// Create a line that starts low.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            level: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of successful `set_level` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl OutputLine for MemoryOutput {
    fn set_level(&mut self, high: bool) -> Result<(), OutputError> {
        trace!("{} -> {}", self.name, if high { "high" } else { "low" });
        self.level.store(high, Ordering::Release);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

/// Errors from driving an output line.
#[derive(Debug)]
pub enum OutputError {
    /// Pin driver rejected the request.
    Gpio(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(msg) => write!(f, "GPIO error: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}
