//! Liveness indicator: a blinking output whose period shows connectivity.
//!
//! Slow blink (1 s) while the gate is set, fast blink (250 ms) otherwise.

use crate::connectivity::GateSignal;
use crate::output::OutputLine;
use log::{info, warn};
use std::time::Duration;

/// Blink half-period while the node holds an address.
pub const CONNECTED_BLINK: Duration = Duration::from_millis(1000);

/// Blink half-period while the node is offline.
pub const DISCONNECTED_BLINK: Duration = Duration::from_millis(250);

/// Sleep between toggles for a given gate state.
pub fn blink_interval(gate_set: bool) -> Duration {
    if gate_set {
        CONNECTED_BLINK
    } else {
        DISCONNECTED_BLINK
    }
}

/// Toggles an output forever at a gate-dependent rate.
pub struct LivenessIndicator<O> {
    output: O,
    level: bool,
    gate: GateSignal,
    failing: bool,
}

impl<O: OutputLine> LivenessIndicator<O> {
    /// Drive `output` according to `gate`.
    pub fn new(output: O, gate: GateSignal) -> Self {
        let level = output.level();
        Self {
            output,
            level,
            gate,
            failing: false,
        }
    }

    /// Toggle the output once and return how long to sleep.
    ///
    /// A failed write is skipped and the loop keeps its cadence. Only the
    /// first failure of a streak and the recovery are logged.
    pub fn tick(&mut self) -> Duration {
        let next = !self.level;
        match self.output.set_level(next) {
            Ok(()) => {
                self.level = next;
                if self.failing {
                    info!("Indicator output recovered");
                    self.failing = false;
                }
            }
            Err(e) => {
                if !self.failing {
                    warn!("Indicator output failed: {}", e);
                    self.failing = true;
                }
            }
        }
        blink_interval(self.gate.is_set())
    }

    /// Blink forever.
    pub fn run(mut self) -> ! {
        loop {
            let interval = self.tick();
            std::thread::sleep(interval);
        }
    }
}
