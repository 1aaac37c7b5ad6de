//! # Round-Robin Scheduler
//!
//! The top-level cooperative task. The main loop resumes it exactly once
//! per iteration, whether or not the PLC is running; it then advances the
//! housekeeping tasks in a fixed three-step rotation:
//!
//! ```text
//!   iteration n   : blink, serial (poll + dispatch)  ─ yield
//!   iteration n+1 : network slot 1 (wifi)            ─ yield
//!   iteration n+2 : network slot 2 (ethernet)        ─ yield
//!   iteration n+3 : blink, serial ...
//! ```
//!
//! No priorities and no preemption: a slot runs to its own next suspend
//! point and returns. Run state only changes the blink pattern.

use crate::task::{Status, Task};

/// The housekeeping tasks composed by the round-robin.
pub trait Housekeeping {
    fn blink(&mut self) -> Status;
    /// Link poll task followed by the command dispatcher.
    fn serial(&mut self) -> Status;
    fn wifi(&mut self) -> Status;
    fn eth(&mut self) -> Status;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Resume {
    Serial,
    Wifi,
    Eth,
}

/// Saved state of the round-robin: which slot runs next.
pub struct RoundRobin {
    point: Resume,
}

impl RoundRobin {
    pub const fn new() -> Self {
        Self {
            point: Resume::Serial,
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Housekeeping> Task<H> for RoundRobin {
    fn resume(&mut self, tasks: &mut H) -> Status {
        // Finished tasks stay in the rotation; they return immediately.
        self.point = match self.point {
            Resume::Serial => {
                tasks.blink();
                tasks.serial();
                Resume::Wifi
            }
            Resume::Wifi => {
                tasks.wifi();
                Resume::Eth
            }
            Resume::Eth => {
                tasks.eth();
                Resume::Serial
            }
        };
        Status::Suspended
    }
}
