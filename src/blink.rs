//! # Status LED
//!
//! Blinks the RUN LED so the run state is visible on the board: steady on
//! while stopped, `BLINK_ON_MS` on / `BLINK_PERIOD_MS - BLINK_ON_MS` off
//! while running. The off phase is simply held back until the PLC runs.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::config::{BLINK_ON_MS, BLINK_PERIOD_MS};
use crate::task::{elapsed_ms, Status, Task};

/// Inputs of one blink step.
#[derive(Debug, Clone, Copy)]
pub struct BlinkInput {
    pub now_ms: u32,
    pub running: bool,
}

/// Pin type for boards without a status LED; pass `None::<NoLed>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLed;

impl ErrorType for NoLed {
    type Error = Infallible;
}

impl OutputPin for NoLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Begin,
    LightOn,
    WaitOn,
    WaitRun,
    WaitOff,
}

pub struct BlinkTask<P> {
    led: Option<P>,
    point: Resume,
    /// Start of the current blink period.
    period_start_ms: u32,
}

impl<P: OutputPin> BlinkTask<P> {
    /// Blink `led`; `None` for boards without a status LED, in which case
    /// the task finishes on its first resume.
    pub const fn new(led: Option<P>) -> Self {
        Self {
            led,
            point: Resume::Begin,
            period_start_ms: 0,
        }
    }

    pub fn led(&self) -> Option<&P> {
        self.led.as_ref()
    }
}

impl<P: OutputPin> Task<BlinkInput> for BlinkTask<P> {
    fn resume(&mut self, input: &mut BlinkInput) -> Status {
        let Some(led) = self.led.as_mut() else {
            return Status::Finished;
        };

        loop {
            match self.point {
                Resume::Begin => {
                    self.period_start_ms = input.now_ms;
                    self.point = Resume::LightOn;
                }
                Resume::LightOn => {
                    if led.set_high().is_err() {
                        crate::log_warn!("status led write failed");
                    }
                    self.point = Resume::WaitOn;
                }
                Resume::WaitOn => {
                    if elapsed_ms(input.now_ms, self.period_start_ms) <= BLINK_ON_MS {
                        return Status::Suspended;
                    }
                    self.point = Resume::WaitRun;
                }
                Resume::WaitRun => {
                    if !input.running {
                        return Status::Suspended;
                    }
                    if led.set_low().is_err() {
                        crate::log_warn!("status led write failed");
                    }
                    self.point = Resume::WaitOff;
                }
                Resume::WaitOff => {
                    if elapsed_ms(input.now_ms, self.period_start_ms) <= BLINK_PERIOD_MS {
                        return Status::Suspended;
                    }
                    self.period_start_ms = input.now_ms;
                    self.point = Resume::LightOn;
                }
            }
        }
    }
}
