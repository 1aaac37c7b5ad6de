//! # Configuration
//!
//! Compile-time defaults for the executive plus the small runtime
//! configuration handed over by the board at boot. All limits are fixed at
//! compile time, with no dynamic allocation.

use crate::error::ConfigError;

/// Default serial line rate of the commissioning link.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Idle time after which the link is reset and a keep-alive frame is
/// announced, in milliseconds.
pub const DEFAULT_KEEPALIVE_TIMEOUT_MS: u32 = 2000;

/// Capacity of the shared command buffer. Inbound payloads longer than
/// this are dropped before they reach the dispatcher.
pub const COMMAND_BUFFER_SIZE: usize = 32;

/// Largest payload the link layer can carry in a single frame.
pub const MAX_FRAME_PAYLOAD: usize = 255;

/// Status LED "on" phase, measured from the start of a blink period.
pub const BLINK_ON_MS: u32 = 300;

/// Total blink period. The LED is off for `BLINK_PERIOD_MS - BLINK_ON_MS`.
pub const BLINK_PERIOD_MS: u32 = 900;

/// Frequency of the millisecond clock driving the main loop.
pub const CLOCK_HZ: u32 = 1000;

/// System clock frequency in Hz. The firmware leaves RCC at its reset
/// state, so the STM32F103 core runs from the 8 MHz HSI.
pub const SYSTEM_CLOCK_HZ: u32 = 8_000_000;

/// SysTick reload value for one `CLOCK_HZ` tick of the core clock.
pub const SYSTICK_RELOAD: u32 = SYSTEM_CLOCK_HZ / CLOCK_HZ - 1;

/// Microseconds per millisecond, used to derive the scan period.
const US_PER_MS: u64 = 1000;

/// Runtime configuration supplied by the surrounding build.
///
/// `tick_time_us` is the PLC's common tick time as emitted by the IEC
/// code generator. The scan period in milliseconds is derived from it once
/// at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeConfig {
    pub tick_time_us: u64,
    pub keepalive_timeout_ms: u32,
    pub baud_rate: u32,
}

impl RuntimeConfig {
    /// Configuration with default link settings for the given tick time.
    pub const fn new(tick_time_us: u64) -> Self {
        Self {
            tick_time_us,
            keepalive_timeout_ms: DEFAULT_KEEPALIVE_TIMEOUT_MS,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub const fn with_keepalive_timeout(mut self, timeout_ms: u32) -> Self {
        self.keepalive_timeout_ms = timeout_ms;
        self
    }

    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Scan period in milliseconds.
    ///
    /// Tick times below one millisecond would derive a zero period and a
    /// scan on every main-loop iteration, so they are rejected.
    pub fn scan_period_ms(&self) -> Result<u32, ConfigError> {
        let period = self.tick_time_us / US_PER_MS;
        match u32::try_from(period) {
            Ok(0) | Err(_) => Err(ConfigError::ScanPeriodTooShort {
                tick_time_us: self.tick_time_us,
            }),
            Ok(period) => Ok(period),
        }
    }
}
