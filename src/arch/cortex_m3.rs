//! # Cortex-M3 Port Layer
//!
//! STM32F1 support for the executive: a SysTick-driven millisecond clock
//! for the main loop, and the reset and bootloader hooks behind the
//! `reset` and `upload` commands.
//!
//! ## Bootloader Hand-Off
//!
//! The upload command stores a magic word at a fixed RAM address and
//! resets. The bootloader checks the word on boot and stays resident to
//! accept new firmware instead of jumping to the application. The address
//! lies above this image's `.bss`/`.data` and is not cleared by reset.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use embedded_hal::digital::InputPin;

use crate::board::Board;
use crate::config::SYSTICK_RELOAD;

/// Flag word checked by the bootloader after reset.
const BOOTLOADER_FLAG: *mut u32 = 0x2000_1800 as *mut u32;
const BOOTLOADER_MAGIC: u32 = 0xDEAD_BEEF;

/// Milliseconds since `configure_systick`.
static MILLIS: AtomicU32 = AtomicU32::new(0);

// ---------------------------------------------------------------------------
// SysTick millisecond clock
// ---------------------------------------------------------------------------

/// Configure SysTick to fire at `CLOCK_HZ` from the processor clock.
pub fn configure_systick(syst: &mut SYST) {
    syst.set_reload(SYSTICK_RELOAD);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Monotonic millisecond clock. Wraps after ~49 days; every consumer
/// compares times with wrapping arithmetic.
#[inline]
pub fn millis() -> u32 {
    MILLIS.load(Ordering::Relaxed)
}

/// SysTick exception handler: advances the millisecond clock.
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Reset and bootloader
// ---------------------------------------------------------------------------

/// Request a system reset through the SCB. Does not return.
pub fn system_reset() -> ! {
    SCB::sys_reset()
}

/// Flag the bootloader to stay resident, then reset. Does not return.
pub fn enter_bootloader() -> ! {
    // Safety: the flag word is reserved RAM outside every Rust object; it
    // is only ever written here, right before reset.
    unsafe {
        core::ptr::write_volatile(BOOTLOADER_FLAG, BOOTLOADER_MAGIC);
    }
    SCB::sys_reset()
}

// ---------------------------------------------------------------------------
// Board hooks
// ---------------------------------------------------------------------------

/// Board hooks for a bare STM32F1: optional RUN switch, SCB reset, and the
/// RAM-flag bootloader hand-off. Process image refresh stays a no-op.
pub struct CortexM3Board<S> {
    run_switch: Option<S>,
}

impl<S: InputPin> CortexM3Board<S> {
    pub const fn new(run_switch: Option<S>) -> Self {
        Self { run_switch }
    }
}

impl<S: InputPin> Board for CortexM3Board<S> {
    fn run_switch(&mut self) -> bool {
        match self.run_switch.as_mut() {
            Some(pin) => pin.is_high().unwrap_or(false),
            None => false,
        }
    }

    fn system_reset(&mut self) {
        system_reset()
    }

    fn enter_bootloader(&mut self) {
        enter_bootloader()
    }
}
