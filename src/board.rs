//! # Board Hooks
//!
//! Optional hardware capabilities. Every hook has a no-op default so a
//! board only implements what it actually has; the executive calls all of
//! them unconditionally.

/// Board-level I/O and control hooks.
pub trait Board {
    /// Level of the physical RUN switch. Only consulted while stopped.
    fn run_switch(&mut self) -> bool {
        false
    }

    /// Refresh the input process image before a scan.
    fn update_inputs(&mut self) {}

    /// Publish the output process image after a scan.
    fn update_outputs(&mut self) {}

    /// Hardware reset. Does not return on boards that support it.
    fn system_reset(&mut self) {}

    /// Reboot into the firmware-upload bootloader. Does not return on
    /// boards that support it.
    fn enter_bootloader(&mut self) {}
}

/// Board without any optional hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBoard;

impl Board for NullBoard {}

/// An optional low-priority peripheral task, e.g. a network stack, that
/// shares the round-robin with the serial link.
///
/// `poll` must return promptly; it is one stretch between suspend points.
pub trait PeripheralTask {
    /// Bring the peripheral up. Called once at boot.
    fn init(&mut self) {}

    /// Advance the peripheral by one step.
    fn poll(&mut self, now_ms: u32, running: bool) {
        let _ = (now_ms, running);
    }
}

/// Empty peripheral slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPeripheral;

impl PeripheralTask for NoPeripheral {}
