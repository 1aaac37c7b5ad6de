//! # softplc Example Firmware
//!
//! Boots the executive on a bare STM32F103 with a stand-in PLC program: a
//! scan counter exposed as traceable variable 0. A real build links the
//! generated program, the board's I/O hooks and a framed UART transport
//! in place of the stand-ins.
//!
//! | Piece        | Here              | Real build                    |
//! |--------------|-------------------|-------------------------------|
//! | Program      | `ScanCounter`     | generated IEC 61131-3 code    |
//! | Transport    | `NullTransport`   | UART + link-layer framing     |
//! | Board        | `CortexM3Board`   | same, plus I/O image refresh  |
//! | Status LED   | none              | board's RUN LED pin           |

#![no_std]
#![no_main]

use core::convert::Infallible;

use cortex_m_rt::entry;
use embedded_hal::digital::{ErrorType, InputPin};
use panic_halt as _;

use softplc::arch::cortex_m3::{self, CortexM3Board};
use softplc::blink::NoLed;
use softplc::board::NoPeripheral;
use softplc::link::NullTransport;
use softplc::plc::{LogicExecutor, VariableBackend};
use softplc::{Executive, Parts, RuntimeConfig};

#[cfg(feature = "defmt")]
use defmt_rtt as _;

/// Common tick time of the stand-in program: 20 ms.
const TICK_TIME_US: u64 = 20_000;

// ---------------------------------------------------------------------------
// Stand-in program
// ---------------------------------------------------------------------------

/// Counts executed scans.
#[derive(Default)]
struct ScanCounter {
    count: [u8; 4],
    traced: bool,
}

impl LogicExecutor for ScanCounter {
    fn init(&mut self) {
        self.count = [0; 4];
    }

    fn run(&mut self, _tick: u32) {
        let next = u32::from_le_bytes(self.count).wrapping_add(1);
        self.count = next.to_le_bytes();
    }
}

impl VariableBackend for ScanCounter {
    fn var_size(&self, index: usize) -> usize {
        self.var_value(index).len()
    }

    fn var_value(&self, index: usize) -> &[u8] {
        match index {
            0 => &self.count,
            _ => &[],
        }
    }

    fn set_trace(&mut self, index: usize, enable: bool, _value: &[u8]) {
        if index == 0 {
            self.traced = enable;
        }
    }

    fn reset_trace(&mut self) {
        self.traced = false;
    }
}

/// The example board has no RUN switch.
struct NoSwitch;

impl ErrorType for NoSwitch {
    type Error = Infallible;
}

impl InputPin for NoSwitch {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Starts the millisecond clock, boots the
/// executive and runs its main loop. Does not return.
#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();
    cortex_m3::configure_systick(&mut cp.SYST);

    let parts = Parts {
        program: ScanCounter::default(),
        board: CortexM3Board::new(None::<NoSwitch>),
        transport: NullTransport,
        status_led: None::<NoLed>,
        wifi: NoPeripheral,
        eth: NoPeripheral,
    };

    let config = RuntimeConfig::new(TICK_TIME_US);
    let executive = Executive::new(&config, cortex_m3::millis(), parts)
        .expect("tick time yields a zero scan period");

    executive.run(cortex_m3::millis)
}
