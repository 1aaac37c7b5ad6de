//! # Kernel
//!
//! Boot sequence and main loop of the executive. [`Executive`] owns every
//! piece of runtime state: the scan controller, the link, the command slot
//! and the saved state of each cooperative task. Nothing lives in globals.
//!
//! ## Startup Sequence
//!
//! ```text
//! main()
//!   ├─► board bring-up (pins, clocks, UART)        ← board crate
//!   ├─► Executive::new()
//!   │     ├─► derive scan period, arm first deadline
//!   │     ├─► init peripheral slots (wifi, eth)
//!   │     ├─► Program::init()
//!   │     └─► state = Stopped
//!   └─► Executive::run(clock)                      ← never returns
//!         └─► run_once(now) per iteration
//!               ├─► scan if due (and running)
//!               └─► round-robin: one resume
//! ```
//!
//! ## Ownership
//!
//! The scan controller is the only writer of run state and the tick; the
//! dispatcher reaches it through the controller's methods. The command
//! slot belongs to the poll task from deposit until the dispatcher takes
//! it, and to nobody in between commands.

use embedded_hal::digital::OutputPin;

use crate::blink::{BlinkInput, BlinkTask};
use crate::board::{Board, NoPeripheral, PeripheralTask};
use crate::config::RuntimeConfig;
use crate::dispatch::{CommandContext, CommandTask};
use crate::error::ConfigError;
use crate::link::{Link, PollContext, PollTask, Transport};
use crate::plc::Program;
use crate::scan::ScanController;
use crate::scheduler::{Housekeeping, RoundRobin};
use crate::sync::CommandSlot;
use crate::task::{Status, Task};

/// The collaborators an executive is assembled from.
pub struct Parts<X, B, T, P, W = NoPeripheral, E = NoPeripheral> {
    /// Generated PLC program and its variable table.
    pub program: X,
    pub board: B,
    /// Framed commissioning link.
    pub transport: T,
    /// RUN LED, if the board has one.
    pub status_led: Option<P>,
    /// First optional network slot.
    pub wifi: W,
    /// Second optional network slot.
    pub eth: E,
}

/// Runtime state shared by the housekeeping tasks.
struct Runtime<X, B, T, P, W, E> {
    /// Clock and run decision of the current main-loop iteration.
    now_ms: u32,
    running: bool,

    scan: ScanController,
    program: X,
    board: B,
    link: Link<T>,
    slot: CommandSlot,

    poll: PollTask,
    command: CommandTask,
    blink: BlinkTask<P>,
    wifi: W,
    eth: E,
}

impl<X, B, T, P, W, E> Housekeeping for Runtime<X, B, T, P, W, E>
where
    X: Program,
    B: Board,
    T: Transport,
    P: OutputPin,
    W: PeripheralTask,
    E: PeripheralTask,
{
    fn blink(&mut self) -> Status {
        self.blink.resume(&mut BlinkInput {
            now_ms: self.now_ms,
            running: self.running,
        })
    }

    fn serial(&mut self) -> Status {
        self.poll.resume(&mut PollContext {
            now_ms: self.now_ms,
            link: &mut self.link,
            slot: &mut self.slot,
        });
        self.command.resume(&mut CommandContext {
            scan: &mut self.scan,
            program: &mut self.program,
            board: &mut self.board,
            link: &mut self.link,
            slot: &mut self.slot,
        })
    }

    fn wifi(&mut self) -> Status {
        self.wifi.poll(self.now_ms, self.running);
        Status::Suspended
    }

    fn eth(&mut self) -> Status {
        self.eth.poll(self.now_ms, self.running);
        Status::Suspended
    }
}

/// The soft-PLC executive: scan loop plus cooperative round-robin.
pub struct Executive<X, B, T, P, W = NoPeripheral, E = NoPeripheral> {
    scheduler: RoundRobin,
    rt: Runtime<X, B, T, P, W, E>,
}

impl<X, B, T, P, W, E> Executive<X, B, T, P, W, E>
where
    X: Program,
    B: Board,
    T: Transport,
    P: OutputPin,
    W: PeripheralTask,
    E: PeripheralTask,
{
    /// Boot the executive at time `now_ms`.
    ///
    /// The first scan is due one period after `now_ms`. The PLC comes up
    /// stopped with tick zero.
    pub fn new(config: &RuntimeConfig, now_ms: u32, parts: Parts<X, B, T, P, W, E>) -> Result<Self, ConfigError> {
        let scan = ScanController::new(config, now_ms)?;

        let Parts {
            mut program,
            board,
            transport,
            status_led,
            mut wifi,
            mut eth,
        } = parts;

        wifi.init();
        eth.init();
        program.init();

        crate::log_info!(
            "executive up: link {} baud, keep-alive {} ms",
            config.baud_rate,
            config.keepalive_timeout_ms
        );

        Ok(Self {
            scheduler: RoundRobin::new(),
            rt: Runtime {
                now_ms,
                running: false,
                scan,
                program,
                board,
                link: Link::new(transport),
                slot: CommandSlot::new(),
                poll: PollTask::new(config.keepalive_timeout_ms),
                command: CommandTask::new(),
                blink: BlinkTask::new(status_led),
                wifi,
                eth,
            },
        })
    }

    /// One main-loop iteration.
    ///
    /// Runs a scan if the deadline is due and the PLC should run, then
    /// resumes the round-robin once regardless. Returns `true` if the
    /// logic executed.
    pub fn run_once(&mut self, now_ms: u32) -> bool {
        let rt = &mut self.rt;
        rt.now_ms = now_ms;
        rt.running = rt.scan.effective_run(&mut rt.board);

        let scanned = rt.scan.poll(now_ms, rt.running, &mut rt.program, &mut rt.board);
        self.scheduler.resume(rt);
        scanned
    }

    /// Drive the executive forever from a millisecond clock.
    pub fn run(mut self, mut clock: impl FnMut() -> u32) -> ! {
        loop {
            self.run_once(clock());
        }
    }

    /// Latch the PLC into `Error`. Logic stops running and host start and
    /// stop commands no longer change the state; housekeeping continues.
    pub fn fault(&mut self) {
        self.rt.scan.fault();
    }

    pub fn scan(&self) -> &ScanController {
        &self.rt.scan
    }

    pub fn program(&self) -> &X {
        &self.rt.program
    }

    pub fn board(&self) -> &B {
        &self.rt.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.rt.board
    }

    pub fn transport(&self) -> &T {
        self.rt.link.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.rt.link.transport_mut()
    }

    pub fn status_led(&self) -> Option<&P> {
        self.rt.blink.led()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
