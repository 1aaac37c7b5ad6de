//! # Scan-Cycle Controller
//!
//! Drives the fixed-period PLC scan and owns the run/stop/error state and
//! the tick counter. The dispatcher changes them only through the methods
//! here.
//!
//! ## State Machine
//!
//! ```text
//!            start                  fault()
//!   ┌─────────┐ ───────► ┌─────────┐ ───────► ┌───────┐
//!   │ Stopped │          │ Running │          │ Error │
//!   └─────────┘ ◄─────── └─────────┘          └───────┘
//!     │  ▲        stop
//!     └──┘ RUN switch decides
//! ```
//!
//! ## Deadline Handling
//!
//! Each satisfied deadline check advances the deadline by exactly one
//! period. Missed periods are not batched: after a stall, the following
//! main-loop iterations each find the deadline already due and run one
//! scan apiece until the deadline is ahead of the clock again.

use crate::board::Board;
use crate::config::RuntimeConfig;
use crate::error::ConfigError;
use crate::plc::LogicExecutor;
use crate::task::elapsed_ms;

/// PLC run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Logic runs only while the RUN switch is on.
    Stopped,
    /// Logic runs every period.
    Running,
    /// Logic never runs. There is no way out of this state here.
    Error,
}

pub struct ScanController {
    state: ScanState,
    /// Completed scans since the last reinitialise.
    tick: u32,
    period_ms: u32,
    /// Absolute time the next scan is due.
    deadline_ms: u32,
    tick_time_us: u64,
    /// Accumulated IEC time, one tick period per executed scan.
    plc_time_us: u64,
}

impl ScanController {
    /// Derive the scan period and arm the first deadline one period from
    /// `now_ms`. Starts `Stopped` with tick zero.
    pub fn new(config: &RuntimeConfig, now_ms: u32) -> Result<Self, ConfigError> {
        let period_ms = config.scan_period_ms()?;
        crate::log_info!("scan period {} ms", period_ms);

        Ok(Self {
            state: ScanState::Stopped,
            tick: 0,
            period_ms,
            deadline_ms: now_ms.wrapping_add(period_ms),
            tick_time_us: config.tick_time_us,
            plc_time_us: 0,
        })
    }

    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[inline]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[inline]
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    #[inline]
    pub fn deadline_ms(&self) -> u32 {
        self.deadline_ms
    }

    #[inline]
    pub fn plc_time_us(&self) -> u64 {
        self.plc_time_us
    }

    /// Whether logic would execute on a due scan right now.
    pub fn effective_run<B: Board>(&self, board: &mut B) -> bool {
        match self.state {
            ScanState::Stopped => board.run_switch(),
            ScanState::Running => true,
            ScanState::Error => false,
        }
    }

    /// Force `Running` or `Stopped` on behalf of a host command. `Error`
    /// is latched and ignores both.
    pub fn set_running(&mut self, run: bool) {
        if self.state == ScanState::Error {
            crate::log_warn!("plc in Error, run request ignored");
            return;
        }
        let next = if run {
            ScanState::Running
        } else {
            ScanState::Stopped
        };
        if next != self.state {
            crate::log_info!("plc {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Latch the error state. Called by the owner of the escalation policy
    /// (watchdog, I/O diagnostics) through [`Executive::fault`].
    ///
    /// [`Executive::fault`]: crate::kernel::Executive::fault
    pub fn fault(&mut self) {
        crate::log_error!("plc {:?} -> Error", self.state);
        self.state = ScanState::Error;
    }

    /// Reinitialise the program and restart the tick count from zero.
    pub fn reinit<X: LogicExecutor>(&mut self, logic: &mut X) {
        logic.init();
        self.tick = 0;
        crate::log_info!("plc reinitialised");
    }

    /// Check the deadline and, if due and `run` holds, execute one scan.
    ///
    /// Returns `true` if the logic executed.
    pub fn poll<X, B>(&mut self, now_ms: u32, run: bool, logic: &mut X, board: &mut B) -> bool
    where
        X: LogicExecutor,
        B: Board,
    {
        // Deadline reached when `now` is not behind it, modulo clock wrap
        if elapsed_ms(now_ms, self.deadline_ms) > u32::MAX / 2 {
            return false;
        }

        self.deadline_ms = self.deadline_ms.wrapping_add(self.period_ms);

        if !run {
            return false;
        }

        board.update_inputs();
        logic.run(self.tick);
        self.tick = self.tick.wrapping_add(1);
        board.update_outputs();
        self.plc_time_us = self.plc_time_us.wrapping_add(self.tick_time_us);
        true
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NullBoard;

    #[derive(Default)]
    struct Logic {
        inits: u32,
        runs: [u32; 16],
        len: usize,
    }

    impl LogicExecutor for Logic {
        fn init(&mut self) {
            self.inits += 1;
        }

        fn run(&mut self, tick: u32) {
            self.runs[self.len] = tick;
            self.len += 1;
        }
    }

    #[derive(Default)]
    struct Switch {
        on: bool,
        inputs: u32,
        outputs: u32,
    }

    impl Board for Switch {
        fn run_switch(&mut self) -> bool {
            self.on
        }

        fn update_inputs(&mut self) {
            self.inputs += 1;
        }

        fn update_outputs(&mut self) {
            self.outputs += 1;
        }
    }

    fn controller(now: u32) -> ScanController {
        ScanController::new(&RuntimeConfig::new(20_000), now).unwrap()
    }

    #[test]
    fn test_boot_state() {
        let scan = controller(100);
        assert_eq!(scan.state(), ScanState::Stopped);
        assert_eq!(scan.tick(), 0);
        assert_eq!(scan.period_ms(), 20);
        assert_eq!(scan.deadline_ms(), 120);
    }

    #[test]
    fn test_rejects_zero_period() {
        assert!(ScanController::new(&RuntimeConfig::new(500), 0).is_err());
    }

    #[test]
    fn test_effective_run() {
        let mut scan = controller(0);
        let mut board = Switch::default();

        assert!(!scan.effective_run(&mut board));
        board.on = true;
        assert!(scan.effective_run(&mut board));

        scan.set_running(true);
        board.on = false;
        assert!(scan.effective_run(&mut board));

        scan.fault();
        board.on = true;
        assert!(!scan.effective_run(&mut board));
    }

    #[test]
    fn test_error_is_latched() {
        let mut scan = controller(0);
        scan.set_running(true);
        scan.fault();

        scan.set_running(true);
        assert_eq!(scan.state(), ScanState::Error);
        scan.set_running(false);
        assert_eq!(scan.state(), ScanState::Error);
    }

    #[test]
    fn test_start_stop_follow_last_command() {
        let mut scan = controller(0);
        for &(run, expected) in &[
            (true, ScanState::Running),
            (true, ScanState::Running),
            (false, ScanState::Stopped),
            (true, ScanState::Running),
            (false, ScanState::Stopped),
        ] {
            scan.set_running(run);
            assert_eq!(scan.state(), expected);
        }
    }

    #[test]
    fn test_scan_runs_only_when_due_and_running() {
        let mut scan = controller(0);
        let mut logic = Logic::default();
        let mut board = Switch::default();

        // Not due yet
        assert!(!scan.poll(19, true, &mut logic, &mut board));
        assert_eq!(scan.deadline_ms(), 20);

        // Due, running
        assert!(scan.poll(20, true, &mut logic, &mut board));
        assert_eq!(scan.tick(), 1);
        assert_eq!(scan.deadline_ms(), 40);
        assert_eq!((board.inputs, board.outputs), (1, 1));
        assert_eq!(scan.plc_time_us(), 20_000);

        // Due, not running: deadline still advances, tick does not
        assert!(!scan.poll(40, false, &mut logic, &mut board));
        assert_eq!(scan.tick(), 1);
        assert_eq!(scan.deadline_ms(), 60);
        assert_eq!((board.inputs, board.outputs), (1, 1));

        assert_eq!(&logic.runs[..logic.len], &[0]);
    }

    #[test]
    fn test_deadline_advances_one_period_per_check() {
        let mut scan = controller(0);
        let mut logic = Logic::default();
        let mut board = NullBoard;

        // Stall for five periods: each check runs exactly one scan
        let now = 110;
        let mut scans = 0;
        while scan.poll(now, true, &mut logic, &mut board) {
            scans += 1;
        }
        assert_eq!(scans, 5);
        assert_eq!(scan.deadline_ms(), 120);
        assert_eq!(&logic.runs[..logic.len], &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_deadline_across_clock_wrap() {
        let mut scan = controller(u32::MAX - 10);
        let mut logic = Logic::default();
        let mut board = NullBoard;
        assert_eq!(scan.deadline_ms(), 9);

        assert!(!scan.poll(u32::MAX, true, &mut logic, &mut board));
        assert!(scan.poll(9, true, &mut logic, &mut board));
        assert_eq!(scan.deadline_ms(), 29);
    }

    #[test]
    fn test_reinit_resets_tick() {
        let mut scan = controller(0);
        let mut logic = Logic::default();
        let mut board = NullBoard;

        scan.poll(20, true, &mut logic, &mut board);
        scan.poll(40, true, &mut logic, &mut board);
        assert_eq!(scan.tick(), 2);

        scan.reinit(&mut logic);
        assert_eq!(scan.tick(), 0);
        assert_eq!(logic.inits, 1);

        // Stopping does not touch the tick
        scan.poll(60, true, &mut logic, &mut board);
        scan.set_running(false);
        assert_eq!(scan.tick(), 1);
    }
}
