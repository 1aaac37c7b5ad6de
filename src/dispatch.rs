//! # Command Dispatcher
//!
//! Cooperative task that waits for the poll task to hand over a command,
//! executes it, and queues the reply frames.
//!
//! ## Resume Points
//!
//! ```text
//!   Begin ──► WaitCommand ◄──────────────────────────────┐
//!                 │ take()                               │
//!                 ├── simple command ────────────────────┤
//!                 ├── get-trace ──► [tick], trace ──► AfterTrace (yield)
//!                 └── wait-trace ─► WaitTick ─(tick changed)─► tick, trace ─► AfterTrace
//! ```
//!
//! ## Trace Synchronisation
//!
//! The task remembers the last tick it reported. A get-trace reports the
//! tick first only if it moved since; a wait-trace suspends until the scan
//! controller advances the tick and always reports it. The remembered tick
//! starts one behind the counter so the very first trace carries a tick.

use crate::board::Board;
use crate::link::{Link, Transport};
use crate::plc::{Program, VariableBackend};
use crate::protocol::{self, Command, CommandFrame, SetTrace};
use crate::scan::ScanController;
use crate::sync::CommandSlot;
use crate::task::{Status, Task};

/// Everything the dispatcher acts on besides its own saved state.
pub struct CommandContext<'a, X, B, T> {
    pub scan: &'a mut ScanController,
    pub program: &'a mut X,
    pub board: &'a mut B,
    pub link: &'a mut Link<T>,
    pub slot: &'a mut CommandSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Begin,
    WaitCommand,
    /// Wait-trace accepted; suspended until the tick moves.
    WaitTick { index: usize },
    /// Trace sent; yield once before the next command.
    AfterTrace,
}

pub struct CommandTask {
    point: Resume,
    last_tick: u32,
}

impl CommandTask {
    pub const fn new() -> Self {
        Self {
            point: Resume::Begin,
            last_tick: 0,
        }
    }

    /// Execute a command and return where to resume.
    fn execute<X, B, T>(&mut self, frame: CommandFrame, cx: &mut CommandContext<'_, X, B, T>) -> Resume
    where
        X: Program,
        B: Board,
        T: Transport,
    {
        let command = Command::from_id(frame.id);
        crate::log_trace!("command {:?}", command);

        match command {
            Command::KeepAlive => {
                cx.link.send_or_drop(protocol::KEEP_ALIVE, &[]);
            }
            Command::Start => {
                cx.scan.set_running(true);
                cx.link.send_or_drop(protocol::PLC_START, &[]);
            }
            Command::Stop => {
                cx.scan.set_running(false);
                cx.link.send_or_drop(protocol::PLC_STOP, &[]);
            }
            Command::Reset => {
                crate::log_warn!("hardware reset requested");
                cx.board.system_reset();
            }
            Command::Reinit => {
                cx.scan.reinit(&mut *cx.program);
            }
            Command::Upload => {
                crate::log_warn!("bootloader requested");
                cx.board.enter_bootloader();
            }
            Command::Force => {
                cx.program.force(&frame.payload);
            }
            Command::WaitTrace => match protocol::decode_trace_index(&frame.payload) {
                Ok(index) => {
                    self.last_tick = cx.scan.tick();
                    return Resume::WaitTick { index };
                }
                Err(err) => crate::log_warn!("wait-trace dropped: {:?}", err),
            },
            Command::GetTrace => match protocol::decode_trace_index(&frame.payload) {
                Ok(index) => {
                    self.send_trace(index, cx);
                    return Resume::AfterTrace;
                }
                Err(err) => crate::log_warn!("get-trace dropped: {:?}", err),
            },
            Command::SetTrace => match SetTrace::decode(&frame.payload) {
                Ok(req) if req.size == cx.program.var_size(req.index) => {
                    cx.program.set_trace(req.index, req.enable, req.value);
                }
                Ok(req) => {
                    crate::log_debug!("set-trace {} size mismatch ({}), ignored", req.index, req.size);
                }
                Err(err) => crate::log_warn!("set-trace dropped: {:?}", err),
            },
            Command::ResetTrace => {
                cx.program.reset_trace();
            }
            Command::Unknown(id) => {
                crate::log_debug!("unknown command {}, answering keep-alive", id);
                cx.link.send_or_drop(protocol::KEEP_ALIVE, &[]);
            }
        }

        Resume::WaitCommand
    }

    /// Report the tick if it moved since the last report, then the value
    /// of the variable at `index`.
    fn send_trace<X, B, T>(&mut self, index: usize, cx: &mut CommandContext<'_, X, B, T>)
    where
        X: VariableBackend,
        T: Transport,
    {
        let tick = cx.scan.tick();
        if tick != self.last_tick {
            self.last_tick = tick;
            cx.link.send_or_drop(protocol::PLC_TICK, &protocol::encode_tick(tick));
        }

        cx.link.send_or_drop(protocol::PLC_GET_TRACE, cx.program.var_value(index));
    }
}

impl Default for CommandTask {
    fn default() -> Self {
        Self::new()
    }
}

impl<X, B, T> Task<CommandContext<'_, X, B, T>> for CommandTask
where
    X: Program,
    B: Board,
    T: Transport,
{
    fn resume(&mut self, cx: &mut CommandContext<'_, X, B, T>) -> Status {
        loop {
            match self.point {
                Resume::Begin => {
                    self.last_tick = cx.scan.tick().wrapping_sub(1);
                    self.point = Resume::WaitCommand;
                }
                Resume::WaitCommand => {
                    let Some(frame) = cx.slot.take() else {
                        return Status::Suspended;
                    };
                    self.point = self.execute(frame, cx);
                    if self.point == Resume::AfterTrace {
                        return Status::Suspended;
                    }
                }
                Resume::WaitTick { index } => {
                    if cx.scan.tick() == self.last_tick {
                        return Status::Suspended;
                    }
                    self.send_trace(index, cx);
                    self.point = Resume::AfterTrace;
                    return Status::Suspended;
                }
                Resume::AfterTrace => {
                    self.point = Resume::WaitCommand;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::protocol::*;
    use crate::scan::ScanState;
    use crate::testing::{ScriptedTransport, TestBoard, TestProgram};

    struct Harness {
        task: CommandTask,
        scan: ScanController,
        program: TestProgram,
        board: TestBoard,
        link: Link<ScriptedTransport>,
        slot: CommandSlot,
        now: u32,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                task: CommandTask::new(),
                scan: ScanController::new(&RuntimeConfig::new(20_000), 0).unwrap(),
                program: TestProgram::with_values(&[&[0x11], &[0x22, 0x22], &[], &[0xde, 0xad, 0xbe, 0xef]]),
                board: TestBoard::default(),
                link: Link::new(ScriptedTransport::default()),
                slot: CommandSlot::new(),
                now: 0,
            }
        }

        fn resume(&mut self) -> Status {
            let mut cx = CommandContext {
                scan: &mut self.scan,
                program: &mut self.program,
                board: &mut self.board,
                link: &mut self.link,
                slot: &mut self.slot,
            };
            self.task.resume(&mut cx)
        }

        fn command(&mut self, id: u8, payload: &[u8]) {
            self.slot.deposit(id, payload).unwrap();
            assert_eq!(self.resume(), Status::Suspended);
        }

        /// Run one due scan with the controller forced to run.
        fn scan(&mut self) {
            self.now += 20;
            assert!(self.scan.poll(self.now, true, &mut self.program, &mut self.board));
        }

        fn sent(&self) -> Vec<(u8, Vec<u8>)> {
            self.link.transport().sent.clone()
        }

        fn clear(&mut self) {
            self.link.transport_mut().clear_sent();
        }
    }

    #[test]
    fn test_waits_for_command() {
        let mut h = Harness::new();
        for _ in 0..3 {
            assert_eq!(h.resume(), Status::Suspended);
        }
        assert!(h.sent().is_empty());
    }

    #[test]
    fn test_start_stop_ack() {
        let mut h = Harness::new();

        h.command(PLC_START, &[]);
        assert_eq!(h.scan.state(), ScanState::Running);
        h.command(PLC_STOP, &[]);
        assert_eq!(h.scan.state(), ScanState::Stopped);

        assert_eq!(h.sent(), vec![(PLC_START, vec![]), (PLC_STOP, vec![])]);
    }

    #[test]
    fn test_keepalive_and_unknown_answer_keepalive() {
        let mut h = Harness::new();
        h.command(KEEP_ALIVE, &[]);
        h.command(PLC_TICK, &[]);
        h.command(42, &[1, 2, 3]);
        assert_eq!(h.link.transport().sent_ids(), vec![KEEP_ALIVE; 3]);
    }

    #[test]
    fn test_reinit_resets_tick() {
        let mut h = Harness::new();
        h.scan();
        h.scan();
        assert_eq!(h.scan.tick(), 2);

        h.command(PLC_INIT, &[]);
        assert_eq!(h.scan.tick(), 0);
        assert_eq!(h.program.inits, 1);
        assert!(h.sent().is_empty());
    }

    #[test]
    fn test_reset_and_upload_reach_board() {
        let mut h = Harness::new();
        h.command(PLC_RESET, &[]);
        h.command(PLC_UPLOAD, &[]);
        assert_eq!(h.board.resets, 1);
        assert_eq!(h.board.bootloader, 1);
        assert!(h.sent().is_empty());
    }

    #[test]
    fn test_force_and_reset_trace_forwarded() {
        let mut h = Harness::new();
        h.command(PLC_FORCE, &[1, 0, 0, 0, 1, 0x55]);
        h.command(PLC_RESET_TRACE, &[]);
        assert_eq!(h.program.forced, vec![vec![1, 0, 0, 0, 1, 0x55]]);
        assert_eq!(h.program.trace_resets, 1);
    }

    #[test]
    fn test_first_get_trace_carries_tick() {
        let mut h = Harness::new();
        h.command(PLC_GET_TRACE, &[1, 0]);
        assert_eq!(
            h.sent(),
            vec![(PLC_TICK, vec![0, 0, 0, 0]), (PLC_GET_TRACE, vec![0x22, 0x22])]
        );
    }

    #[test]
    fn test_get_trace_does_not_repeat_tick() {
        let mut h = Harness::new();
        h.command(PLC_GET_TRACE, &[0, 0]);
        assert_eq!(h.resume(), Status::Suspended);
        h.clear();

        h.command(PLC_GET_TRACE, &[0, 0]);
        assert_eq!(h.sent(), vec![(PLC_GET_TRACE, vec![0x11])]);
        assert_eq!(h.resume(), Status::Suspended);
        h.clear();

        // Tick moved: reported once more
        h.scan();
        h.command(PLC_GET_TRACE, &[3, 0]);
        assert_eq!(
            h.sent(),
            vec![(PLC_TICK, vec![1, 0, 0, 0]), (PLC_GET_TRACE, vec![0xde, 0xad, 0xbe, 0xef])]
        );
    }

    #[test]
    fn test_next_command_served_after_trace_yield() {
        let mut h = Harness::new();
        h.command(PLC_GET_TRACE, &[0, 0]);
        assert_eq!(h.sent().len(), 2);
        h.clear();

        // Resuming past the yield falls straight into the next wait
        h.slot.deposit(KEEP_ALIVE, &[]).unwrap();
        assert_eq!(h.resume(), Status::Suspended);
        assert_eq!(h.sent(), vec![(KEEP_ALIVE, vec![])]);
    }

    #[test]
    fn test_wait_trace_suspends_until_tick_moves() {
        let mut h = Harness::new();
        for _ in 0..5 {
            h.scan();
        }
        assert_eq!(h.scan.tick(), 5);

        h.command(PLC_WAIT_TRACE, &[3, 0]);
        for _ in 0..3 {
            assert_eq!(h.resume(), Status::Suspended);
        }
        assert!(h.sent().is_empty());

        h.scan();
        assert_eq!(h.resume(), Status::Suspended);
        assert_eq!(
            h.sent(),
            vec![(PLC_TICK, vec![6, 0, 0, 0]), (PLC_GET_TRACE, vec![0xde, 0xad, 0xbe, 0xef])]
        );

        // Yield, then back to waiting without further frames
        assert_eq!(h.resume(), Status::Suspended);
        assert_eq!(h.resume(), Status::Suspended);
        assert_eq!(h.sent().len(), 2);
    }

    #[test]
    fn test_wait_trace_unknown_index_sends_empty_trace() {
        let mut h = Harness::new();
        h.command(PLC_WAIT_TRACE, &[99, 0]);
        h.scan();
        h.resume();
        assert_eq!(h.sent(), vec![(PLC_TICK, vec![1, 0, 0, 0]), (PLC_GET_TRACE, vec![])]);
    }

    #[test]
    fn test_truncated_trace_request_dropped() {
        let mut h = Harness::new();
        h.command(PLC_WAIT_TRACE, &[3]);
        h.command(PLC_GET_TRACE, &[]);
        h.scan();
        h.resume();
        assert!(h.sent().is_empty());

        // Still serving commands
        h.command(KEEP_ALIVE, &[]);
        assert_eq!(h.link.transport().sent_ids(), vec![KEEP_ALIVE]);
    }

    #[test]
    fn test_set_trace_checks_size() {
        let mut h = Harness::new();

        // Index 1 is two bytes wide; host claims four
        h.command(PLC_SET_TRACE, &[1, 0, 0, 0, 4, 0, 0, 0, 1, 9, 9, 9, 9]);
        assert!(h.program.traces.is_empty());

        h.command(PLC_SET_TRACE, &[1, 0, 0, 0, 2, 0, 0, 0, 1, 0x33, 0x44]);
        assert_eq!(h.program.traces, vec![(1, true, vec![0x33, 0x44])]);

        // Malformed
        h.command(PLC_SET_TRACE, &[1, 0, 0]);
        assert_eq!(h.program.traces.len(), 1);
        assert!(h.sent().is_empty());
    }
}
