//! # softplc: Soft-PLC Executive
//!
//! The runtime shell of a soft-PLC on a single-core microcontroller. It
//! runs the generated IEC 61131-3 program on a fixed scan period, exposes
//! a run/stop/error state machine to a commissioning host over a framed
//! serial link, and shares the one thread of control with low-priority
//! housekeeping through cooperative tasks.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Firmware main (main.rs)                │
//! ├────────────────────────────────────────────────────────┤
//! │            Executive (kernel.rs) · run_once()          │
//! ├──────────────────┬─────────────────────────────────────┤
//! │  Scan controller │        Round-robin (scheduler.rs)   │
//! │  scan.rs         │  blink.rs · link.rs · dispatch.rs   │
//! │  ─ deadline      │  ─ status LED                       │
//! │  ─ run state     │  ─ UART poll + keep-alive           │
//! │  ─ tick          │  ─ command dispatcher               │
//! │                  │  ─ network slots (board.rs)         │
//! ├──────────────────┴─────────────────────────────────────┤
//! │   Task model (task.rs) · hand-off (sync.rs)            │
//! │   Protocol (protocol.rs) · errors (error.rs)           │
//! ├────────────────────────────────────────────────────────┤
//! │   External: PLC program (plc.rs) · link layer          │
//! │   (link::Transport) · board hooks (board.rs)           │
//! ├────────────────────────────────────────────────────────┤
//! │   Arch port (arch/cortex_m3.rs) · SysTick · reset      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Main Loop
//!
//! Each iteration reads the millisecond clock. If the scan deadline is due
//! it advances by one period and, when the PLC should run, one scan
//! executes: inputs, logic at the current tick, tick + 1, outputs, IEC
//! time + one tick period. Then the round-robin is resumed once,
//! regardless of run state.
//!
//! ## Concurrency Model
//!
//! - **One thread, no preemption**: tasks suspend only at explicit points
//! - **No heap**: fixed-capacity buffers (`heapless`), no `alloc`
//! - **No locks**: state between suspend points is never observed half-done
//! - **One command in flight**: the host must wait for a reply before
//!   sending the next command
//!
//! ## Building
//!
//! Host tests: `cargo test`. Firmware:
//! `cargo build --release --features firmware,defmt --target thumbv7m-none-eabi`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod blink;
pub mod board;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod kernel;
pub mod link;
pub mod plc;
pub mod protocol;
pub mod scan;
pub mod scheduler;
pub mod sync;
pub mod task;

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
pub mod arch;

#[cfg(test)]
mod testing;

pub use config::RuntimeConfig;
pub use kernel::{Executive, Parts};
pub use scan::ScanState;
