//! # Cooperative Tasks
//!
//! Every activity in the executive is a cooperative task: a state machine
//! that the main loop resumes once per invocation. A task runs from its
//! last suspend point to the next one and then returns control; it never
//! blocks the caller for longer than that stretch.
//!
//! ## Task Model
//!
//! A task is a struct holding exactly the locals that must survive a
//! suspend point, plus a resume-point enum. `resume()` matches on the
//! resume point inside a `loop`:
//!
//! - **Yield**: store the next resume point and return
//!   [`Status::Suspended`]. The next invocation continues there.
//! - **Await(cond)**: stay on the current resume point and return
//!   [`Status::Suspended`] while `cond` is false. Once it holds, fall
//!   through in the *same* invocation (`continue` the loop).
//! - **Semaphore**: an await on [`Semaphore::try_acquire`](crate::sync::Semaphore::try_acquire).
//! - **Completion**: return [`Status::Finished`]; the task has no more
//!   work and further calls keep returning `Finished`.
//!
//! ```text
//!        resume()                      resume()
//!   ─────────────► [point A] ──yield──► [point B] ──await(cond)──┐
//!                                           ▲                     │ false
//!                                           └─────────────────────┘
//! ```
//!
//! No task may suspend while holding a half-updated shared invariant;
//! between suspend points execution is atomic with respect to every other
//! task.

/// Outcome of a single resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Task reached a suspend point; call again.
    Suspended,
    /// Task terminated and has no further work.
    Finished,
}

/// A cooperative task resumed with a borrowed context.
///
/// The context carries whatever the task touches besides its own saved
/// state: the current time, the link, the scan controller. Tasks never
/// read each other's private state.
pub trait Task<Cx: ?Sized> {
    /// Run from the saved resume point to the next suspend point.
    fn resume(&mut self, cx: &mut Cx) -> Status;
}

/// Milliseconds elapsed since `since`, tolerant of clock wrap-around.
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
