//! # Synchronization Primitives
//!
//! Hand-off primitives between cooperative tasks. There is one thread of
//! control and no preemption, so none of these need a lock: a task only
//! observes another task's update at its own suspend points.

use heapless::Vec;

use crate::config::COMMAND_BUFFER_SIZE;
use crate::error::{ProtocolError, SlotError};
use crate::protocol::CommandFrame;

/// Binary semaphore between a producer and one waiting task.
///
/// At most one signal is buffered. Signalling an already pending semaphore
/// is reported to the producer and otherwise has no effect.
#[derive(Debug, Default)]
pub struct Semaphore {
    pending: bool,
}

impl Semaphore {
    pub const fn new() -> Self {
        Self { pending: false }
    }

    /// Post the semaphore. Returns `false` if a signal was already pending
    /// and this one was folded into it.
    pub fn signal(&mut self) -> bool {
        let fresh = !self.pending;
        self.pending = true;
        fresh
    }

    /// Consume a pending signal, if any. Waiting tasks await on this.
    pub fn try_acquire(&mut self) -> bool {
        core::mem::replace(&mut self.pending, false)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// The shared command buffer: written by the link poll task when a frame
/// arrives, taken by the dispatcher after its semaphore wait.
///
/// At most one command is in flight. The host must not pipeline a second
/// command before it has seen the reply to the first; a frame deposited
/// while the slot is still occupied is refused so the in-flight command is
/// never torn.
#[derive(Debug)]
pub struct CommandSlot {
    id: u8,
    payload: Vec<u8, COMMAND_BUFFER_SIZE>,
    ready: Semaphore,
}

impl CommandSlot {
    pub const fn new() -> Self {
        Self {
            id: 0,
            payload: Vec::new(),
            ready: Semaphore::new(),
        }
    }

    /// Copy an inbound frame into the slot and signal the dispatcher.
    pub fn deposit(&mut self, id: u8, payload: &[u8]) -> Result<(), SlotError> {
        if self.ready.is_pending() {
            return Err(SlotError::Occupied);
        }

        self.payload.clear();
        self.payload
            .extend_from_slice(payload)
            .map_err(|_| ProtocolError::Oversized {
                len: payload.len(),
                capacity: COMMAND_BUFFER_SIZE,
            })?;
        self.id = id;
        self.ready.signal();
        Ok(())
    }

    /// Take the pending command, leaving the slot free for the next frame.
    pub fn take(&mut self) -> Option<CommandFrame> {
        if !self.ready.try_acquire() {
            return None;
        }
        Some(CommandFrame {
            id: self.id,
            payload: core::mem::take(&mut self.payload),
        })
    }
}

impl Default for CommandSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_buffers_one_signal() {
        let mut sem = Semaphore::new();
        assert!(!sem.try_acquire());

        assert!(sem.signal());
        assert!(!sem.signal());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
    }

    #[test]
    fn test_slot_handoff() {
        let mut slot = CommandSlot::new();
        assert!(slot.take().is_none());

        slot.deposit(10, &[3, 0]).unwrap();
        assert_eq!(slot.deposit(10, &[]), Err(SlotError::Occupied));

        let frame = slot.take().unwrap();
        assert_eq!(frame.id, 10);
        assert_eq!(frame.payload.as_slice(), &[3, 0]);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_slot_refuses_pipelined_command() {
        let mut slot = CommandSlot::new();
        slot.deposit(1, &[]).unwrap();

        assert_eq!(slot.deposit(2, &[9]), Err(SlotError::Occupied));

        // In-flight command untouched
        let frame = slot.take().unwrap();
        assert_eq!(frame.id, 1);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_slot_rejects_oversized_payload() {
        let mut slot = CommandSlot::new();
        let big = [0u8; COMMAND_BUFFER_SIZE + 1];

        assert_eq!(
            slot.deposit(6, &big),
            Err(SlotError::Protocol(ProtocolError::Oversized {
                len: COMMAND_BUFFER_SIZE + 1,
                capacity: COMMAND_BUFFER_SIZE,
            }))
        );
        assert!(slot.take().is_none());

        let exact = [7u8; COMMAND_BUFFER_SIZE];
        slot.deposit(6, &exact).unwrap();
        assert_eq!(slot.take().unwrap().payload.len(), COMMAND_BUFFER_SIZE);
    }
}
