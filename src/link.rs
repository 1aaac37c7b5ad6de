//! # Serial Link and Keep-Alive
//!
//! The link layer (byte framing, CRC, retransmission) is external and sits
//! behind [`Transport`]. This module wraps it with the keep-alive timer and
//! provides the poll task that pumps received bytes into it.
//!
//! ## Keep-Alive
//!
//! The link records the last time any frame went out or came in. The poll
//! task announces the link once at boot, and again whenever it finds the
//! link idle for longer than the keep-alive timeout: it resets the
//! transport and queues a keep-alive frame. This recovers from a silently
//! wedged peer and re-synchronises framing. An announcement restarts the
//! timer even when the frame is refused, so an idle link sees at most one
//! reset per timeout.

use crate::config::MAX_FRAME_PAYLOAD;
use crate::error::LinkError;
use crate::protocol::KEEP_ALIVE;
use crate::sync::CommandSlot;
use crate::task::{elapsed_ms, Status, Task};

/// A decoded frame borrowed from the transport's reassembly buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub id: u8,
    pub payload: &'a [u8],
}

/// Byte-oriented framed link.
pub trait Transport {
    /// Next received byte, if one is buffered by the UART.
    fn read_byte(&mut self) -> Option<u8>;

    /// Feed one received byte (or none, to run the transport's timers)
    /// into the reassembler. Returns a frame once one is complete.
    fn poll(&mut self, byte: Option<u8>, now_ms: u32) -> Option<RawFrame<'_>>;

    /// Queue an application frame for transmission.
    fn queue_frame(&mut self, id: u8, payload: &[u8]) -> Result<(), LinkError>;

    /// Drop framing and retransmission state. With `inform_peer` the
    /// transport also tells the other side to do the same.
    fn reset(&mut self, inform_peer: bool);
}

/// Transport for builds without a commissioning link. Never receives and
/// discards everything it is asked to send.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn read_byte(&mut self) -> Option<u8> {
        None
    }

    fn poll(&mut self, _byte: Option<u8>, _now_ms: u32) -> Option<RawFrame<'_>> {
        None
    }

    fn queue_frame(&mut self, _id: u8, _payload: &[u8]) -> Result<(), LinkError> {
        Ok(())
    }

    fn reset(&mut self, _inform_peer: bool) {}
}

/// The transport plus the keep-alive timer.
pub struct Link<T> {
    transport: T,
    /// Last frame sent or received; `None` until the link first speaks.
    last_traffic_ms: Option<u32>,
    /// Clock as of the latest poll task invocation.
    now_ms: u32,
}

impl<T: Transport> Link<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            last_traffic_ms: None,
            now_ms: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Queue a frame and restart the keep-alive timer.
    pub fn send(&mut self, id: u8, payload: &[u8]) -> Result<(), LinkError> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(LinkError::PayloadTooLarge {
                len: payload.len(),
                capacity: MAX_FRAME_PAYLOAD,
            });
        }
        self.transport.queue_frame(id, payload)?;
        self.last_traffic_ms = Some(self.now_ms);
        Ok(())
    }

    /// Best-effort send: the protocol has no error channel, so a frame the
    /// transport refuses is logged and lost.
    pub fn send_or_drop(&mut self, id: u8, payload: &[u8]) {
        if let Err(err) = self.send(id, payload) {
            crate::log_warn!("frame {} dropped: {:?}", id, err);
        }
    }

    fn keepalive_due(&self, now_ms: u32, timeout_ms: u32) -> bool {
        match self.last_traffic_ms {
            Some(last) => elapsed_ms(now_ms, last) > timeout_ms,
            None => true,
        }
    }

    /// Reset the transport and queue a keep-alive. The timer restarts
    /// even if the transport refuses the frame, so a wedged transmitter
    /// sees at most one reset per timeout.
    fn announce(&mut self) {
        self.last_traffic_ms = Some(self.now_ms);
        self.transport.reset(true);
        self.send_or_drop(KEEP_ALIVE, &[]);
    }
}

/// What the poll task touches on each invocation.
pub struct PollContext<'a, T> {
    pub now_ms: u32,
    pub link: &'a mut Link<T>,
    pub slot: &'a mut CommandSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Announce the link before anything is received.
    Begin,
    Poll,
}

/// Pumps the UART into the transport and supervises link liveness.
///
/// The first invocation announces the link; every later one does one
/// poll step and yields.
pub struct PollTask {
    point: Resume,
    keepalive_timeout_ms: u32,
}

impl PollTask {
    pub const fn new(keepalive_timeout_ms: u32) -> Self {
        Self {
            point: Resume::Begin,
            keepalive_timeout_ms,
        }
    }
}

impl<T: Transport> Task<PollContext<'_, T>> for PollTask {
    fn resume(&mut self, cx: &mut PollContext<'_, T>) -> Status {
        let now = cx.now_ms;
        let link = &mut *cx.link;
        link.now_ms = now;

        if self.point == Resume::Begin {
            crate::log_debug!("announcing link");
            link.announce();
            self.point = Resume::Poll;
        }

        let byte = link.transport.read_byte();
        if let Some(frame) = link.transport.poll(byte, now) {
            let id = frame.id;
            let deposited = cx.slot.deposit(id, frame.payload);

            // Any inbound frame counts as traffic, even one we drop
            link.last_traffic_ms = Some(now);

            if let Err(err) = deposited {
                crate::log_warn!("inbound frame {} dropped: {:?}", id, err);
            }
        }

        if link.keepalive_due(now, self.keepalive_timeout_ms) {
            crate::log_debug!("link idle, resetting transport");
            link.announce();
        }

        Status::Suspended
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
