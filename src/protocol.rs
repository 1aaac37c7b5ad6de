//! # Commissioning Protocol
//!
//! Frame identifiers and payload layouts of the command/debug protocol
//! spoken with the commissioning host. Framing, CRC and retransmission are
//! the link layer's business; this module only sees decoded application
//! frames `(id, payload)`.
//!
//! | Id | Inbound        | Payload                                   | Reply            |
//! |----|----------------|-------------------------------------------|------------------|
//! | 0  | keep-alive     | -                                         | keep-alive       |
//! | 1  | start          | -                                         | start (ack)      |
//! | 2  | stop           | -                                         | stop (ack)       |
//! | 3  | reset          | -                                         | - (hardware reset) |
//! | 4  | reinit         | -                                         | -                |
//! | 5  | upload         | -                                         | - (bootloader)   |
//! | 6  | force          | backend-defined                           | -                |
//! | 7  | -              |                                           | tick `u32`       |
//! | 8  | set-trace      | `u32` index, `u32` size, `u8` enable, value | -              |
//! | 9  | get-trace      | `u16` index                               | [tick], trace    |
//! | 10 | wait-trace     | `u16` index                               | tick, trace      |
//! | 11 | reset-trace    | -                                         | -                |
//!
//! All integers are little-endian. Trace replies reuse id 9.

use heapless::Vec;

use crate::config::COMMAND_BUFFER_SIZE;
use crate::error::ProtocolError;

pub const KEEP_ALIVE: u8 = 0;
pub const PLC_START: u8 = 1;
pub const PLC_STOP: u8 = 2;
pub const PLC_RESET: u8 = 3;
pub const PLC_INIT: u8 = 4;
pub const PLC_UPLOAD: u8 = 5;
pub const PLC_FORCE: u8 = 6;
pub const PLC_TICK: u8 = 7;
pub const PLC_SET_TRACE: u8 = 8;
pub const PLC_GET_TRACE: u8 = 9;
pub const PLC_WAIT_TRACE: u8 = 10;
pub const PLC_RESET_TRACE: u8 = 11;

/// A decoded inbound frame as held in the command buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub id: u8,
    pub payload: Vec<u8, COMMAND_BUFFER_SIZE>,
}

/// Host command, classified from a frame id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    KeepAlive,
    Start,
    Stop,
    Reset,
    Reinit,
    Upload,
    Force,
    SetTrace,
    GetTrace,
    WaitTrace,
    ResetTrace,
    /// Any id without an inbound meaning, including the outbound-only tick.
    Unknown(u8),
}

impl Command {
    pub fn from_id(id: u8) -> Self {
        match id {
            KEEP_ALIVE => Command::KeepAlive,
            PLC_START => Command::Start,
            PLC_STOP => Command::Stop,
            PLC_RESET => Command::Reset,
            PLC_INIT => Command::Reinit,
            PLC_UPLOAD => Command::Upload,
            PLC_FORCE => Command::Force,
            PLC_SET_TRACE => Command::SetTrace,
            PLC_GET_TRACE => Command::GetTrace,
            PLC_WAIT_TRACE => Command::WaitTrace,
            PLC_RESET_TRACE => Command::ResetTrace,
            other => Command::Unknown(other),
        }
    }
}

/// Payload of get-trace and wait-trace: the variable index to sample.
pub fn decode_trace_index(payload: &[u8]) -> Result<usize, ProtocolError> {
    let bytes: [u8; 2] = take(payload, 0)?;
    Ok(u16::from_le_bytes(bytes) as usize)
}

/// Payload of set-trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTrace<'a> {
    pub index: usize,
    /// Variable size as the host believes it to be.
    pub size: usize,
    pub enable: bool,
    pub value: &'a [u8],
}

impl<'a> SetTrace<'a> {
    const INDEX: usize = 0;
    const SIZE: usize = 4;
    const ENABLE: usize = 8;
    const VALUE: usize = 9;

    pub fn decode(payload: &'a [u8]) -> Result<Self, ProtocolError> {
        let index: [u8; 4] = take(payload, Self::INDEX)?;
        let size: [u8; 4] = take(payload, Self::SIZE)?;
        let [enable]: [u8; 1] = take(payload, Self::ENABLE)?;

        Ok(Self {
            index: u32::from_le_bytes(index) as usize,
            size: u32::from_le_bytes(size) as usize,
            enable: enable != 0,
            value: &payload[Self::VALUE..],
        })
    }
}

/// Tick frame payload.
#[inline]
pub fn encode_tick(tick: u32) -> [u8; 4] {
    tick.to_le_bytes()
}

fn take<const N: usize>(payload: &[u8], offset: usize) -> Result<[u8; N], ProtocolError> {
    payload
        .get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ProtocolError::Truncated {
            expected: offset + N,
            actual: payload.len(),
        })
}
