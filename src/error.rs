//! # Errors
//!
//! Every failure in the executive is handled where it is detected: the
//! caller logs it and drops the offending request or frame. These types
//! carry enough detail for that log line; nothing is propagated to the
//! commissioning host, which has no error reply channel.

use thiserror::Error;

/// Rejected runtime configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("tick time of {tick_time_us} us derives a zero scan period")]
    ScanPeriodTooShort { tick_time_us: u64 },
}

/// A frame could not be handed to the link layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    #[error("payload of {len} bytes exceeds frame capacity of {capacity}")]
    PayloadTooLarge { len: usize, capacity: usize },
    #[error("transmit buffer full")]
    TxBufferFull,
}

/// A command payload did not match its wire layout.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    #[error("payload truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("payload of {len} bytes exceeds command buffer of {capacity}")]
    Oversized { len: usize, capacity: usize },
}

/// The single command slot refused a new frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotError {
    /// The previous command has not been taken by the dispatcher yet.
    #[error("command slot still holds an unconsumed command")]
    Occupied,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
