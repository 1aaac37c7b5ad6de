//! # Architecture Ports
//!
//! Hardware-specific pieces of the executive: the millisecond clock and
//! the reset/bootloader hooks. Currently the Cortex-M3 (STM32F1) port;
//! other targets add sibling modules.

pub mod cortex_m3;
