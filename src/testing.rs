//! Host-side test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::board::Board;
use crate::error::LinkError;
use crate::link::{RawFrame, Transport};
use crate::plc::{LogicExecutor, VariableBackend};

/// Transport that delivers pre-scripted frames and records what is sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub inbound: VecDeque<(u8, Vec<u8>)>,
    pub rx_bytes: VecDeque<u8>,
    pub bytes_fed: Vec<u8>,
    pub sent: Vec<(u8, Vec<u8>)>,
    pub resets: u32,
    pub refuse: bool,
    current: Option<(u8, Vec<u8>)>,
}

impl ScriptedTransport {
    pub fn push_frame(&mut self, id: u8, payload: &[u8]) {
        self.inbound.push_back((id, payload.to_vec()));
    }

    pub fn sent_ids(&self) -> Vec<u8> {
        self.sent.iter().map(|(id, _)| *id).collect()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Transport for ScriptedTransport {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx_bytes.pop_front()
    }

    fn poll(&mut self, byte: Option<u8>, _now_ms: u32) -> Option<RawFrame<'_>> {
        if let Some(byte) = byte {
            self.bytes_fed.push(byte);
        }
        self.current = self.inbound.pop_front();
        self.current.as_ref().map(|(id, payload)| RawFrame {
            id: *id,
            payload: payload.as_slice(),
        })
    }

    fn queue_frame(&mut self, id: u8, payload: &[u8]) -> Result<(), LinkError> {
        if self.refuse {
            return Err(LinkError::TxBufferFull);
        }
        self.sent.push((id, payload.to_vec()));
        Ok(())
    }

    fn reset(&mut self, _inform_peer: bool) {
        self.resets += 1;
    }
}

/// Program recording every call, with a fixed variable table.
#[derive(Debug, Default)]
pub struct TestProgram {
    pub inits: u32,
    pub runs: Vec<u32>,
    pub values: Vec<Vec<u8>>,
    pub traces: Vec<(usize, bool, Vec<u8>)>,
    pub forced: Vec<Vec<u8>>,
    pub trace_resets: u32,
}

impl TestProgram {
    pub fn with_values(values: &[&[u8]]) -> Self {
        Self {
            values: values.iter().map(|v| v.to_vec()).collect(),
            ..Self::default()
        }
    }
}

impl LogicExecutor for TestProgram {
    fn init(&mut self) {
        self.inits += 1;
    }

    fn run(&mut self, tick: u32) {
        self.runs.push(tick);
    }
}

impl VariableBackend for TestProgram {
    fn var_size(&self, index: usize) -> usize {
        self.values.get(index).map_or(0, Vec::len)
    }

    fn var_value(&self, index: usize) -> &[u8] {
        self.values.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    fn set_trace(&mut self, index: usize, enable: bool, value: &[u8]) {
        self.traces.push((index, enable, value.to_vec()));
    }

    fn force(&mut self, payload: &[u8]) {
        self.forced.push(payload.to_vec());
    }

    fn reset_trace(&mut self) {
        self.trace_resets += 1;
    }
}

/// Board recording reset and bootloader requests.
#[derive(Debug, Default)]
pub struct TestBoard {
    pub run_switch: bool,
    pub resets: u32,
    pub bootloader: u32,
}

impl Board for TestBoard {
    fn run_switch(&mut self) -> bool {
        self.run_switch
    }

    fn system_reset(&mut self) {
        self.resets += 1;
    }

    fn enter_bootloader(&mut self) {
        self.bootloader += 1;
    }
}

/// Output pin remembering its level and how often it changed.
#[derive(Debug, Default)]
pub struct FakeLed {
    pub high: bool,
    pub edges: u32,
}

impl ErrorType for FakeLed {
    type Error = Infallible;
}

impl OutputPin for FakeLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            self.edges += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.edges += 1;
        }
        self.high = true;
        Ok(())
    }
}
