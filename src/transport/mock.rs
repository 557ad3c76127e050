//! # Mock Transport
//!
//! A scriptable in-memory [`Transport`] for tests and `--dry-run` mode.
//! Records every call in order, can fail the Nth write (or drain/flush),
//! and can present any DSR behavior, including a tty with no modem lines
//! at all.
//!
//! The mock is cheaply cloneable; clones share one recording, so a test
//! can hand a clone to the device adapter and keep another for
//! assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::PapershotError;

use super::Transport;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Write(Vec<u8>),
    Drain,
    Flush,
    ReadyPoll,
}

/// Scripted DSR behavior.
#[derive(Debug, Clone, Default)]
pub enum DsrScript {
    /// Always asserted (printer always ready)
    #[default]
    AlwaysReady,
    /// The tty exposes no modem lines (`ready_line` returns `None`)
    NoLine,
    /// Fixed sequence of samples; once exhausted, always ready
    Sequence(VecDeque<bool>),
}

#[derive(Debug, Default)]
struct MockState {
    ops: Vec<MockOp>,
    write_calls: usize,
    fail_write_at: Option<usize>,
    fail_drain: bool,
    fail_flush: bool,
    dsr: DsrScript,
}

/// Shared-state fake transport.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th write call (1-based) with a transport error.
    pub fn fail_write(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_write_at = Some(n);
        self
    }

    /// Make every `drain` call fail.
    pub fn fail_drain(self) -> Self {
        self.state.lock().unwrap().fail_drain = true;
        self
    }

    /// Make every `flush` call fail.
    pub fn fail_flush(self) -> Self {
        self.state.lock().unwrap().fail_flush = true;
        self
    }

    /// Script the DSR line.
    pub fn dsr(self, script: DsrScript) -> Self {
        self.state.lock().unwrap().dsr = script;
        self
    }

    /// Every recorded call, in order.
    pub fn ops(&self) -> Vec<MockOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Payloads of the successful writes, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter_map(|op| match op {
                MockOp::Write(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of write calls attempted (including the failed one).
    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), PapershotError> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if state.fail_write_at == Some(state.write_calls) {
            return Err(PapershotError::Transport(
                "injected write failure".to_string(),
            ));
        }
        state.ops.push(MockOp::Write(data.to_vec()));
        Ok(())
    }

    fn drain(&mut self) -> Result<(), PapershotError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(MockOp::Drain);
        if state.fail_drain {
            return Err(PapershotError::Transport(
                "injected drain failure".to_string(),
            ));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PapershotError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(MockOp::Flush);
        if state.fail_flush {
            return Err(PapershotError::Transport(
                "injected flush failure".to_string(),
            ));
        }
        Ok(())
    }

    fn ready_line(&mut self) -> Result<Option<bool>, PapershotError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(MockOp::ReadyPoll);
        match &mut state.dsr {
            DsrScript::AlwaysReady => Ok(Some(true)),
            DsrScript::NoLine => Ok(None),
            DsrScript::Sequence(seq) => Ok(Some(seq.pop_front().unwrap_or(true))),
        }
    }
}
