//! # Device Connection State Machine
//!
//! Owns the transport and models the connection lifecycle as an explicit
//! finite-state machine driven by awaited operations:
//!
//! ```text
//! Closed --open()--> Opening --(transport ready)--> Open
//! Open --write()--> Open            (write, then drain, before resolving)
//! Open --close()--> Draining --> Flushing --> Closing --> Closed
//! ```
//!
//! On a transport error the adapter logs it, discards the handle and
//! drops to `Closed` (the disconnect signal). Subsequent `write` calls
//! resolve silently without transmitting — deliberate tolerance of late
//! writes during shutdown races, so an in-flight close sequence is never
//! crashed by a straggler.
//!
//! All transport calls are blocking syscalls; the adapter ships each one
//! to the runtime's blocking pool and awaits it, so ordering is exactly
//! the call order while the cooperative thread stays free.

use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tokio::time::{self, Instant};

use crate::config::SerialConfig;
use crate::error::PapershotError;

use super::serial::SerialPort;
use super::Transport;

/// Creates the transport when the adapter opens. Runs on the blocking
/// pool, so it may perform the actual device open.
pub type TransportFactory =
    Arc<dyn Fn() -> Result<Box<dyn Transport>, PapershotError> + Send + Sync>;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Opening,
    Open,
    Draining,
    Flushing,
    Closing,
}

/// # Device Adapter
///
/// The single owner of the printer connection. Exactly one job drives the
/// adapter at a time; exclusivity is enforced by `&mut` ownership, so a
/// second concurrent job is unrepresentable.
pub struct DeviceAdapter {
    factory: TransportFactory,
    state: ConnectionState,
    port: Option<Box<dyn Transport>>,
    poll_interval: Duration,
    ready_timeout: Option<Duration>,
}

impl DeviceAdapter {
    /// Build an adapter over an arbitrary transport factory.
    pub fn new(
        factory: TransportFactory,
        poll_interval: Duration,
        ready_timeout: Option<Duration>,
    ) -> Self {
        Self {
            factory,
            state: ConnectionState::Closed,
            port: None,
            poll_interval,
            ready_timeout,
        }
    }

    /// Build an adapter that opens the serial device named by `config`.
    pub fn from_serial(config: &SerialConfig) -> Self {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let ready_timeout = config.ready_timeout_ms.map(Duration::from_millis);
        let serial = config.clone();
        let factory: TransportFactory = Arc::new(move || {
            let port = SerialPort::open(&serial)?;
            Ok(Box::new(port) as Box<dyn Transport>)
        });
        Self::new(factory, poll_interval, ready_timeout)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Open the connection. Idempotent: a no-op when already open.
    pub async fn open(&mut self) -> Result<(), PapershotError> {
        if self.state == ConnectionState::Open {
            return Ok(());
        }
        self.state = ConnectionState::Opening;
        let factory = Arc::clone(&self.factory);
        match task::spawn_blocking(move || factory()).await {
            Ok(Ok(port)) => {
                log::debug!("device open");
                self.port = Some(port);
                self.state = ConnectionState::Open;
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = ConnectionState::Closed;
                Err(e)
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                Err(PapershotError::Transport(format!(
                    "open task failed: {}",
                    e
                )))
            }
        }
    }

    /// Transmit `data`, then wait for the driver drain, before resolving.
    ///
    /// No subsequent write is accepted until both complete, which is what
    /// keeps strips strictly ordered on the wire. When the handle is gone
    /// (closed or disconnected) the call resolves silently without
    /// transmitting.
    pub async fn write(&mut self, data: Vec<u8>) -> Result<(), PapershotError> {
        if self.port.is_none() {
            log::debug!("write of {} bytes after close ignored", data.len());
            return Ok(());
        }
        let result = self
            .run_blocking(move |port| {
                port.write_all(&data)?;
                port.drain()
            })
            .await;
        if let Err(e) = &result {
            self.disconnect("write", e);
        }
        result
    }

    /// Wait until the printer signals it can accept more bytes.
    ///
    /// Polls DSR every `poll_interval`. When the transport exposes no DSR
    /// line, falls back to a single fixed wait and reports ready — a
    /// degraded mode, not a failure. Polling is unbounded unless a ready
    /// timeout was configured.
    pub async fn wait_ready(&mut self) -> Result<(), PapershotError> {
        let started = Instant::now();
        loop {
            if self.port.is_none() {
                // Disconnected mid-job: behave like a line-less tty so a
                // shutdown race cannot hang the caller.
                time::sleep(self.poll_interval).await;
                return Ok(());
            }
            let sample = self.run_blocking(|port| port.ready_line()).await;
            match sample {
                Ok(Some(true)) => return Ok(()),
                Ok(Some(false)) => {
                    if let Some(limit) = self.ready_timeout {
                        if started.elapsed() >= limit {
                            return Err(PapershotError::Transport(
                                "printer did not become ready within timeout".to_string(),
                            ));
                        }
                    }
                    time::sleep(self.poll_interval).await;
                }
                Ok(None) => {
                    time::sleep(self.poll_interval).await;
                    return Ok(());
                }
                Err(e) => {
                    self.disconnect("ready poll", &e);
                    return Err(e);
                }
            }
        }
    }

    /// Flush driver buffers. No-op when disconnected.
    pub async fn flush(&mut self) -> Result<(), PapershotError> {
        if self.port.is_none() {
            log::debug!("flush after close ignored");
            return Ok(());
        }
        let result = self.run_blocking(|port| port.flush()).await;
        if let Err(e) = &result {
            self.disconnect("flush", e);
        }
        result
    }

    /// Close the connection: drain, then flush, then close, in that order.
    ///
    /// Every step is attempted even when an earlier one errors; errors are
    /// logged and the first is returned after the sequence has still run
    /// to completion. `delay` sits between flush completion and the final
    /// close so the device can finish processing buffered bytes. The
    /// final state is always `Closed`.
    pub async fn close(&mut self, delay: Duration) -> Result<(), PapershotError> {
        if self.port.is_none() {
            self.state = ConnectionState::Closed;
            return Ok(());
        }
        let mut first_error = None;

        self.state = ConnectionState::Draining;
        if let Err(e) = self.run_blocking(|port| port.drain()).await {
            log::warn!("drain during close failed: {}", e);
            first_error.get_or_insert(e);
        }

        self.state = ConnectionState::Flushing;
        if self.port.is_some() {
            if let Err(e) = self.run_blocking(|port| port.flush()).await {
                log::warn!("flush during close failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        if !delay.is_zero() {
            time::sleep(delay).await;
        }

        self.state = ConnectionState::Closing;
        // Dropping the handle closes the descriptor and releases the lock
        self.port = None;
        self.state = ConnectionState::Closed;
        log::debug!("device closed");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run one blocking transport call on the blocking pool.
    async fn run_blocking<T, F>(&mut self, f: F) -> Result<T, PapershotError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Transport) -> Result<T, PapershotError> + Send + 'static,
    {
        let mut port = match self.port.take() {
            Some(port) => port,
            None => {
                return Err(PapershotError::Transport(
                    "device is not open".to_string(),
                ));
            }
        };
        match task::spawn_blocking(move || {
            let result = f(port.as_mut());
            (port, result)
        })
        .await
        {
            Ok((port, result)) => {
                self.port = Some(port);
                result
            }
            Err(e) => {
                // The handle was lost with the panicked task
                self.state = ConnectionState::Closed;
                Err(PapershotError::Transport(format!(
                    "blocking transport task failed: {}",
                    e
                )))
            }
        }
    }

    /// The disconnect signal: log, discard the handle, drop to `Closed`.
    fn disconnect(&mut self, during: &str, err: &PapershotError) {
        log::error!("transport error during {}: {}; disconnecting", during, err);
        self.port = None;
        self.state = ConnectionState::Closed;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{DsrScript, MockOp, MockTransport};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn adapter_for(mock: MockTransport) -> DeviceAdapter {
        let factory: TransportFactory = Arc::new(move || Ok(Box::new(mock.clone()) as Box<dyn Transport>));
        DeviceAdapter::new(factory, Duration::from_millis(1), None)
    }

    #[tokio::test]
    async fn test_open_transitions_to_open() {
        let mut adapter = adapter_for(MockTransport::new());
        assert_eq!(adapter.state(), ConnectionState::Closed);
        adapter.open().await.unwrap();
        assert_eq!(adapter.state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let opens = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&opens);
        let factory: TransportFactory = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockTransport::new()) as Box<dyn Transport>)
        });
        let mut adapter = DeviceAdapter::new(factory, Duration::from_millis(1), None);
        adapter.open().await.unwrap();
        adapter.open().await.unwrap();
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_returns_to_closed() {
        let factory: TransportFactory =
            Arc::new(|| Err(PapershotError::Transport("no such device".to_string())));
        let mut adapter = DeviceAdapter::new(factory, Duration::from_millis(1), None);
        assert!(adapter.open().await.is_err());
        assert_eq!(adapter.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_write_then_drain_before_resolving() {
        let mock = MockTransport::new();
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        adapter.write(vec![1, 2, 3]).await.unwrap();
        assert_eq!(
            mock.ops(),
            vec![MockOp::Write(vec![1, 2, 3]), MockOp::Drain]
        );
        assert_eq!(adapter.state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_write_on_closed_adapter_is_silent_noop() {
        let mock = MockTransport::new();
        let mut adapter = adapter_for(mock.clone());
        // Never opened: resolves without error, transmits nothing
        adapter.write(vec![0xFF; 16]).await.unwrap();
        assert!(mock.ops().is_empty());
    }

    #[tokio::test]
    async fn test_write_error_disconnects() {
        let mock = MockTransport::new().fail_write(1);
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        assert!(adapter.write(vec![1]).await.is_err());
        assert_eq!(adapter.state(), ConnectionState::Closed);
        // Later writes are tolerated no-ops, not errors
        adapter.write(vec![2]).await.unwrap();
        assert_eq!(mock.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_wait_ready_polls_until_asserted() {
        let mock = MockTransport::new().dsr(DsrScript::Sequence(VecDeque::from(vec![
            false, false, true,
        ])));
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        adapter.wait_ready().await.unwrap();
        let polls = mock
            .ops()
            .iter()
            .filter(|op| **op == MockOp::ReadyPoll)
            .count();
        assert_eq!(polls, 3);
    }

    #[tokio::test]
    async fn test_wait_ready_fallback_without_dsr_line() {
        let mock = MockTransport::new().dsr(DsrScript::NoLine);
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        // Resolves after a single fixed wait; does not hang
        adapter.wait_ready().await.unwrap();
        let polls = mock
            .ops()
            .iter()
            .filter(|op| **op == MockOp::ReadyPoll)
            .count();
        assert_eq!(polls, 1);
    }

    #[tokio::test]
    async fn test_wait_ready_timeout() {
        let mock = MockTransport::new().dsr(DsrScript::Sequence(VecDeque::from(vec![
            false; 10_000
        ])));
        let factory: TransportFactory =
            Arc::new(move || Ok(Box::new(mock.clone()) as Box<dyn Transport>));
        let mut adapter = DeviceAdapter::new(
            factory,
            Duration::from_millis(1),
            Some(Duration::from_millis(10)),
        );
        adapter.open().await.unwrap();
        assert!(adapter.wait_ready().await.is_err());
    }

    #[tokio::test]
    async fn test_close_runs_drain_flush_close_in_order() {
        let mock = MockTransport::new();
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        adapter.close(Duration::ZERO).await.unwrap();
        assert_eq!(mock.ops(), vec![MockOp::Drain, MockOp::Flush]);
        assert_eq!(adapter.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_completes_even_when_flush_errors() {
        let mock = MockTransport::new().fail_flush();
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        let result = adapter.close(Duration::ZERO).await;
        assert!(result.is_err());
        // Flush was still attempted after drain, and the state is Closed
        assert_eq!(mock.ops(), vec![MockOp::Drain, MockOp::Flush]);
        assert_eq!(adapter.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_reports_first_error() {
        let mock = MockTransport::new().fail_drain().fail_flush();
        let mut adapter = adapter_for(mock.clone());
        adapter.open().await.unwrap();
        let err = adapter.close(Duration::ZERO).await.unwrap_err();
        assert!(err.to_string().contains("drain"));
        assert_eq!(adapter.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_when_already_closed() {
        let mut adapter = adapter_for(MockTransport::new());
        adapter.close(Duration::ZERO).await.unwrap();
        assert_eq!(adapter.state(), ConnectionState::Closed);
    }
}
