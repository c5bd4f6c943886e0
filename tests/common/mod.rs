//! Shared test helpers: a scripted in-memory frame transport.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ordered_websocket::protocol::CONTINUATION_OPCODE;
use ordered_websocket::{Error, FrameTransport, ReceivedFrame, Result};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Scripted Receive
// ============================================================================

/// One scripted step of the receive side.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// A fragment to copy into the caller's slice.
    Fragment {
        opcode: u8,
        data: Vec<u8>,
        is_final: bool,
    },
    /// A report returned verbatim without touching the buffer.
    Report(ReceivedFrame),
    /// A transport failure.
    Fail(String),
}

impl Incoming {
    pub fn fragment(opcode: u8, data: &[u8], is_final: bool) -> Self {
        Self::Fragment {
            opcode,
            data: data.to_vec(),
            is_final,
        }
    }
}

// ============================================================================
// Recorded Send
// ============================================================================

/// A frame the transport was asked to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub data: Vec<u8>,
    pub opcode: u8,
    pub is_final: bool,
}

// ============================================================================
// MockTransport
// ============================================================================

/// In-memory [`FrameTransport`] with scripted receives and recorded sends.
///
/// Detects overlapping `send_frame` calls.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentFrame>>,
    completed: AtomicUsize,
    in_flight: AtomicBool,
    overlaps: AtomicUsize,
    send_delay: Duration,
    fail_payloads: Vec<Vec<u8>>,
    gate: Option<Semaphore>,
    incoming: Mutex<VecDeque<Incoming>>,
    hang_when_empty: bool,
    closes: Mutex<Vec<(u16, String)>>,
    fail_close: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send sleeps this long before completing.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Sends with exactly this payload fail with a transport error.
    pub fn failing_on(mut self, payload: &[u8]) -> Self {
        self.fail_payloads.push(payload.to_vec());
        self
    }

    /// Sends block until [`release`](Self::release) grants permits.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Queues scripted receive steps.
    pub fn with_incoming(self, steps: impl IntoIterator<Item = Incoming>) -> Self {
        self.incoming.lock().extend(steps);
        self
    }

    /// An empty receive script waits for cancellation instead of failing.
    pub fn hanging_when_empty(mut self) -> Self {
        self.hang_when_empty = true;
        self
    }

    /// Close requests fail with a transport error.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Lets `count` gated sends proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Frames in the order the transport started writing them.
    pub fn sent(&self) -> Vec<SentFrame> {
        self.sent.lock().clone()
    }

    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.sent.lock().iter().map(|f| f.data.clone()).collect()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> Vec<(u16, String)> {
        self.closes.lock().clone()
    }
}

#[async_trait]
impl FrameTransport for MockTransport {
    async fn send_frame(
        &self,
        data: &[u8],
        opcode: u8,
        is_final: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        self.sent.lock().push(SentFrame {
            data: data.to_vec(),
            opcode,
            is_final,
        });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = async {
                if let Some(gate) = &self.gate {
                    if let Ok(permit) = gate.acquire().await {
                        permit.forget();
                    }
                }
                tokio::time::sleep(self.send_delay).await;
            } => {
                if self.fail_payloads.iter().any(|p| p.as_slice() == data) {
                    Err(Error::transport("scripted send failure"))
                } else {
                    Ok(())
                }
            }
        };

        self.completed.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn receive_frame(
        &self,
        buffer: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ReceivedFrame> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let step = self.incoming.lock().pop_front();
        match step {
            Some(Incoming::Fragment {
                opcode,
                data,
                is_final,
            }) => {
                let count = data.len().min(buffer.len());
                buffer[..count].copy_from_slice(&data[..count]);
                if count < data.len() {
                    // Keep the rest for the next call, like a real transport would.
                    self.incoming.lock().push_front(Incoming::Fragment {
                        opcode: CONTINUATION_OPCODE,
                        data: data[count..].to_vec(),
                        is_final,
                    });
                    return Ok(ReceivedFrame::new(opcode, false, count));
                }
                Ok(ReceivedFrame::new(opcode, is_final, count))
            }
            Some(Incoming::Report(report)) => Ok(report),
            Some(Incoming::Fail(message)) => Err(Error::transport(message)),
            None if self.hang_when_empty => {
                cancel.cancelled().await;
                Err(Error::Cancelled)
            }
            None => Err(Error::ConnectionClosed),
        }
    }

    async fn close_connection(
        &self,
        status: u16,
        description: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        if self.fail_close {
            return Err(Error::transport("scripted close failure"));
        }
        self.closes.lock().push((status, description.to_owned()));
        Ok(())
    }
}
