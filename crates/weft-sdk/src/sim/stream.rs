//! Simulated commit event stream connection.

use crate::error::SdkError;
use crate::ports::CommitStream;
use crate::sim::network::SimInner;
use crate::types::{CommitEvent, TxId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One stream connection. Registrations live in the shared waiter table;
/// the connection tracks its own so close can release them. The close
/// counter backs resource-safety assertions in tests.
pub(crate) struct SimStream {
    inner: Arc<Mutex<SimInner>>,
    registered: Vec<String>,
    closed: bool,
}

impl SimStream {
    pub(crate) fn new(inner: Arc<Mutex<SimInner>>) -> Self {
        Self {
            inner,
            registered: Vec::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl CommitStream for SimStream {
    async fn register(&mut self, tx_id: &TxId) -> Result<oneshot::Receiver<CommitEvent>, SdkError> {
        if self.closed {
            return Err(SdkError::Stream("stream already closed".to_string()));
        }
        let (sender, receiver) = oneshot::channel();
        self.inner
            .lock()
            .waiters
            .entry(tx_id.as_str().to_string())
            .or_default()
            .push(sender);
        self.registered.push(tx_id.as_str().to_string());
        Ok(receiver)
    }

    async fn unregister(&mut self, tx_id: &TxId) {
        self.inner.lock().waiters.remove(tx_id.as_str());
        self.registered.retain(|t| t != tx_id.as_str());
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut inner = self.inner.lock();
        for tx in self.registered.drain(..) {
            inner.waiters.remove(&tx);
        }
        inner.streams_closed += 1;
    }
}
