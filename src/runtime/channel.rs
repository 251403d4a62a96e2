//! Event channel
//!
//! Multi-producer, sequential-consumer async queue used inside generated
//! fakes to let tests await a specific simulated event. Publishing never
//! blocks; each `wait_next` call consumes exactly one item, FIFO across
//! calls. `reset` installs a brand-new empty queue and releases any waiter
//! still parked on the old one.

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Failures surfaced by [`EventChannel::wait_next`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The cancellation token fired before an item arrived. No item was
    /// consumed.
    #[error("wait for next event was canceled")]
    Canceled,

    /// The channel was reset while this wait was outstanding.
    #[error("event channel was reset while waiting")]
    Closed,

    /// Another `wait_next` call is already pending. Consumption is
    /// sequential.
    #[error("another waiter is already pending on this channel")]
    WaiterBusy,
}

struct Slot<T> {
    tx: mpsc::UnboundedSender<T>,
    /// Taken by the active waiter; present whenever no wait is in flight.
    rx: Option<mpsc::UnboundedReceiver<T>>,
    /// Bumped on every reset so a returning waiter can tell its receiver is
    /// stale.
    epoch: u64,
}

/// Unbounded multi-producer queue with sequential consumption.
pub struct EventChannel<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Send> EventChannel<T> {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            slot: Mutex::new(Slot {
                tx,
                rx: Some(rx),
                epoch: 0,
            }),
        }
    }

    /// Enqueue an event. Never blocks and never fails in normal operation.
    pub fn publish(&self, value: T) {
        let slot = self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.tx.send(value).is_err() {
            // Only possible if the active waiter's task was dropped with the
            // receiver; the event is discarded with it.
            tracing::trace!("publish on event channel with dropped receiver");
        }
    }

    /// Await the next event, FIFO across calls.
    ///
    /// Resolves as soon as an item is available, removing it. Fails with
    /// [`ChannelError::Canceled`] when the token fires first (an
    /// already-cancelled token fails immediately, consuming nothing) and
    /// with [`ChannelError::Closed`] when the channel is reset mid-wait.
    pub async fn wait_next(&self, cancel: &CancellationToken) -> Result<T, ChannelError> {
        let (mut rx, epoch) = {
            let mut slot = self
                .slot
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let rx = slot.rx.take().ok_or(ChannelError::WaiterBusy)?;
            (rx, slot.epoch)
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ChannelError::Canceled),
            item = rx.recv() => item.ok_or(ChannelError::Closed),
        };

        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.epoch == epoch {
            slot.rx = Some(rx);
        }

        outcome
    }

    /// Install a fresh empty queue. The old queue's buffer is discarded and
    /// a waiter still parked on it resolves with [`ChannelError::Closed`].
    pub fn reset(&self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        slot.tx = tx;
        slot.rx = Some(rx);
        slot.epoch += 1;
        tracing::trace!(epoch = slot.epoch, "event channel reset");
    }
}

impl<T: Send> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_then_wait_returns_item() {
        let channel = EventChannel::new();
        channel.publish(7u32);

        let token = CancellationToken::new();
        assert_eq!(channel.wait_next(&token).await, Ok(7));
    }

    #[tokio::test]
    async fn test_second_concurrent_waiter_is_rejected() {
        let channel: std::sync::Arc<EventChannel<u32>> = std::sync::Arc::new(EventChannel::new());
        let token = CancellationToken::new();

        let waiting = std::sync::Arc::clone(&channel);
        let inner_token = token.clone();
        let pending = tokio::spawn(async move { waiting.wait_next(&inner_token).await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(
            channel.wait_next(&token).await,
            Err(ChannelError::WaiterBusy)
        );

        token.cancel();
        assert_eq!(pending.await.unwrap(), Err(ChannelError::Canceled));
    }
}
