//! Cancellable live event channels
//!
//! A subscription hands back an [`EventChannel`]: the receiving half of an
//! unbounded push channel plus a [`ChannelHandle`] that owns cancellation.
//! Closing is idempotent and close-on-drop; once `close()` returns, the
//! sending half drops every further delivery, so no new event can reach a
//! consumer. Deliveries already buffered at the moment of close may still
//! drain.
//!
//! Faulted deliveries (a payload that failed to parse, a transport error)
//! travel on the same channel as `Err(StreamError)` and never close it.

use agora_core::StreamError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One delivery on a live channel: an event, or a non-fatal stream fault.
pub type Delivery<T> = Result<T, StreamError>;

/// Sending half of a live channel, held by the transport.
pub struct EventSender<T> {
    tx: mpsc::UnboundedSender<Delivery<T>>,
    closed: Arc<AtomicBool>,
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<T> EventSender<T> {
    /// Deliver an event. Returns `false` when the channel is closed (the
    /// delivery is dropped) or the receiver is gone.
    pub fn deliver(&self, item: T) -> bool {
        self.push(Ok(item))
    }

    /// Deliver a non-fatal stream fault. The channel stays open.
    pub fn fault(&self, error: StreamError) -> bool {
        self.push(Err(error))
    }

    /// Whether the consumer has closed this channel.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    fn push(&self, delivery: Delivery<T>) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.tx.send(delivery).is_ok()
    }
}

impl<T> fmt::Debug for EventSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

/// Owner of one live subscription's cancellation.
///
/// `close()` is idempotent; the first call runs the transport's close hook
/// (e.g. sending a stop frame) and flips the shared flag the sender checks
/// before every delivery. Dropping the handle closes it as a backstop.
pub struct ChannelHandle {
    closed: Arc<AtomicBool>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl ChannelHandle {
    /// Stop delivery. After this returns, no new event is observable on the
    /// paired receiver; already-buffered deliveries may still drain.
    pub fn close(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            if let Some(hook) = self.on_close.take() {
                hook();
            }
        }
    }

    /// Whether this channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

/// Receiving half of a live channel, consumed by an event pump.
pub struct EventReceiver<T> {
    rx: mpsc::UnboundedReceiver<Delivery<T>>,
}

impl<T> EventReceiver<T> {
    /// Wait for the next delivery. Returns `None` once every sender is gone
    /// and the buffer is drained.
    pub async fn recv(&mut self) -> Option<Delivery<T>> {
        self.rx.recv().await
    }

    /// Take a buffered delivery without waiting, if one is ready.
    pub fn try_recv(&mut self) -> Option<Delivery<T>> {
        self.rx.try_recv().ok()
    }
}

impl<T> fmt::Debug for EventReceiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventReceiver").finish_non_exhaustive()
    }
}

/// A live subscription: receiver plus its cancellation handle.
#[derive(Debug)]
pub struct EventChannel<T> {
    handle: ChannelHandle,
    receiver: EventReceiver<T>,
}

impl<T> EventChannel<T> {
    /// Create a channel pair with no transport close hook.
    pub fn pair() -> (EventSender<T>, EventChannel<T>) {
        Self::pair_with_close(|| {})
    }

    /// Create a channel pair whose first `close()` runs `on_close` (used by
    /// transports to send a stop frame and drop their routing entry).
    pub fn pair_with_close(on_close: impl FnOnce() + Send + 'static) -> (EventSender<T>, EventChannel<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let sender = EventSender {
            tx,
            closed: closed.clone(),
        };
        let channel = EventChannel {
            handle: ChannelHandle {
                closed,
                on_close: Some(Box::new(on_close)),
            },
            receiver: EventReceiver { rx },
        };
        (sender, channel)
    }

    /// Split into the cancellation handle and the receiving half, so a view
    /// can keep the handle while an event pump consumes deliveries.
    pub fn split(self) -> (ChannelHandle, EventReceiver<T>) {
        (self.handle, self.receiver)
    }

    /// Wait for the next delivery.
    pub async fn recv(&mut self) -> Option<Delivery<T>> {
        self.receiver.recv().await
    }
}
