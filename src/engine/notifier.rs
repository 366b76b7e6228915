//! View notification contract

use super::session::InFlightGuard;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receiver of engine lifecycle events.
///
/// The engine holds notifiers weakly; once the last strong handle is gone
/// every notification becomes a no-op.
pub trait ViewNotifier: Send + Sync {
    /// New records are available. The engine admits no further fetch until
    /// `ready` is completed or dropped.
    fn on_data_available(&self, ready: DataReady);

    /// A refresh has reset the records; the view should clear itself
    fn on_refresh_starting(&self);

    /// A further page has been appended and persisted
    fn on_paging_ended(&self);

    /// A load failed
    fn on_error(&self, message: &str);
}

/// Completion token handed out with `on_data_available`.
///
/// Holds the engine's in-flight admission until the view is done with the
/// new data.
#[must_use = "dropping the token immediately re-admits fetches"]
pub struct DataReady {
    guard: InFlightGuard,
}

impl DataReady {
    pub(crate) fn new(guard: InFlightGuard) -> Self {
        Self { guard }
    }

    /// Signal that the view has rendered the new data
    pub fn done(self) {}
}

impl fmt::Debug for DataReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataReady")
            .field("epoch", &self.guard.epoch())
            .finish()
    }
}

/// Notification delivered by a [`ChannelNotifier`]
#[derive(Debug)]
pub enum ViewEvent {
    DataAvailable(DataReady),
    RefreshStarting,
    PagingEnded,
    Error(String),
}

/// Notifier that forwards events to an unbounded channel.
///
/// Events sent after the receiver is gone are dropped, which also releases
/// any data-ready token they carry.
#[derive(Debug)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn send(&self, event: ViewEvent) {
        let _ = self.tx.send(event);
    }
}

impl ViewNotifier for ChannelNotifier {
    fn on_data_available(&self, ready: DataReady) {
        self.send(ViewEvent::DataAvailable(ready));
    }

    fn on_refresh_starting(&self) {
        self.send(ViewEvent::RefreshStarting);
    }

    fn on_paging_ended(&self) {
        self.send(ViewEvent::PagingEnded);
    }

    fn on_error(&self, message: &str) {
        self.send(ViewEvent::Error(message.to_string()));
    }
}
