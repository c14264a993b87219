use std::pin::Pin;

use futures::channel::mpsc::Receiver;
use futures::channel::oneshot::Sender as OneshotSender;
use futures::stream::{Fuse, Stream, StreamExt};
use futures::task::{Context, Poll};

use crate::config::CleanupFlag;
use crate::frame::{FrameId, FrameTarget, TabId};
use crate::handler::frame::{FrameEntry, FrameRegistry, TabEntry, TabEvent};

pub mod frame;

/// The handler that owns the [`FrameRegistry`] and applies all the requests
/// sent by its [`FrameTracker`](crate::FrameTracker)s.
///
/// Messages are processed one at a time, each to completion before the next,
/// so all registry mutations are serialized without any locking.
///
/// As a stream it yields the tab lifecycle events that were applied. It ends
/// once all trackers are dropped.
#[must_use = "streams do nothing unless polled"]
#[derive(Debug)]
pub struct Handler<D> {
    registry: FrameRegistry<D>,
    /// Requests from the tracker handles
    from_tracker: Fuse<Receiver<HandlerMessage<D>>>,
    /// When set, tab events are left to another cleanup mechanism
    alternate_cleanup: CleanupFlag,
}

impl<D: Clone> Handler<D> {
    pub(crate) fn new(
        registry: FrameRegistry<D>,
        rx: Receiver<HandlerMessage<D>>,
        alternate_cleanup: CleanupFlag,
    ) -> Self {
        Self {
            registry,
            from_tracker: rx.fuse(),
            alternate_cleanup,
        }
    }

    /// The current state of all tracked tabs
    pub fn registry(&self) -> &FrameRegistry<D> {
        &self.registry
    }

    /// Applies a single request, returns the tab event if one was applied.
    fn on_message(&mut self, msg: HandlerMessage<D>) -> Option<TabEvent> {
        match msg {
            HandlerMessage::Ancestors(target, details, tx) => {
                let _ = tx.send(self.registry.ancestors(&target, details));
            }
            HandlerMessage::Unregister(tab_id, frame_id, tx) => {
                self.registry.unregister(tab_id, frame_id);
                let _ = tx.send(());
            }
            HandlerMessage::Replace(added, removed, tx) => {
                self.registry.replace(added, removed);
                let _ = tx.send(());
            }
            HandlerMessage::Sync(tab_id, frames, tx) => {
                self.registry.sync(tab_id, frames);
                let _ = tx.send(());
            }
            HandlerMessage::GetTab(tab_id, tx) => {
                let _ = tx.send(self.registry.tab(tab_id).cloned());
            }
            HandlerMessage::TabEvent(event, tx) => {
                let applied = self
                    .registry
                    .on_tab_event(event, self.alternate_cleanup.is_enabled());
                let _ = tx.send(applied);
                if applied {
                    return Some(event);
                }
                tracing::debug!(?event, "alternate cleanup active, skipping tab event");
            }
        }
        None
    }
}

impl<D: Clone + Unpin> Stream for Handler<D> {
    type Item = TabEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let pin = self.get_mut();
        loop {
            match Pin::new(&mut pin.from_tracker).poll_next(cx) {
                Poll::Ready(Some(msg)) => {
                    if let Some(event) = pin.on_message(msg) {
                        return Poll::Ready(Some(event));
                    }
                }
                // all trackers are gone
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Requests sent from a [`FrameTracker`](crate::FrameTracker) to the
/// [`Handler`], each with the sender half of the reply channel.
#[derive(Debug)]
pub(crate) enum HandlerMessage<D> {
    Ancestors(FrameTarget, D, OneshotSender<Vec<D>>),
    Unregister(TabId, FrameId, OneshotSender<()>),
    /// (added, removed)
    Replace(TabId, TabId, OneshotSender<()>),
    Sync(TabId, Vec<FrameEntry<D>>, OneshotSender<()>),
    GetTab(TabId, OneshotSender<Option<TabEntry<D>>>),
    TabEvent(TabEvent, OneshotSender<bool>),
}
