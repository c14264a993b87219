use futures::channel::mpsc::{channel, Sender};
use futures::channel::oneshot::{channel as oneshot_channel, Sender as OneshotSender};
use futures::{pin_mut, SinkExt, Stream, StreamExt};

use crate::browser::{frame_snapshots, BrowserApi};
use crate::config::{CleanupFlag, TrackerConfig};
use crate::error::Result;
use crate::frame::{FrameId, FrameSnapshot, FrameTarget, TabId};
use crate::handler::frame::{FrameEntry, FrameRegistry, TabEntry, TabEvent};
use crate::handler::{Handler, HandlerMessage};

/// Cloneable handle to a [`FrameRegistry`] owned by a [`Handler`].
///
/// The handler must be polled for any request to make progress:
///
/// ```no_run
/// # use framewarden::*;
/// # use futures::StreamExt;
/// # async fn run() -> Result<()> {
/// let (tracker, mut handler) = FrameTracker::<FrameDetails>::new(TrackerConfig::default());
/// let _handle = std::thread::spawn(move || {
///     futures::executor::block_on(async { while handler.next().await.is_some() {} })
/// });
/// let chain = tracker
///     .ancestors(FrameTarget::root(TabId(1), FrameId::MAIN), FrameDetails::new("example.com"))
///     .await?;
/// assert!(chain.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FrameTracker<D> {
    /// The `Sender` to send requests to the handler that owns the registry
    sender: Sender<HandlerMessage<D>>,
    alternate_cleanup: CleanupFlag,
}

impl<D> Clone for FrameTracker<D> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            alternate_cleanup: self.alternate_cleanup.clone(),
        }
    }
}

impl<D: Clone> FrameTracker<D> {
    /// Creates a tracker with an empty registry.
    pub fn new(config: TrackerConfig) -> (Self, Handler<D>) {
        Self::with_registry(config, FrameRegistry::new())
    }

    /// Creates a tracker that continues with an existing registry.
    pub fn with_registry(
        config: TrackerConfig,
        registry: FrameRegistry<D>,
    ) -> (Self, Handler<D>) {
        let (tx, rx) = channel(config.channel_capacity);
        let alternate_cleanup = CleanupFlag::new(config.alternate_cleanup);
        let handler = Handler::new(registry, rx, alternate_cleanup.clone());
        let tracker = Self {
            sender: tx,
            alternate_cleanup,
        };
        (tracker, handler)
    }

    /// The flag consulted by the handler for every tab event.
    pub fn cleanup_flag(&self) -> &CleanupFlag {
        &self.alternate_cleanup
    }

    async fn request<T>(
        &self,
        msg: impl FnOnce(OneshotSender<T>) -> HandlerMessage<D>,
    ) -> Result<T> {
        let (tx, rx) = oneshot_channel();
        self.sender.clone().send(msg(tx)).await?;
        Ok(rx.await?)
    }

    /// See [`FrameRegistry::ancestors`]
    pub async fn ancestors(&self, target: FrameTarget, details: D) -> Result<Vec<D>> {
        self.request(|tx| HandlerMessage::Ancestors(target, details, tx)).await
    }

    /// See [`FrameRegistry::unregister`]
    pub async fn unregister(&self, tab_id: TabId, frame_id: FrameId) -> Result<()> {
        self.request(|tx| HandlerMessage::Unregister(tab_id, frame_id, tx)).await
    }

    /// See [`FrameRegistry::replace`]
    pub async fn replace(&self, added_tab_id: TabId, removed_tab_id: TabId) -> Result<()> {
        self.request(|tx| HandlerMessage::Replace(added_tab_id, removed_tab_id, tx))
            .await
    }

    /// See [`FrameRegistry::sync`]
    pub async fn sync(&self, tab_id: TabId, frames: Vec<FrameEntry<D>>) -> Result<()> {
        self.request(|tx| HandlerMessage::Sync(tab_id, frames, tx)).await
    }

    /// A copy of the tab's current frames
    pub async fn tab(&self, tab_id: TabId) -> Result<Option<TabEntry<D>>> {
        self.request(|tx| HandlerMessage::GetTab(tab_id, tx)).await
    }

    /// Applies a tab lifecycle event unless the alternate cleanup is active.
    ///
    /// Returns whether the event was applied.
    pub async fn tab_event(&self, event: TabEvent) -> Result<bool> {
        self.request(|tx| HandlerMessage::TabEvent(event, tx)).await
    }

    /// Rebuilds the state of every open tab from the browser.
    ///
    /// The browser is queried from the calling task, concurrently for all
    /// tabs, so the handler keeps serving other requests in the meantime.
    /// Each tab is synced with its own request as soon as its query resolves.
    pub async fn handle_web_worker_start<B, F>(&self, browser: &B, normalize: F) -> Result<usize>
    where
        B: BrowserApi + ?Sized,
        F: Fn(&FrameSnapshot) -> D,
    {
        let tabs = browser.tabs().await?;
        let snapshots = frame_snapshots(browser, tabs);
        pin_mut!(snapshots);

        let mut synced = 0;
        while let Some((tab_id, frames)) = snapshots.next().await {
            self.sync(tab_id, FrameEntry::from_snapshots(&frames, &normalize))
                .await?;
            synced += 1;
        }
        tracing::debug!(synced, "restored frame hierarchy");
        Ok(synced)
    }

    /// Forwards the browser's tab lifecycle events to the handler until the
    /// stream ends.
    pub async fn handle_webextension_events<S>(&self, events: S) -> Result<()>
    where
        S: Stream<Item = TabEvent>,
    {
        pin_mut!(events);
        while let Some(event) = events.next().await {
            self.tab_event(event).await?;
        }
        Ok(())
    }
}
