use futures::future::{self, BoxFuture};
use futures::stream::{FuturesUnordered, Stream, StreamExt};

use crate::error::BrowserError;
use crate::frame::{FrameSnapshot, TabId};

/// The browser queries needed to rebuild the registry after the background
/// context was restarted.
///
/// Implementations wrap the extension APIs that list the open tabs and the
/// frames of a single tab.
pub trait BrowserApi {
    /// All currently open tabs.
    fn tabs(&self) -> BoxFuture<'_, Result<Vec<TabId>, BrowserError>>;

    /// The live frame tree of the tab.
    fn frames(&self, tab_id: TabId) -> BoxFuture<'_, Result<Vec<FrameSnapshot>, BrowserError>>;
}

/// Queries the frames of all `tabs` concurrently and yields every tab as soon
/// as its own query resolves.
///
/// A slow tab only holds back itself. Tabs whose query fails are logged and
/// left out, so one inaccessible tab doesn't prevent the others from being
/// recovered.
pub(crate) fn frame_snapshots<'a, B>(
    browser: &'a B,
    tabs: Vec<TabId>,
) -> impl Stream<Item = (TabId, Vec<FrameSnapshot>)> + 'a
where
    B: BrowserApi + ?Sized + 'a,
{
    tabs.into_iter()
        .map(|tab_id| async move { (tab_id, browser.frames(tab_id).await) })
        .collect::<FuturesUnordered<_>>()
        .filter_map(|(tab_id, res)| {
            future::ready(match res {
                Ok(frames) => Some((tab_id, frames)),
                Err(err) => {
                    tracing::warn!(%tab_id, %err, "skipping tab while restoring frames");
                    None
                }
            })
        })
}
