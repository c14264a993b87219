use fnv::FnvHashMap;
use futures::{pin_mut, StreamExt};

use crate::browser::{frame_snapshots, BrowserApi};
use crate::error::Result;
use crate::frame::{FrameId, FrameSnapshot, FrameTarget, TabId};

/// A frame (document) currently believed to exist inside a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEntry<D> {
    pub id: FrameId,
    /// `None` for the top level frame of the tab
    pub parent: Option<FrameId>,
    /// Unique per document instance and never reused by the browser, unlike
    /// the frame id.
    pub document_id: Option<String>,
    /// Caller supplied payload, returned as is in ancestor chains
    pub details: D,
}

impl<D> FrameEntry<D> {
    pub fn new(
        id: FrameId,
        parent: Option<FrameId>,
        document_id: Option<String>,
        details: D,
    ) -> Self {
        Self {
            id,
            parent,
            document_id,
            details,
        }
    }

    pub fn from_target(target: &FrameTarget, details: D) -> Self {
        Self::new(
            target.frame_id,
            target.parent_frame_id,
            target.document_id.clone(),
            details,
        )
    }

    pub fn from_snapshot(snapshot: &FrameSnapshot, details: D) -> Self {
        Self::new(
            snapshot.frame_id,
            snapshot.parent_frame_id,
            snapshot.document_id.clone(),
            details,
        )
    }

    /// Converts a tab's frame snapshot, computing each frame's details with
    /// `normalize`.
    pub fn from_snapshots<F>(frames: &[FrameSnapshot], normalize: F) -> Vec<Self>
    where
        F: Fn(&FrameSnapshot) -> D,
    {
        frames
            .iter()
            .map(|frame| Self::from_snapshot(frame, normalize(frame)))
            .collect()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// All the frames tracked for a single tab.
///
/// The hierarchy is implicit: every frame only knows the id of its parent.
#[derive(Debug, Clone)]
pub struct TabEntry<D> {
    id: TabId,
    frames: FnvHashMap<FrameId, FrameEntry<D>>,
}

impl<D> TabEntry<D> {
    fn new(id: TabId) -> Self {
        Self {
            id,
            frames: Default::default(),
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn frame(&self, id: FrameId) -> Option<&FrameEntry<D>> {
        self.frames.get(&id)
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameEntry<D>> + '_ {
        self.frames.values()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn insert(&mut self, frame: FrameEntry<D>) {
        self.frames.insert(frame.id, frame);
    }

    /// The frame that currently hosts the document
    fn find_document(&self, document_id: &str) -> Option<FrameId> {
        self.frames
            .values()
            .find(|frame| frame.document_id.as_deref() == Some(document_id))
            .map(|frame| frame.id)
    }

    /// Moves all children of `from` to `to`
    fn reparent_children(&mut self, from: FrameId, to: FrameId) {
        for frame in self.frames.values_mut() {
            if frame.parent == Some(from) {
                frame.parent = Some(to);
            }
        }
    }

    /// Removes all transitive children of `id`, but not `id` itself.
    ///
    /// Frame trees can get deep, so this uses a worklist instead of recursion.
    fn remove_descendants(&mut self, id: FrameId) -> usize {
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(parent) = stack.pop() {
            let children: Vec<_> = self
                .frames
                .values()
                .filter(|frame| frame.parent == Some(parent))
                .map(|frame| frame.id)
                .collect();
            for child in children {
                if self.frames.remove(&child).is_some() {
                    removed += 1;
                    stack.push(child);
                }
            }
        }
        removed
    }

    /// Removes the frame and all of its transitive children
    fn remove_frames_recursively(&mut self, id: FrameId) -> usize {
        let own = usize::from(self.frames.remove(&id).is_some());
        own + self.remove_descendants(id)
    }
}

impl<D: Clone> TabEntry<D> {
    /// Collects the details of `parent` and all of its ancestors, immediate
    /// parent first.
    ///
    /// Returns `None` if the chain doesn't end in a root frame.
    fn ancestor_chain(&self, parent: FrameId) -> Option<Vec<D>> {
        let mut chain = Vec::new();
        let mut next = parent;
        loop {
            let frame = self.frames.get(&next)?;
            chain.push(frame.details.clone());
            match frame.parent {
                None => return Some(chain),
                // more ancestors than frames means the parent links form a cycle
                Some(_) if chain.len() >= self.frames.len() => return None,
                Some(parent) => next = parent,
            }
        }
    }
}

/// Lifecycle notifications of whole tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    /// The tab was closed.
    Removed(TabId),
    /// The browser swapped the tab `removed` for `added`, for example when a
    /// prerendered tab gets activated.
    Replaced { added: TabId, removed: TabId },
}

/// Tracks the frame hierarchy of every tab and resolves the ancestor chain of
/// a frame.
///
/// Tabs are fully isolated from each other: no operation on one tab reads or
/// modifies the frames of another.
#[derive(Debug, Clone)]
pub struct FrameRegistry<D> {
    tabs: FnvHashMap<TabId, TabEntry<D>>,
}

impl<D> FrameRegistry<D> {
    pub fn new() -> Self {
        Self {
            tabs: Default::default(),
        }
    }

    pub fn contains_tab(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    pub fn tab(&self, tab_id: TabId) -> Option<&TabEntry<D>> {
        self.tabs.get(&tab_id)
    }

    pub fn tabs(&self) -> impl Iterator<Item = &TabEntry<D>> + '_ {
        self.tabs.values()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// The number of frames tracked for the tab
    pub fn frame_count(&self, tab_id: TabId) -> usize {
        self.tabs.get(&tab_id).map(TabEntry::len).unwrap_or_default()
    }

    pub fn frame(&self, tab_id: TabId, frame_id: FrameId) -> Option<&FrameEntry<D>> {
        self.tabs.get(&tab_id).and_then(|tab| tab.frame(frame_id))
    }

    /// Removes the frame and everything nested inside it.
    ///
    /// The tab is dropped once it has no frames left.
    pub fn unregister(&mut self, tab_id: TabId, frame_id: FrameId) {
        if let Some(tab) = self.tabs.get_mut(&tab_id) {
            let removed = tab.remove_frames_recursively(frame_id);
            tracing::trace!(%tab_id, %frame_id, removed, "unregistered frames");
            if tab.is_empty() {
                self.tabs.remove(&tab_id);
            }
        }
    }

    /// Moves the frames of `removed_tab_id` to `added_tab_id`.
    pub fn replace(&mut self, added_tab_id: TabId, removed_tab_id: TabId) {
        if let Some(mut tab) = self.tabs.remove(&removed_tab_id) {
            tab.id = added_tab_id;
            self.tabs.insert(added_tab_id, tab);
        }
    }

    /// Replaces all frames of the tab with `frames`.
    ///
    /// Unlike [`FrameRegistry::ancestors`] this doesn't reconcile with the
    /// current state, the given frames are taken as the truth. An empty set of
    /// frames removes the tab.
    pub fn sync<I>(&mut self, tab_id: TabId, frames: I)
    where
        I: IntoIterator<Item = FrameEntry<D>>,
    {
        let mut tab = TabEntry::new(tab_id);
        for frame in frames {
            tab.insert(frame);
        }
        tracing::trace!(%tab_id, frames = tab.len(), "synced frames");
        if tab.is_empty() {
            self.tabs.remove(&tab_id);
        } else {
            self.tabs.insert(tab_id, tab);
        }
    }

    /// Applies a tab lifecycle event.
    ///
    /// Nothing happens while `alternate_cleanup` is set, the tab's state is
    /// then rebuilt lazily instead. Returns whether the event was applied.
    pub fn on_tab_event(&mut self, event: TabEvent, alternate_cleanup: bool) -> bool {
        if alternate_cleanup {
            return false;
        }
        match event {
            TabEvent::Removed(tab_id) => self.unregister(tab_id, FrameId::MAIN),
            TabEvent::Replaced { added, removed } => self.replace(added, removed),
        }
        true
    }
}

impl<D: Clone> FrameRegistry<D> {
    /// Records the frame and returns the details of all of its ancestors,
    /// immediate parent first and the tab's root last.
    ///
    /// The chain is empty for root frames and whenever the ancestry can't be
    /// resolved completely. In the latter case the whole tab is dropped so the
    /// next root registration starts from a clean state.
    pub fn ancestors(&mut self, target: &FrameTarget, details: D) -> Vec<D> {
        let tab_id = target.tab_id;
        let frame_id = target.frame_id;

        let tab = match self.tabs.get_mut(&tab_id) {
            Some(tab) => tab,
            None => {
                // a subframe alone says nothing about the rest of the tab
                if target.is_root() {
                    let mut tab = TabEntry::new(tab_id);
                    tab.insert(FrameEntry::from_target(target, details));
                    self.tabs.insert(tab_id, tab);
                }
                return Vec::new();
            }
        };

        if let Some(frame) = tab.frame(frame_id) {
            if frame.is_root() {
                // the top level document navigated, nothing nested in the previous
                // document survives
                let purged = tab.remove_descendants(frame_id);
                tracing::trace!(%tab_id, %frame_id, purged, "root frame navigated");
            }
            tab.insert(FrameEntry::from_target(target, details));
        } else if let Some(previous) = target
            .document_id
            .as_deref()
            .and_then(|document_id| tab.find_document(document_id))
        {
            // same document under a new frame id
            tracing::trace!(%tab_id, from = %previous, to = %frame_id, "frame replaced");
            tab.reparent_children(previous, frame_id);
            tab.frames.remove(&previous);
            tab.insert(FrameEntry::from_target(target, details));
        } else {
            tab.insert(FrameEntry::from_target(target, details));
        }

        let parent = match target.parent_frame_id {
            Some(parent) => parent,
            None => return Vec::new(),
        };

        match tab.ancestor_chain(parent) {
            Some(chain) => chain,
            None => {
                tracing::warn!(
                    %tab_id,
                    %frame_id,
                    %parent,
                    "incomplete frame hierarchy, dropping tab"
                );
                self.tabs.remove(&tab_id);
                Vec::new()
            }
        }
    }

    /// Rebuilds the state of every open tab from the browser.
    ///
    /// Meant to run when the background context starts, as all in-memory
    /// state is lost whenever the browser terminates it. The frames of all
    /// tabs are queried concurrently and each tab is synced as soon as its
    /// own query resolves; tabs that can't be queried are skipped.
    /// Returns the number of tabs that were synced.
    pub async fn handle_web_worker_start<B, F>(
        &mut self,
        browser: &B,
        normalize: F,
    ) -> Result<usize>
    where
        B: BrowserApi + ?Sized,
        F: Fn(&FrameSnapshot) -> D,
    {
        let tabs = browser.tabs().await?;
        let snapshots = frame_snapshots(browser, tabs);
        pin_mut!(snapshots);

        let mut synced = 0;
        while let Some((tab_id, frames)) = snapshots.next().await {
            self.sync(tab_id, FrameEntry::from_snapshots(&frames, &normalize));
            synced += 1;
        }
        tracing::debug!(synced, "restored frame hierarchy");
        Ok(synced)
    }
}

impl<D> Default for FrameRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}
