use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;

/// Buffer of the channel between the trackers and the handler
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Shared switch indicating that tab cleanup is performed by another
/// mechanism.
///
/// While enabled, the handler ignores tab removal and replacement events and
/// the affected tabs are rebuilt lazily instead.
#[derive(Debug, Clone, Default)]
pub struct CleanupFlag(Arc<AtomicBool>);

impl CleanupFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    /// How many requests can be queued for the handler before senders wait.
    pub channel_capacity: usize,
    /// Initial state of the [`CleanupFlag`].
    pub alternate_cleanup: bool,
}

impl TrackerConfig {
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfigBuilder {
    channel_capacity: usize,
    alternate_cleanup: bool,
}

impl Default for TrackerConfigBuilder {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            alternate_cleanup: false,
        }
    }
}

impl TrackerConfigBuilder {
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn alternate_cleanup(mut self, enabled: bool) -> Self {
        self.alternate_cleanup = enabled;
        self
    }

    pub fn build(self) -> TrackerConfig {
        TrackerConfig {
            channel_capacity: self.channel_capacity,
            alternate_cleanup: self.alternate_cleanup,
        }
    }
}
