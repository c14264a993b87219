use futures::channel::mpsc::SendError;
use futures::channel::oneshot::Canceled;
use thiserror::Error;

use crate::frame::TabId;

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Browser(#[from] BrowserError),
    /// The `Handler` that owns the registry is no longer polled or was dropped.
    #[error("frame tracker handler is closed")]
    HandlerClosed,
}

impl From<SendError> for TrackerError {
    fn from(_: SendError) -> Self {
        TrackerError::HandlerClosed
    }
}

impl From<Canceled> for TrackerError {
    fn from(_: Canceled) -> Self {
        TrackerError::HandlerClosed
    }
}

/// Failures reported by the browser when querying tabs or frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    #[error("tab {0} is not accessible")]
    TabInaccessible(TabId),

    #[error("tab {0} is prerendering and can not be queried")]
    Prerendering(TabId),

    #[error("missing host permissions for tab {0}")]
    PermissionDenied(TabId),

    #[error("{0}")]
    Other(String),
}
