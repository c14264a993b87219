//! Tracks the frame hierarchy of browser tabs to resolve the chain of
//! ancestor frames of a document.
//!
//! Content blocking needs to know in which context a frame lives: an ad
//! iframe nested inside a third party widget on `example.com` is evaluated
//! against all of its ancestors. The [`FrameRegistry`] builds that hierarchy
//! from the frame lifecycle events the browser reports and recovers from frame
//! id reuse, frames being replaced during navigation, and the loss of all state
//! when the background context is restarted.
//!
//! ```
//! use framewarden::{FrameId, FrameRegistry, FrameTarget, TabId};
//!
//! let mut registry = FrameRegistry::new();
//! let tab = TabId(7);
//! registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), "example.com");
//! registry.ancestors(&FrameTarget::child(tab, FrameId(1), FrameId::MAIN), "widget.net");
//!
//! let chain = registry.ancestors(&FrameTarget::child(tab, FrameId(2), FrameId(1)), "ads.com");
//! assert_eq!(chain, vec!["widget.net", "example.com"]);
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod frame;
pub mod handler;
pub mod tracker;

pub use crate::browser::BrowserApi;
pub use crate::config::{CleanupFlag, TrackerConfig, TrackerConfigBuilder};
pub use crate::error::{BrowserError, Result, TrackerError};
pub use crate::frame::{FrameDetails, FrameId, FrameSnapshot, FrameTarget, TabId};
pub use crate::handler::frame::{FrameEntry, FrameRegistry, TabEntry, TabEvent};
pub use crate::handler::Handler;
pub use crate::tracker::FrameTracker;
