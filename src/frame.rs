//! Identifiers and wire shapes of the frame lifecycle facts reported by the
//! browser's navigation APIs.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// The value browsers use for `parentFrameId` of a top level frame.
pub const NO_PARENT_FRAME: i64 = -1;

/// Identifier of a browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TabId {
    fn from(id: i64) -> Self {
        TabId(id)
    }
}

/// Identifier of a frame within a tab.
///
/// Frame ids are assigned by the browser and get reused: the top level frame
/// is always `0`, no matter how often the tab navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub i64);

impl FrameId {
    /// The frame id of a tab's top level document.
    pub const MAIN: FrameId = FrameId(0);

    /// Converts a raw `parentFrameId` into a parent, `-1` means there is none.
    pub fn parent_from_raw(raw: i64) -> Option<FrameId> {
        if raw == NO_PARENT_FRAME {
            None
        } else {
            Some(FrameId(raw))
        }
    }

    /// Inverse of [`FrameId::parent_from_raw`]
    pub fn parent_to_raw(parent: Option<FrameId>) -> i64 {
        parent.map(|id| id.0).unwrap_or(NO_PARENT_FRAME)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for FrameId {
    fn from(id: i64) -> Self {
        FrameId(id)
    }
}

/// The frame a navigation event was reported for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTarget {
    pub tab_id: TabId,
    pub frame_id: FrameId,
    #[serde(with = "parent_frame_id")]
    pub parent_frame_id: Option<FrameId>,
    /// Unique per document instance, `None` if the browser doesn't provide it.
    #[serde(default, deserialize_with = "non_empty")]
    pub document_id: Option<String>,
}

impl FrameTarget {
    /// A top level frame of the tab
    pub fn root(tab_id: TabId, frame_id: FrameId) -> Self {
        Self {
            tab_id,
            frame_id,
            parent_frame_id: None,
            document_id: None,
        }
    }

    /// A frame nested inside `parent`
    pub fn child(tab_id: TabId, frame_id: FrameId, parent: FrameId) -> Self {
        Self {
            tab_id,
            frame_id,
            parent_frame_id: Some(parent),
            document_id: None,
        }
    }

    /// Sets the document identifier, an empty string is treated as absent.
    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        let document_id = document_id.into();
        self.document_id = if document_id.is_empty() {
            None
        } else {
            Some(document_id)
        };
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_frame_id.is_none()
    }
}

/// One frame of a tab as returned by the browser's "list all frames" query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub frame_id: FrameId,
    #[serde(with = "parent_frame_id")]
    pub parent_frame_id: Option<FrameId>,
    #[serde(default, deserialize_with = "non_empty")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub url: String,
}

/// The payload the registry stores per frame unless the caller brings its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDetails {
    pub hostname: String,
}

impl FrameDetails {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// Extracts the hostname of the frame's url.
    ///
    /// Urls without a host (`about:blank`, `data:`) or that fail to parse
    /// result in an empty hostname.
    pub fn from_url(url: &str) -> Self {
        let hostname = Url::parse(url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default();
        Self { hostname }
    }
}

impl From<&FrameSnapshot> for FrameDetails {
    fn from(snapshot: &FrameSnapshot) -> Self {
        FrameDetails::from_url(&snapshot.url)
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.is_empty()))
}

mod parent_frame_id {
    use super::*;

    pub fn serialize<S>(parent: &Option<FrameId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(FrameId::parent_to_raw(*parent))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<FrameId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(FrameId::parent_from_raw(i64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_navigation_target() {
        let target: FrameTarget = serde_json::from_str(
            r#"{"tabId": 7, "frameId": 0, "parentFrameId": -1, "documentId": "A1"}"#,
        )
        .unwrap();
        assert_eq!(target.tab_id, TabId(7));
        assert!(target.is_root());
        assert_eq!(target.document_id.as_deref(), Some("A1"));

        let target: FrameTarget = serde_json::from_str(
            r#"{"tabId": 7, "frameId": 12, "parentFrameId": 0, "documentId": ""}"#,
        )
        .unwrap();
        assert_eq!(target.parent_frame_id, Some(FrameId::MAIN));
        assert_eq!(target.document_id, None);
    }

    #[test]
    fn decode_snapshot_without_document_id() {
        let frames: Vec<FrameSnapshot> = serde_json::from_str(
            r#"[
                {"frameId": 0, "parentFrameId": -1, "url": "https://example.com/"},
                {"frameId": 3, "parentFrameId": 0, "url": "https://ads.tracker.net/x"}
            ]"#,
        )
        .unwrap();
        assert_eq!(frames[0].parent_frame_id, None);
        assert_eq!(frames[1].document_id, None);
        assert_eq!(
            FrameDetails::from(&frames[1]),
            FrameDetails::new("ads.tracker.net")
        );
    }

    #[test]
    fn encode_root_parent_as_minus_one() {
        let value = serde_json::to_value(FrameTarget::root(TabId(1), FrameId::MAIN)).unwrap();
        assert_eq!(value["parentFrameId"], serde_json::json!(-1));
    }

    #[test]
    fn hostname_from_url() {
        assert_eq!(
            FrameDetails::from_url("https://sub.example.org:8080/a?b").hostname,
            "sub.example.org"
        );
        assert_eq!(FrameDetails::from_url("about:blank").hostname, "");
        assert_eq!(FrameDetails::from_url("not a url").hostname, "");
    }
}
