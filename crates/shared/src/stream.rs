//! Frames written to a presence stream.
//!
//! Every frame is one `data: <json>\n\n` server-sent event. The first frame
//! of a stream is always [`ConnectedFrame`]; the rest mirror
//! [`PresenceEvent`] exactly as it travels on the broker topic.

use adventure_domain::{PresenceEvent, WorldCellId};
use serde::{Deserialize, Serialize};

/// Marker serialized as `"type": "connected"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectedTag {
    Connected,
}

/// Tells the client the stream is live for `world_cell_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedFrame {
    #[serde(rename = "type")]
    pub kind: ConnectedTag,
    pub world_cell_id: WorldCellId,
}

impl ConnectedFrame {
    pub fn new(world_cell_id: WorldCellId) -> Self {
        Self {
            kind: ConnectedTag::Connected,
            world_cell_id,
        }
    }
}

/// Any frame a presence stream can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresenceFrame {
    Event(PresenceEvent),
    Connected(ConnectedFrame),
}

impl PresenceFrame {
    pub fn connected(world_cell_id: WorldCellId) -> Self {
        Self::Connected(ConnectedFrame::new(world_cell_id))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<PresenceEvent> for PresenceFrame {
    fn from(event: PresenceEvent) -> Self {
        Self::Event(event)
    }
}
