//! Presence events: a player entered or left a world cell.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, WorldCellId};

/// Which side of a cell boundary the player crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceEventKind {
    UserEntered,
    UserLeft,
}

impl PresenceEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserEntered => "user_entered",
            Self::UserLeft => "user_left",
        }
    }
}

impl fmt::Display for PresenceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change in the occupancy of one world cell.
///
/// This is the only message on the presence topic and on the in-process bus.
/// Wire shape: `{"type", "worldCellId", "userId", "at"}` with `at` in ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    #[serde(rename = "type")]
    pub kind: PresenceEventKind,
    pub world_cell_id: WorldCellId,
    pub user_id: UserId,
    #[serde(with = "crate::common::datetime::iso8601")]
    pub at: DateTime<Utc>,
}

impl PresenceEvent {
    pub fn entered(world_cell_id: WorldCellId, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            kind: PresenceEventKind::UserEntered,
            world_cell_id,
            user_id,
            at,
        }
    }

    pub fn left(world_cell_id: WorldCellId, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            kind: PresenceEventKind::UserLeft,
            world_cell_id,
            user_id,
            at,
        }
    }

    /// Broker message key. All events for one cell share a partition.
    pub fn partition_key(&self) -> &str {
        self.world_cell_id.as_str()
    }
}

/// A confirmed change of the cell a user occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub user_id: UserId,
    pub from: Option<WorldCellId>,
    pub to: WorldCellId,
}

impl CellChange {
    pub fn new(user_id: UserId, from: Option<WorldCellId>, to: WorldCellId) -> Self {
        Self { user_id, from, to }
    }

    /// Staying in the same cell is not an occupancy change.
    pub fn is_noop(&self) -> bool {
        self.from.as_ref() == Some(&self.to)
    }

    /// Events to publish for this change, in publish order.
    ///
    /// `user_left` for the origin (if any) always precedes `user_entered`
    /// for the destination.
    pub fn presence_events(&self, at: DateTime<Utc>) -> Vec<PresenceEvent> {
        if self.is_noop() {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if let Some(from) = &self.from {
            events.push(PresenceEvent::left(from.clone(), self.user_id.clone(), at));
        }
        events.push(PresenceEvent::entered(self.to.clone(), self.user_id.clone(), at));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    fn cell(id: &str) -> WorldCellId {
        WorldCellId::new(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn serializes_to_wire_shape() {
        let event = PresenceEvent::entered(cell("cell-42"), user("C"), at());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "user_entered",
                "worldCellId": "cell-42",
                "userId": "C",
                "at": "2025-01-02T03:04:05.000Z"
            })
        );
    }

    #[test]
    fn parses_browser_style_timestamps() {
        let raw = r#"{"type":"user_left","worldCellId":"a","userId":"b","at":"2025-01-02T03:04:05.123Z"}"#;
        let event: PresenceEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind, PresenceEventKind::UserLeft);
        assert_eq!(event.world_cell_id.as_str(), "a");
    }

    #[test]
    fn rejects_unknown_kind_and_blank_cell() {
        let unknown = r#"{"type":"user_waved","worldCellId":"a","userId":"b","at":"2025-01-02T03:04:05Z"}"#;
        assert!(serde_json::from_str::<PresenceEvent>(unknown).is_err());

        let blank = r#"{"type":"user_left","worldCellId":"","userId":"b","at":"2025-01-02T03:04:05Z"}"#;
        assert!(serde_json::from_str::<PresenceEvent>(blank).is_err());
    }

    #[test]
    fn move_emits_left_then_entered() {
        let change = CellChange::new(user("u"), Some(cell("old")), cell("new"));
        let events = change.presence_events(at());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, PresenceEventKind::UserLeft);
        assert_eq!(events[0].world_cell_id, cell("old"));
        assert_eq!(events[1].kind, PresenceEventKind::UserEntered);
        assert_eq!(events[1].world_cell_id, cell("new"));
    }

    #[test]
    fn first_placement_emits_only_entered() {
        let change = CellChange::new(user("u"), None, cell("spawn"));
        let events = change.presence_events(at());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PresenceEventKind::UserEntered);
    }

    #[test]
    fn staying_put_emits_nothing() {
        let change = CellChange::new(user("u"), Some(cell("here")), cell("here"));
        assert!(change.is_noop());
        assert!(change.presence_events(at()).is_empty());
    }
}
