// Wire protocol DTOs and conversions for the session relay messages.
// Field names and shapes are the compatibility surface with the relay and
// must not change independently of it.

use crate::domain::state::{Intent, RosterEntry};
use crate::domain::vector::Vec2;
use serde::{Deserialize, Serialize};

/// Messages the client sends to the session relay over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    // Handshake declaring entry into the session.
    Join(JoinPayload),
    // Latest local intent and position, sent on every intent change.
    Move(MoveDto),
}

/// Messages the session relay sends to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Ack for the local join request; payload is opaque and ignored.
    Join(Option<serde_json::Value>),
    // Identity assigned to this connection.
    HostPlayerId(String),
    // Roster snapshot; may repeat entries already announced.
    Current(Vec<RosterEntryDto>),
    // A participant's latest intent and position.
    Move(MoveDto),
    // A participant left the session.
    Leave(String),
}

/// Payload for the join handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPayload {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

/// Held movement directions on the wire; absent fields decode as released.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentDto {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: f32,
    pub y: f32,
}

/// Intent plus position report for one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveDto {
    pub id: String,
    pub intent: IntentDto,
    pub position: PositionDto,
}

/// One participant in a `current` roster snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntryDto {
    pub id: String,
    pub name: String,
    pub region: String,
    pub x: f32,
    pub y: f32,
}

impl From<IntentDto> for Intent {
    fn from(dto: IntentDto) -> Self {
        Self {
            up: dto.up,
            down: dto.down,
            left: dto.left,
            right: dto.right,
        }
    }
}

impl From<Intent> for IntentDto {
    fn from(intent: Intent) -> Self {
        Self {
            up: intent.up,
            down: intent.down,
            left: intent.left,
            right: intent.right,
        }
    }
}

impl From<PositionDto> for Vec2 {
    fn from(dto: PositionDto) -> Self {
        Self { x: dto.x, y: dto.y }
    }
}

impl From<Vec2> for PositionDto {
    fn from(position: Vec2) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}

impl From<RosterEntryDto> for RosterEntry {
    fn from(dto: RosterEntryDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            region: dto.region,
            position: Vec2::new(dto.x, dto.y),
        }
    }
}
