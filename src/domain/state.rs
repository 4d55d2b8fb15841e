// Domain-level entity state and the derived snapshot/projection types.

use crate::domain::vector::{Direction, Vec2};

/// Currently-held movement directions for one entity.
///
/// This is "which keys are down", not a velocity; opposing directions may both
/// be set and the movement system resolves the conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Intent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Intent {
    pub const IDLE: Intent = Intent {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    /// Returns this intent with one more direction held down.
    pub fn started(mut self, direction: Direction) -> Intent {
        match direction {
            Direction::Up => self.up = true,
            Direction::Down => self.down = true,
            Direction::Left => self.left = true,
            Direction::Right => self.right = true,
        }
        self
    }

    pub fn is_idle(&self) -> bool {
        *self == Intent::IDLE
    }
}

/// Opaque token correlating an entity with its on-screen representation.
///
/// The engine mints one per entity and never interprets it; the presentation
/// layer keys its draw state on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// One tracked participant, local or remote.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    pub position: Vec2,
    pub intent: Intent,
    pub is_local: bool,
    pub render_handle: RenderHandle,
}

/// Roster entry as announced by the session server in `current` messages.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub region: String,
    pub position: Vec2,
}

impl RosterEntry {
    /// Display label shown next to the avatar: name plus the region tag the
    /// relay assigned at join time.
    pub fn display_name(&self) -> String {
        format!("{} [{}]", self.name, self.region)
    }
}

/// Display-ready projection of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub id: String,
    pub display_name: String,
}

/// Per-entity draw state published once per frame.
#[derive(Debug, Clone)]
pub struct RenderEntity {
    pub handle: RenderHandle,
    pub position: Vec2,
    pub is_local: bool,
}

/// Positions of every tracked entity after one frame advance.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub entities: Vec<RenderEntity>,
}
