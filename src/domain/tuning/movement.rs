/// Gameplay tuning for entity movement.
///
/// Keep this separate from runtime configuration (channel capacities, frame
/// rates, etc.).
use crate::domain::systems::movement::WorldBounds;

#[derive(Debug, Clone, Copy)]
pub struct MovementTuning {
    /// Distance covered per frame per held direction, in pixels.
    pub speed: f32,

    /// Extent of the static background the playfield is drawn on.
    pub background_width: f32,
    pub background_height: f32,

    /// Inset from the background edges that entities may not cross, sized so
    /// the avatar stays fully visible.
    pub bounds_margin: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed: 5.0,
            background_width: 1920.0,
            background_height: 1080.0,
            bounds_margin: 25.0,
        }
    }
}

impl MovementTuning {
    /// The rectangle entity positions are clamped into.
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            min_x: self.bounds_margin,
            max_x: self.background_width - self.bounds_margin,
            min_y: self.bounds_margin,
            max_y: self.background_height - self.bounds_margin,
        }
    }
}
