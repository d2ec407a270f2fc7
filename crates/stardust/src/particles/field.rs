//! The pointer and force parameters that every particle consults each frame.

use glam::Vec2;

use super::colour_mode::ColourMode;
use super::config::{ForceMode, Settings};

/// Where the pointer is parked when there's no input, far enough away to have no influence.
pub const OFF_CANVAS: Vec2 = Vec2::new(-1000.0, -1000.0);

/// While the pointer is held down, a small burst is spawned every this many frames.
pub const HOLD_SPAWN_INTERVAL: u32 = 5;

/// The pointer's state.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Field {
    /// The pointer's position on the canvas
    pub pointer: Vec2,
    /// Whether the pointer is currently held down
    pub is_pointer_down: bool,
    /// Frames counted since the last hold spawn
    pub hold_ticks: u32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            pointer: OFF_CANVAS,
            is_pointer_down: false,
            hold_ticks: 0,
        }
    }
}

impl Field {
    /// Move the pointer without changing anything else.
    pub const fn move_pointer(&mut self, position: Vec2) {
        self.pointer = position;
    }

    /// The pointer has been pressed down.
    pub const fn press(&mut self, position: Vec2) {
        self.pointer = position;
        self.is_pointer_down = true;
        self.hold_ticks = 0;
    }

    /// The pointer has been let go.
    pub const fn release(&mut self) {
        self.is_pointer_down = false;
    }

    /// The pointer has left the canvas altogether.
    pub const fn leave(&mut self) {
        self.pointer = OFF_CANVAS;
        self.is_pointer_down = false;
    }

    /// Count a frame of the pointer being held. Returns `true` when it's time for a hold spawn.
    /// Releasing the pointer resets the count.
    pub const fn tick_hold(&mut self) -> bool {
        if !self.is_pointer_down {
            self.hold_ticks = 0;
            return false;
        }

        self.hold_ticks += 1;
        if self.hold_ticks >= HOLD_SPAWN_INTERVAL {
            self.hold_ticks = 0;
            return true;
        }

        false
    }

    /// Take a snapshot of everything a particle needs for one frame.
    #[must_use]
    pub fn forces(&self, settings: &Settings, bounds: Vec2, seconds: f32) -> Forces {
        Forces {
            pointer: self.pointer,
            effective_radius: effective_radius(
                settings.base_radius,
                settings.gravity,
                settings.radius_scale,
            ),
            gravity: settings.gravity,
            speed: f32::from(u16::try_from(settings.speed).unwrap_or(u16::MAX)),
            force_mode: settings.force_mode,
            colour_mode: settings.colour_mode,
            bounds,
            seconds,
        }
    }
}

/// The reach of the pointer. Stronger gravity reaches further.
#[must_use]
pub fn effective_radius(base_radius: f32, gravity: f32, radius_scale: f32) -> f32 {
    base_radius * (1.0 + (gravity - 1.0) * radius_scale)
}

/// A read-only snapshot of the field and settings, shared by every particle in a frame.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Forces {
    /// The pointer's position
    pub pointer: Vec2,
    /// The pointer's reach for this frame
    pub effective_radius: f32,
    /// Gravity strength
    pub gravity: f32,
    /// Motion speed multiplier
    pub speed: f32,
    /// Attract or repel
    pub force_mode: ForceMode,
    /// How to colour particles
    pub colour_mode: ColourMode,
    /// The size of the canvas
    pub bounds: Vec2,
    /// Seconds since the effect started
    pub seconds: f32,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn radius_grows_with_gravity() {
        let weak = effective_radius(100.0, 1.0, 6.0);
        let strong = effective_radius(100.0, 2.0, 6.0);
        assert!(strong > weak);
        assert!((weak - 100.0).abs() < f32::EPSILON);
        assert!((strong - 700.0).abs() < f32::EPSILON);
    }

    #[test]
    fn radius_is_recomputed_from_live_settings() {
        let field = Field::default();
        let mut settings = Settings::default();
        let before = field.forces(&settings, Vec2::ONE, 0.0).effective_radius;
        settings.gravity = 2.5;
        let after = field.forces(&settings, Vec2::ONE, 0.0).effective_radius;
        assert!(after > before);
    }

    #[test]
    fn hold_spawns_every_fifth_frame() {
        let mut field = Field::default();
        field.press(Vec2::ZERO);
        let due: Vec<bool> = (0..10).map(|_| field.tick_hold()).collect();
        assert_eq!(
            due,
            [false, false, false, false, true, false, false, false, false, true]
        );
    }

    #[test]
    fn releasing_resets_hold_count() {
        let mut field = Field::default();
        field.press(Vec2::ZERO);
        field.tick_hold();
        field.tick_hold();
        field.release();
        assert!(!field.tick_hold());
        assert_eq!(field.hold_ticks, 0);
    }

    #[test]
    fn leaving_parks_the_pointer() {
        let mut field = Field::default();
        field.press(Vec2::new(5.0, 5.0));
        field.leave();
        assert_eq!(field.pointer, OFF_CANVAS);
        assert!(!field.is_pointer_down);
    }
}
