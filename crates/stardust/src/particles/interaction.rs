//! Turn pointer and touch input into changes to the field, and bursts of particles.

use glam::Vec2;

use super::simulation::Simulation;
use super::spawn::Burst;

/// Which pointer button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Usually the left mouse button
    Primary,
    /// Usually the right mouse button
    Secondary,
}

/// Everything the host can tell us about the pointer. Coordinates are canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// The pointer moved.
    Move(Vec2),
    /// A pointer button went down.
    Press(Vec2, PointerButton),
    /// The pointer button was let go.
    Release,
    /// The pointer left the canvas.
    Leave,
    /// A finger touched the canvas.
    TouchStart(Vec2),
    /// A finger moved over the canvas.
    TouchMove(Vec2),
    /// A finger was lifted.
    TouchEnd,
}

/// A rectangle on the canvas where UI controls live. Presses on it are meant for the controls,
/// not for the particles.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Region {
    /// Top-left corner
    pub origin: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Region {
    /// Instantiate
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Whether a point is inside the region.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let far_corner = self.origin + self.size;
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < far_corner.x
            && point.y < far_corner.y
    }
}

/// The interaction layer
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Interaction {
    /// Areas covered by UI controls.
    pub ui_regions: Vec<Region>,
}

impl Interaction {
    /// Replace the known UI control areas.
    pub fn set_ui_regions(&mut self, regions: Vec<Region>) {
        self.ui_regions = regions;
    }

    /// Whether a point is over any UI control.
    #[must_use]
    pub fn is_over_ui(&self, point: Vec2) -> bool {
        self.ui_regions.iter().any(|region| region.contains(point))
    }

    /// Apply a single pointer event to the simulation.
    pub fn handle(&self, event: PointerEvent, simulation: &mut Simulation) {
        match event {
            PointerEvent::Move(position) | PointerEvent::TouchMove(position) => {
                simulation.field.move_pointer(position);
            }
            PointerEvent::Press(position, button) => {
                if self.is_over_ui(position) {
                    tracing::trace!("Ignoring press over UI control at {position}");
                    return;
                }
                simulation.field.press(position);
                match button {
                    PointerButton::Primary => simulation.spawn(position, Burst::PRIMARY),
                    PointerButton::Secondary => {
                        simulation.spawn(position, Burst::SECONDARY);
                        simulation.field.release();
                    }
                }
            }
            PointerEvent::TouchStart(position) => {
                if self.is_over_ui(position) {
                    tracing::trace!("Ignoring touch over UI control at {position}");
                    return;
                }
                simulation.field.press(position);
            }
            PointerEvent::Release | PointerEvent::TouchEnd => simulation.field.release(),
            PointerEvent::Leave => simulation.field.leave(),
        }
    }
}
