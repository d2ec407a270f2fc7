//! Terminals report the current state of the mouse rather than button presses and releases. So
//! here we remember the previous state in order to turn terminal mouse reports into pointer
//! events.

use glam::Vec2;
use termwiz::input::{MouseButtons, MouseEvent};

use super::interaction::{PointerButton, PointerEvent};

/// Tracks the mouse buttons between terminal mouse reports.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    /// The buttons held down at the last report
    buttons: MouseButtons,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self {
            buttons: MouseButtons::NONE,
        }
    }
}

impl PointerTracker {
    /// Convert a terminal cell to the pixel at the middle of it. Every cell is 2 pixels high.
    #[must_use]
    pub fn cell_to_canvas(col: u16, row: u16) -> Vec2 {
        Vec2::new(f32::from(col) + 0.5, f32::from(row) * 2.0 + 1.0)
    }

    /// Turn a terminal mouse report into pointer events. `width` and `height` are the size of the
    /// terminal in cells.
    pub fn translate(&mut self, event: &MouseEvent, width: u16, height: u16) -> Vec<PointerEvent> {
        let wheel = MouseButtons::VERT_WHEEL | MouseButtons::HORZ_WHEEL;
        if event.mouse_buttons.intersects(wheel) {
            return Vec::new();
        }

        // Mouse reports count cells from 1.
        let col = event.x.saturating_sub(1);
        let row = event.y.saturating_sub(1);
        if col >= width || row >= height {
            self.buttons = MouseButtons::NONE;
            return vec![PointerEvent::Leave];
        }

        let position = Self::cell_to_canvas(col, row);
        let mut events = vec![PointerEvent::Move(position)];

        let tracked = MouseButtons::LEFT | MouseButtons::RIGHT;
        let current = event.mouse_buttons.clone() & tracked;
        let pressed = current.clone() - self.buttons.clone();

        if pressed.contains(MouseButtons::LEFT) {
            events.push(PointerEvent::Press(position, PointerButton::Primary));
        }
        if pressed.contains(MouseButtons::RIGHT) {
            events.push(PointerEvent::Press(position, PointerButton::Secondary));
        }
        if !self.buttons.is_empty() && current.is_empty() {
            events.push(PointerEvent::Release);
        }

        self.buttons = current;
        events
    }

    /// Forget any held buttons, eg when the terminal is resized.
    pub fn reset(&mut self) {
        self.buttons = MouseButtons::NONE;
    }
}
