//! The drawing capabilities that the particle effect needs from a rendering surface.
//!
//! Nothing here knows about terminals. The simulation only ever draws through this trait, so any
//! backend that can fill rectangles, circles, polylines and radial gradients can host it.

use glam::Vec2;

/// A straight (non-premultiplied) RGBA colour, each channel between 0.0 and 1.0.
pub type Colour = (f32, f32, f32, f32);

/// Fully transparent. What a cleared canvas is filled with.
pub const TRANSPARENT: Colour = (0.0, 0.0, 0.0, 0.0);

/// Return the same colour with a different alpha.
#[must_use]
pub const fn with_alpha(colour: Colour, alpha: f32) -> Colour {
    (colour.0, colour.1, colour.2, alpha)
}

/// Convert 8-bit channels and an alpha into a `Colour`.
#[must_use]
pub fn from_rgb8(red: u8, green: u8, blue: u8, alpha: f32) -> Colour {
    (
        f32::from(red) / 255.0,
        f32::from(green) / 255.0,
        f32::from(blue) / 255.0,
        alpha,
    )
}

/// A 2D drawing surface.
pub trait Canvas {
    /// Width of the drawable area in pixels.
    fn width(&self) -> f32;

    /// Height of the drawable area in pixels.
    fn height(&self) -> f32;

    /// Erase everything.
    fn clear(&mut self);

    /// Blend a rectangle of a single colour over the canvas.
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, colour: Colour);

    /// Blend a filled circle over the canvas.
    fn fill_circle(&mut self, centre: Vec2, radius: f32, colour: Colour);

    /// Blend a line through all the given points over the canvas.
    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, colour: Colour);

    /// Blend a filled circle whose colour fades from `inner` at its centre to `outer` at its
    /// rim.
    fn fill_radial_gradient(&mut self, centre: Vec2, radius: f32, inner: Colour, outer: Colour);
}
