//! An in-memory RGBA canvas. Everything is alpha-composited onto it, and when the frame is done it
//! is converted into terminal cells.

use std::collections::HashSet;

use color_eyre::eyre::{bail, Result};
use glam::Vec2;
use palette::blend::Compose as _;

use crate::canvas::{Canvas, Colour, TRANSPARENT};

/// Pixels fainter than this aren't worth sending to the terminal.
const VISIBLE_ALPHA: f32 = 0.02;

/// How far apart, in pixels, stamps are placed along a stroked line.
const STROKE_STEP: f32 = 0.5;

/// `Framebuffer`
#[derive(Debug, Clone)]
pub struct Framebuffer {
    /// Width in pixels
    width: usize,
    /// Height in pixels
    height: usize,
    /// Row-major pixels
    pixels: Vec<Colour>,
}

impl Framebuffer {
    /// Create a transparent framebuffer. There's no point in a particle effect without anywhere
    /// to draw it, so empty dimensions are an error.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Can't create a {width}x{height} canvas: there's no drawing surface");
        }

        Ok(Self {
            width,
            height,
            pixels: vec![TRANSPARENT; width * height],
        })
    }

    /// A framebuffer for a terminal, where every cell holds 2 vertical pixels.
    pub fn for_terminal(cols: u16, rows: u16) -> Result<Self> {
        Self::new(usize::from(cols), usize::from(rows) * 2)
    }

    /// The colour at the given pixel.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Iterate over every pixel that's bright enough to be seen, with its coordinates.
    pub fn visible_pixels(&self) -> impl Iterator<Item = (usize, usize, Colour)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, colour)| colour.3 >= VISIBLE_ALPHA)
            .map(|(index, colour)| (index % self.width, index / self.width, *colour))
    }

    /// Composite a colour over a single pixel.
    fn blend(&mut self, x: usize, y: usize, colour: Colour) {
        if x >= self.width {
            return;
        }
        let Some(pixel) = self.pixels.get_mut(y * self.width + x) else {
            return;
        };

        let source = palette::Srgba::new(colour.0, colour.1, colour.2, colour.3);
        let destination = palette::Srgba::new(pixel.0, pixel.1, pixel.2, pixel.3);
        let result = source.over(destination);
        *pixel = (result.red, result.green, result.blue, result.alpha);
    }

    /// The range of pixel indices covering `start..end` on an axis of the given length.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "Values are clamped to the framebuffer's dimensions before casting"
    )]
    fn span(start: f32, end: f32, length: usize) -> std::ops::Range<usize> {
        let limit = length as f32;
        let from = start.floor().clamp(0.0, limit) as usize;
        let to = end.ceil().clamp(0.0, limit) as usize;
        from..to
    }

    /// The centre of a pixel.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Pixel coordinates are far smaller than f32's precision limit"
    )]
    fn centre_of(x: usize, y: usize) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
    }

    /// All the pixels whose centres are within `radius` of `centre`. Tiny circles still cover the
    /// pixel that they're in.
    fn pixels_in_circle(&self, centre: Vec2, radius: f32) -> Vec<(usize, usize, f32)> {
        let mut covered = Vec::new();
        let reach = radius.max(0.5);
        for y in Self::span(centre.y - reach, centre.y + reach, self.height) {
            for x in Self::span(centre.x - reach, centre.x + reach, self.width) {
                let distance = Self::centre_of(x, y).distance(centre);
                if distance <= reach {
                    covered.push((x, y, distance));
                }
            }
        }

        let is_on_canvas = centre.x >= 0.0
            && centre.y >= 0.0
            && centre.x < self.width()
            && centre.y < self.height();
        if covered.is_empty() && is_on_canvas {
            let col = Self::span(centre.x, centre.x, self.width).start;
            let row = Self::span(centre.y, centre.y, self.height).start;
            covered.push((col, row, 0.0));
        }

        covered
    }
}

impl Canvas for Framebuffer {
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Framebuffers are far smaller than f32's precision limit"
    )]
    fn width(&self) -> f32 {
        self.width as f32
    }

    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Framebuffers are far smaller than f32's precision limit"
    )]
    fn height(&self) -> f32 {
        self.height as f32
    }

    fn clear(&mut self) {
        self.pixels.fill(TRANSPARENT);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, colour: Colour) {
        let far_corner = origin + size;
        for y in Self::span(origin.y, far_corner.y, self.height) {
            for x in Self::span(origin.x, far_corner.x, self.width) {
                self.blend(x, y, colour);
            }
        }
    }

    fn fill_circle(&mut self, centre: Vec2, radius: f32, colour: Colour) {
        for (x, y, _) in self.pixels_in_circle(centre, radius) {
            self.blend(x, y, colour);
        }
    }

    /// Stamps discs along every segment. Each pixel is only blended once per stroke, so
    /// overlapping stamps don't make the line more opaque.
    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, colour: Colour) {
        let radius = width / 2.0;
        let mut touched = HashSet::new();
        for segment in points.windows(2) {
            let [start, end] = segment else {
                continue;
            };
            let length = start.distance(*end);
            let mut travelled = 0.0;
            loop {
                let progress = if length > 0.0 { travelled / length } else { 1.0 };
                let stamp = start.lerp(*end, progress.min(1.0));
                for (x, y, _) in self.pixels_in_circle(stamp, radius) {
                    touched.insert((x, y));
                }
                if travelled >= length {
                    break;
                }
                travelled += STROKE_STEP;
            }
        }

        for (x, y) in touched {
            self.blend(x, y, colour);
        }
    }

    fn fill_radial_gradient(&mut self, centre: Vec2, radius: f32, inner: Colour, outer: Colour) {
        for (x, y, distance) in self.pixels_in_circle(centre, radius) {
            let progress = if radius > 0.0 {
                (distance / radius).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let colour = (
                inner.0 + (outer.0 - inner.0) * progress,
                inner.1 + (outer.1 - inner.1) * progress,
                inner.2 + (outer.2 - inner.2) * progress,
                inner.3 + (outer.3 - inner.3) * progress,
            );
            self.blend(x, y, colour);
        }
    }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    const RED: Colour = (1.0, 0.0, 0.0, 1.0);

    fn close(left: Colour, right: Colour) -> bool {
        (left.0 - right.0).abs() < 1e-4
            && (left.1 - right.1).abs() < 1e-4
            && (left.2 - right.2).abs() < 1e-4
            && (left.3 - right.3).abs() < 1e-4
    }

    #[test]
    fn empty_canvas_is_an_error() {
        let error = Framebuffer::new(0, 10).unwrap_err();
        assert!(error.to_string().contains("no drawing surface"));
    }

    #[test]
    fn terminal_cells_are_two_pixels_high() {
        let framebuffer = Framebuffer::for_terminal(4, 3).unwrap();
        assert_eq!(framebuffer.width(), 4.0);
        assert_eq!(framebuffer.height(), 6.0);
    }

    #[test]
    fn fill_rect_blends_over_existing_pixels() {
        let mut framebuffer = Framebuffer::new(4, 4).unwrap();
        framebuffer.fill_rect(Vec2::ZERO, Vec2::new(2.0, 2.0), RED);
        framebuffer.fill_rect(Vec2::ZERO, Vec2::new(4.0, 4.0), (0.0, 0.0, 1.0, 0.5));

        let blended = framebuffer.pixel(0, 0).unwrap();
        assert!(close(blended, (0.5, 0.0, 0.5, 1.0)), "{blended:?}");

        let unpainted = framebuffer.pixel(3, 3).unwrap();
        assert!(close(unpainted, (0.0, 0.0, 1.0, 0.5)), "{unpainted:?}");
    }

    #[test]
    fn clear_makes_everything_transparent() {
        let mut framebuffer = Framebuffer::new(4, 4).unwrap();
        framebuffer.fill_rect(Vec2::ZERO, Vec2::new(4.0, 4.0), RED);
        framebuffer.clear();
        assert_eq!(framebuffer.visible_pixels().count(), 0);
    }

    #[test]
    fn circle_covers_pixels_near_its_centre() {
        let mut framebuffer = Framebuffer::new(10, 10).unwrap();
        framebuffer.fill_circle(Vec2::new(5.0, 5.0), 2.0, RED);
        assert_eq!(framebuffer.pixel(4, 4), Some(RED));
        assert_eq!(framebuffer.pixel(5, 5), Some(RED));
        assert_eq!(framebuffer.pixel(0, 0), Some(TRANSPARENT));
        assert_eq!(framebuffer.pixel(9, 9), Some(TRANSPARENT));
    }

    #[test]
    fn tiny_circle_still_covers_a_pixel() {
        let mut framebuffer = Framebuffer::new(10, 10).unwrap();
        framebuffer.fill_circle(Vec2::new(3.2, 7.9), 0.1, RED);
        assert_eq!(framebuffer.visible_pixels().count(), 1);
    }

    #[test]
    fn circles_off_the_canvas_are_clipped() {
        let mut framebuffer = Framebuffer::new(10, 10).unwrap();
        framebuffer.fill_circle(Vec2::new(-50.0, -50.0), 3.0, RED);
        framebuffer.fill_circle(Vec2::new(10.0, 10.0), 1.0, RED);
        assert_eq!(framebuffer.pixel(9, 9), Some(RED));
        assert_eq!(framebuffer.visible_pixels().count(), 1);
    }

    #[test]
    fn polyline_is_blended_once_per_pixel() {
        let mut framebuffer = Framebuffer::new(10, 3).unwrap();
        let half_red = (1.0, 0.0, 0.0, 0.5);
        framebuffer.stroke_polyline(
            &[Vec2::new(0.5, 1.5), Vec2::new(9.5, 1.5), Vec2::new(0.5, 1.5)],
            1.0,
            half_red,
        );
        for x in 0..10 {
            assert_eq!(framebuffer.pixel(x, 1), Some(half_red));
        }
        assert_eq!(framebuffer.pixel(5, 0), Some(TRANSPARENT));
    }

    #[test]
    fn gradient_fades_towards_the_rim() {
        let mut framebuffer = Framebuffer::new(21, 21).unwrap();
        framebuffer.fill_radial_gradient(
            Vec2::new(10.5, 10.5),
            10.0,
            (1.0, 1.0, 1.0, 0.6),
            (1.0, 1.0, 1.0, 0.0),
        );
        let centre = framebuffer.pixel(10, 10).unwrap();
        let edge = framebuffer.pixel(10, 18).unwrap();
        assert!(close(centre, (1.0, 1.0, 1.0, 0.6)), "{centre:?}");
        assert!(edge.3 < centre.3);
        assert_eq!(framebuffer.pixel(0, 0), Some(TRANSPARENT));
    }
}
