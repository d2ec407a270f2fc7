//! Convert pixels and text into terminal cells

use termwiz::cell::AttributeChange;
use termwiz::color::ColorAttribute;
use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Position as TermwizPosition;

use crate::canvas::Colour;
use crate::framebuffer::Framebuffer;

/// A default pure white.
pub const WHITE: Colour = (1.0, 1.0, 1.0, 1.0);

/// The upper half block. Its foreground is the upper pixel and its background the lower pixel.
const UPPER_HALF: &str = "▀";

/// The lower half block. Only used when a cell has a lower pixel but no upper one.
const LOWER_HALF: &str = "▄";

/// `Surface`
#[derive(Clone)]
pub struct Surface {
    /// The terminal's width
    pub width: usize,
    /// The terminal's height
    pub height: usize,
    /// A surface of terminal cells
    pub surface: termwiz::surface::Surface,
}

impl Surface {
    /// Create an empty surface
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            surface: termwiz::surface::Surface::new(width, height),
        }
    }

    /// Build a surface from a framebuffer, 2 pixels to a cell.
    #[must_use]
    pub fn from_framebuffer(framebuffer: &Framebuffer, width: usize, height: usize) -> Self {
        let mut surface = Self::new(width, height);

        let mut cells: Vec<(Option<Colour>, Option<Colour>)> = vec![(None, None); width * height];
        for (x, y, colour) in framebuffer.visible_pixels() {
            if x >= width {
                continue;
            }
            let Some(cell) = cells.get_mut(y.div_euclid(2) * width + x) else {
                continue;
            };
            let opaque = Some(Self::over_black(colour));
            if y.rem_euclid(2) == 0 {
                cell.0 = opaque;
            } else {
                cell.1 = opaque;
            }
        }

        for (index, (upper, lower)) in cells.into_iter().enumerate() {
            if upper.is_none() && lower.is_none() {
                continue;
            }
            surface.add_pixels(index % width, index / width, upper, lower);
        }

        surface
    }

    /// Paint one cell with up to 2 stacked pixels.
    ///
    /// Normally it's "▀", with the upper pixel as the foreground and the lower pixel as the
    /// background. A cell with only a lower pixel flips that to "▄", because otherwise its empty
    /// upper half would have to be painted in some concrete colour instead of the terminal's own
    /// default background.
    pub fn add_pixels(
        &mut self,
        col: usize,
        row: usize,
        upper: Option<Colour>,
        lower: Option<Colour>,
    ) {
        let (glyph, foreground, background) = match (upper, lower) {
            (None, None) => return,
            (None, Some(only)) => (LOWER_HALF, only, None),
            (Some(top), bottom) => (UPPER_HALF, top, bottom),
        };

        self.surface.add_changes(vec![
            Self::move_to(col, row),
            Self::foreground(Some(foreground)),
            Self::background(background),
        ]);
        self.surface.add_change(glyph);
    }

    /// Write text starting at the given cell. Without colours it's white on the terminal's
    /// default background.
    pub fn add_text(
        &mut self,
        x: usize,
        y: usize,
        text: String,
        background: Option<Colour>,
        foreground: Option<Colour>,
    ) {
        self.surface.add_changes(vec![
            Self::move_to(x, y),
            Self::background(background),
            Self::foreground(Some(foreground.unwrap_or(WHITE))),
        ]);
        self.surface.add_change(text);
    }

    /// Move the surface's cursor to a cell.
    const fn move_to(col: usize, row: usize) -> TermwizChange {
        TermwizChange::CursorPosition {
            x: TermwizPosition::Absolute(col),
            y: TermwizPosition::Absolute(row),
        }
    }

    /// Terminal cells have no alpha, so translucent pixels are blended onto black, the usual
    /// terminal background.
    const fn over_black(colour: Colour) -> Colour {
        (colour.0 * colour.3, colour.1 * colour.3, colour.2 * colour.3, 1.0)
    }

    /// Our colour as a true colour Termwiz attribute.
    #[must_use]
    pub const fn colour_attribute(colour: Colour) -> ColorAttribute {
        ColorAttribute::TrueColorWithDefaultFallback(termwiz::color::SrgbaTuple(
            colour.0, colour.1, colour.2, colour.3,
        ))
    }

    /// A foreground colour change. `None` is the terminal's default.
    #[must_use]
    pub const fn foreground(colour: Option<Colour>) -> TermwizChange {
        let attribute = match colour {
            Some(colour) => Self::colour_attribute(colour),
            None => ColorAttribute::Default,
        };
        TermwizChange::Attribute(AttributeChange::Foreground(attribute))
    }

    /// A background colour change. `None` is the terminal's default, which on many GUI
    /// terminals is transparent.
    #[must_use]
    pub const fn background(colour: Option<Colour>) -> TermwizChange {
        let attribute = match colour {
            Some(colour) => Self::colour_attribute(colour),
            None => ColorAttribute::Default,
        };
        TermwizChange::Attribute(AttributeChange::Background(attribute))
    }
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    clippy::shadow_unrelated,
    reason = "Tests aren't so strict"
)]
mod test {
    use glam::Vec2;

    use super::*;
    use crate::canvas::Canvas as _;

    const RED: Colour = (1.0, 0.0, 0.0, 1.0);

    fn framebuffer_with(pixels: &[(f32, f32, Colour)]) -> Framebuffer {
        let mut framebuffer = Framebuffer::for_terminal(2, 2).unwrap();
        for (x, y, colour) in pixels {
            framebuffer.fill_rect(Vec2::new(*x, *y), Vec2::ONE, *colour);
        }
        framebuffer
    }

    #[test]
    fn empty_framebuffer_leaves_cells_blank() {
        let mut surface = Surface::from_framebuffer(&framebuffer_with(&[]), 2, 2);
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(cell.str(), " ");
        assert_eq!(
            cell.attrs().background(),
            ColorAttribute::Default
        );
    }

    #[test]
    fn upper_pixel_uses_upper_half_block() {
        let mut surface = Surface::from_framebuffer(&framebuffer_with(&[(0.0, 0.0, WHITE)]), 2, 2);
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(cell.str(), "▀");
        assert_eq!(
            cell.attrs().foreground(),
            Surface::colour_attribute(WHITE)
        );
        assert_eq!(
            cell.attrs().background(),
            ColorAttribute::Default
        );
    }

    #[test]
    fn lone_lower_pixel_uses_lower_half_block() {
        let mut surface = Surface::from_framebuffer(&framebuffer_with(&[(1.0, 3.0, WHITE)]), 2, 2);
        let cell = &surface.surface.screen_cells()[1][1];
        assert_eq!(cell.str(), "▄");
        assert_eq!(
            cell.attrs().foreground(),
            Surface::colour_attribute(WHITE)
        );
        assert_eq!(
            cell.attrs().background(),
            ColorAttribute::Default
        );
    }

    #[test]
    fn both_pixels_share_a_cell() {
        let mut surface = Surface::from_framebuffer(
            &framebuffer_with(&[(0.0, 0.0, RED), (0.0, 1.0, WHITE)]),
            2,
            2,
        );
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(cell.str(), "▀");
        assert_eq!(cell.attrs().foreground(), Surface::colour_attribute(RED));
        assert_eq!(
            cell.attrs().background(),
            Surface::colour_attribute(WHITE)
        );
    }

    #[test]
    fn translucent_pixels_are_darkened() {
        let half_white = (1.0, 1.0, 1.0, 0.5);
        let mut surface = Surface::from_framebuffer(&framebuffer_with(&[(0.0, 0.0, half_white)]), 2, 2);
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(
            cell.attrs().foreground(),
            Surface::colour_attribute((0.5, 0.5, 0.5, 1.0))
        );
    }

    #[test]
    fn text_overlays_cells() {
        let mut surface = Surface::new(10, 1);
        surface.add_text(2, 0, "hi".into(), None, None);
        let cells = surface.surface.screen_cells();
        assert_eq!(cells[0][2].str(), "h");
        assert_eq!(cells[0][3].str(), "i");
    }
}
