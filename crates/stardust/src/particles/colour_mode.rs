//! The different ways of colouring particles. Every mode is a pure function of the particle's
//! state and the time, so a particle's colour never needs to be remembered between frames.

use glam::Vec2;
use palette::FromColor as _;

use crate::canvas::{from_rgb8, Colour};

/// The alpha that all particle colours are drawn with.
pub const PARTICLE_ALPHA: f32 = 0.8;

/// The available colour schemes.
#[derive(
    serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq,
)]
#[serde(rename_all = "snake_case")]
pub enum ColourMode {
    /// Hue cycles over the canvas and over time.
    Rainbow,
    /// A single soft blue.
    Mono,
    /// Reds and yellows that darken as particles age.
    Fire,
    /// Blues and greens that darken as particles age.
    Ocean,
}

/// The state of a particle that a colour mode may depend on.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct ColourInput {
    /// Where the particle is.
    pub position: Vec2,
    /// How much life the particle has left, between 0.0 and 1.0.
    pub life: f32,
    /// The size of the canvas.
    pub bounds: Vec2,
    /// Seconds since the effect started.
    pub seconds: f32,
}

impl ColourMode {
    /// All the modes, in the order they're cycled through.
    pub const ALL: [Self; 4] = [Self::Rainbow, Self::Mono, Self::Fire, Self::Ocean];

    /// The mode after this one.
    #[must_use]
    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or_default();
        Self::ALL
            .get(index.wrapping_add(1).rem_euclid(Self::ALL.len()))
            .copied()
            .unwrap_or(Self::Rainbow)
    }

    /// Work out the colour of a particle.
    #[must_use]
    pub fn colour(self, input: &ColourInput) -> Colour {
        match self {
            Self::Rainbow => rainbow(input),
            Self::Mono => mono(),
            Self::Fire => fire(input),
            Self::Ocean => ocean(input),
        }
    }
}

impl std::fmt::Display for ColourMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Rainbow => "rainbow",
            Self::Mono => "mono",
            Self::Fire => "fire",
            Self::Ocean => "ocean",
        };
        write!(f, "{name}")
    }
}

/// Hue follows the particle's position diagonally across the canvas and slowly drifts over time.
fn rainbow(input: &ColourInput) -> Colour {
    let across = if input.bounds.x > 0.0 {
        input.position.x / input.bounds.x
    } else {
        0.0
    };
    let down = if input.bounds.y > 0.0 {
        input.position.y / input.bounds.y
    } else {
        0.0
    };
    let hue = (across * 360.0 + down * 360.0 + input.seconds).rem_euclid(360.0);

    let hsla = palette::Hsla::<palette::encoding::Srgb, f32>::new(hue, 0.9, 0.65, PARTICLE_ALPHA);
    let rgba = palette::Srgba::<f32>::from_color(hsla);
    (rgba.red, rgba.green, rgba.blue, rgba.alpha)
}

/// The same colour whatever happens.
fn mono() -> Colour {
    from_rgb8(102, 126, 234, PARTICLE_ALPHA)
}

/// Red stays maxed out, green and blue fade with life.
fn fire(input: &ColourInput) -> Colour {
    from_rgb8(
        255,
        channel(50.0 + input.life * 100.0),
        channel(input.life * 50.0),
        PARTICLE_ALPHA,
    )
}

/// No red, green and blue fade with life.
fn ocean(input: &ColourInput) -> Colour {
    from_rgb8(
        0,
        channel(150.0 + input.life * 50.0),
        channel(200.0 + input.life * 55.0),
        PARTICLE_ALPHA,
    )
}

/// Floor a float into an 8-bit colour channel.
#[expect(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The value is clamped to the 8-bit range first"
)]
fn channel(value: f32) -> u8 {
    value.floor().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    fn input(life: f32) -> ColourInput {
        ColourInput {
            position: Vec2::new(10.0, 20.0),
            life,
            bounds: Vec2::new(100.0, 100.0),
            seconds: 0.0,
        }
    }

    #[test]
    fn fire_fades_green_and_blue() {
        let fresh = ColourMode::Fire.colour(&input(1.0));
        assert_eq!(fresh, from_rgb8(255, 150, 50, 0.8));

        let dying = ColourMode::Fire.colour(&input(0.0));
        assert_eq!(dying, from_rgb8(255, 50, 0, 0.8));
    }

    #[test]
    fn ocean_has_no_red() {
        let colour = ColourMode::Ocean.colour(&input(0.5));
        assert_eq!(colour.0, 0.0);
        assert_eq!(colour, from_rgb8(0, 175, 227, 0.8));
    }

    #[test]
    fn mono_ignores_state() {
        assert_eq!(
            ColourMode::Mono.colour(&input(1.0)),
            ColourMode::Mono.colour(&input(0.1))
        );
    }

    #[test]
    fn rainbow_changes_with_time() {
        let mut later = input(1.0);
        later.seconds = 120.0;
        let now = ColourMode::Rainbow.colour(&input(1.0));
        let then = ColourMode::Rainbow.colour(&later);
        assert_ne!(now, then);
        assert!((now.3 - PARTICLE_ALPHA).abs() < f32::EPSILON);
    }

    #[test]
    fn rainbow_at_origin_is_red() {
        let mut origin = input(1.0);
        origin.position = Vec2::ZERO;
        let colour = ColourMode::Rainbow.colour(&origin);
        assert!(colour.0 > colour.1);
        assert!(colour.0 > colour.2);
    }

    #[test]
    fn cycling_wraps_around() {
        let mut mode = ColourMode::Rainbow;
        for _ in 0..ColourMode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, ColourMode::Rainbow);
        assert_eq!(ColourMode::Ocean.next(), ColourMode::Rainbow);
    }
}
