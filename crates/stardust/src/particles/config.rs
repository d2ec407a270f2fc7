//! All the variables that can be configured for the stardust effect

use super::colour_mode::ColourMode;

/// The allowed range of the target particle count.
pub const PARTICLE_COUNT_RANGE: std::ops::RangeInclusive<usize> = 10..=1000;
/// The allowed range of the pointer's gravity.
pub const GRAVITY_RANGE: std::ops::RangeInclusive<f32> = 0.1..=3.0;
/// The allowed range of the speed.
pub const SPEED_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Whether the pointer pulls particles towards it or pushes them away.
#[derive(
    serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq,
)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    /// Particles are pulled towards the pointer.
    Attract,
    /// Particles are pushed away from the pointer.
    Repel,
}

impl ForceMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Attract => Self::Repel,
            Self::Repel => Self::Attract,
        }
    }
}

impl std::fmt::Display for ForceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attract => write!(f, "attract"),
            Self::Repel => write!(f, "repel"),
        }
    }
}

/// All the config for the simulation
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Settings {
    /// The number of particles the simulation tops itself up to
    pub particle_count: usize,
    /// How strongly the pointer pulls or pushes. Also drives the downward "world" gravity and the
    /// reach of the pointer.
    pub gravity: f32,
    /// A multiplier for how far particles move each frame
    pub speed: u32,
    /// How particles are coloured
    pub colour_mode: ColourMode,
    /// Attract or repel
    pub force_mode: ForceMode,
    /// The pointer's reach, in pixels, when gravity is exactly 1.0
    pub base_radius: f32,
    /// How much changes in gravity grow or shrink the pointer's reach
    pub radius_scale: f32,
    /// Drawn particles are this much bigger or smaller than their simulated size
    pub render_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particle_count: 150,
            gravity: 1.3,
            speed: 5,
            colour_mode: ColourMode::Rainbow,
            force_mode: ForceMode::Attract,
            base_radius: 15.0,
            radius_scale: 6.0,
            render_scale: 0.5,
        }
    }
}

impl Settings {
    /// Pull the user-adjustable settings into the same ranges the keyboard controls keep them in.
    /// Gravity that isn't a number at all falls back to the default.
    #[must_use]
    pub fn clamped(self) -> Self {
        let gravity = if self.gravity.is_finite() {
            self.gravity.clamp(*GRAVITY_RANGE.start(), *GRAVITY_RANGE.end())
        } else if self.gravity.is_nan() {
            Self::default().gravity
        } else if self.gravity.is_sign_positive() {
            *GRAVITY_RANGE.end()
        } else {
            *GRAVITY_RANGE.start()
        };

        Self {
            particle_count: self
                .particle_count
                .clamp(*PARTICLE_COUNT_RANGE.start(), *PARTICLE_COUNT_RANGE.end()),
            gravity,
            speed: self.speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end()),
            ..self
        }
    }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    #[test]
    fn settings_in_range_are_untouched() {
        let settings = Settings::default();
        assert_eq!(settings.clone().clamped(), settings);
    }

    #[test]
    fn settings_out_of_range_are_clamped() {
        let settings = Settings {
            particle_count: 5_000_000,
            gravity: 40.0,
            speed: 0,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.particle_count, 1000);
        assert_eq!(settings.gravity, 3.0);
        assert_eq!(settings.speed, 1);

        let settings = Settings {
            particle_count: 0,
            gravity: -2.0,
            speed: 99,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.particle_count, 10);
        assert_eq!(settings.gravity, 0.1);
        assert_eq!(settings.speed, 10);
    }

    #[test]
    fn gravity_that_is_not_a_number_falls_back_to_the_default() {
        let settings = Settings {
            gravity: f32::NAN,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.gravity, Settings::default().gravity);

        let settings = Settings {
            gravity: f32::INFINITY,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.gravity, 3.0);
    }
}
