//! The little settings panel in the top-right of the terminal, and the keyboard controls that
//! change the settings it shows.

use glam::Vec2;

use super::config::{GRAVITY_RANGE, PARTICLE_COUNT_RANGE, SPEED_RANGE};
use super::interaction::Region;
use super::simulation::Simulation;
use crate::canvas::Colour;
use crate::config::input::{KeybindingAction, KeybindingsAsEvents};
use crate::surface::Surface;

/// How much the target particle count changes with each key press.
pub const PARTICLE_COUNT_STEP: usize = 10;
/// How much gravity changes with each key press.
pub const GRAVITY_STEP: f32 = 0.1;

/// Panel background.
const BACKGROUND: Colour = (0.06, 0.06, 0.16, 1.0);
/// Panel text.
const FOREGROUND: Colour = (0.85, 0.87, 1.0, 1.0);
/// The panel's title.
const TITLE: &str = "✦ Stardust";
/// Cells between the panel and the edge of the terminal.
const MARGIN: usize = 1;

/// What happened after a keyboard control was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A setting changed, or nothing happened.
    Continue,
    /// The user wants to exit.
    Quit,
}

/// The settings panel
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Panel {
    /// Whether the panel is drawn. A hidden panel doesn't block pointer presses.
    pub is_visible: bool,
}

impl Panel {
    /// Instantiate
    #[must_use]
    pub const fn new(is_visible: bool) -> Self {
        Self { is_visible }
    }

    /// Apply a keyboard control to the simulation. Values are clamped, so the simulation itself
    /// never has to validate its settings.
    pub fn apply(&mut self, action: KeybindingAction, simulation: &mut Simulation) -> Outcome {
        tracing::debug!("Applying keyboard control: {action:?}");

        let settings = simulation.settings.clone();
        match action {
            KeybindingAction::ParticlesMore => {
                let count = settings.particle_count.saturating_add(PARTICLE_COUNT_STEP);
                simulation.set_particle_count(Self::clamp_count(count));
            }
            KeybindingAction::ParticlesFewer => {
                let count = settings.particle_count.saturating_sub(PARTICLE_COUNT_STEP);
                simulation.set_particle_count(Self::clamp_count(count));
            }
            KeybindingAction::GravityUp => {
                simulation.set_gravity(Self::step_gravity(settings.gravity, GRAVITY_STEP));
            }
            KeybindingAction::GravityDown => {
                simulation.set_gravity(Self::step_gravity(settings.gravity, -GRAVITY_STEP));
            }
            KeybindingAction::SpeedUp => {
                let speed = settings.speed.saturating_add(1);
                simulation.set_speed(speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end()));
            }
            KeybindingAction::SpeedDown => {
                let speed = settings.speed.saturating_sub(1);
                simulation.set_speed(speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end()));
            }
            KeybindingAction::CycleColourMode => {
                simulation.set_colour_mode(settings.colour_mode.next());
            }
            KeybindingAction::ToggleForceMode => {
                simulation.set_force_mode(settings.force_mode.toggled());
            }
            KeybindingAction::ClearParticles => simulation.clear_particles(),
            KeybindingAction::TogglePanel => self.is_visible = !self.is_visible,
            KeybindingAction::Quit => return Outcome::Quit,
        }

        Outcome::Continue
    }

    /// Keep a particle count in range, and on a step boundary.
    fn clamp_count(count: usize) -> usize {
        let stepped = count
            .div_euclid(PARTICLE_COUNT_STEP)
            .saturating_mul(PARTICLE_COUNT_STEP);
        stepped.clamp(*PARTICLE_COUNT_RANGE.start(), *PARTICLE_COUNT_RANGE.end())
    }

    /// Move gravity by a step, rounded to the step so that repeated presses don't drift.
    fn step_gravity(gravity: f32, step: f32) -> f32 {
        let stepped = ((gravity + step) / GRAVITY_STEP).round() * GRAVITY_STEP;
        stepped.clamp(*GRAVITY_RANGE.start(), *GRAVITY_RANGE.end())
    }

    /// A short human label for a key, like `G` or `Ctrl-c`.
    fn key_label(keybindings: &KeybindingsAsEvents, action: KeybindingAction) -> String {
        use termwiz::input::{KeyCode, Modifiers};

        let Some(event) = keybindings.get(&action) else {
            return "?".to_owned();
        };

        let mut label = String::new();
        if event.modifiers.contains(Modifiers::CTRL) {
            label.push_str("Ctrl-");
        }
        if event.modifiers.contains(Modifiers::ALT) {
            label.push_str("Alt-");
        }
        #[expect(
            clippy::wildcard_enum_match_arm,
            reason = "Every other key just uses its name"
        )]
        let name = match event.key {
            KeyCode::Char(character) => character.to_string(),
            other => format!("{other:?}"),
        };
        label.push_str(&name);
        label
    }

    /// The text of the panel, one entry per line, all padded to the same width.
    #[must_use]
    pub fn lines(
        simulation: &Simulation,
        fps: f64,
        keybindings: &KeybindingsAsEvents,
    ) -> Vec<String> {
        let settings = &simulation.settings;
        let key = |action| Self::key_label(keybindings, action);
        let pair = |up, down| format!("{}/{}", key(up), key(down));

        let rows = [
            (
                "Particles".to_owned(),
                format!("{}/{}", simulation.particles.len(), settings.particle_count),
                pair(
                    KeybindingAction::ParticlesMore,
                    KeybindingAction::ParticlesFewer,
                ),
            ),
            (
                "Gravity".to_owned(),
                format!("{:.1}", settings.gravity),
                pair(KeybindingAction::GravityUp, KeybindingAction::GravityDown),
            ),
            (
                "Speed".to_owned(),
                settings.speed.to_string(),
                pair(KeybindingAction::SpeedUp, KeybindingAction::SpeedDown),
            ),
            (
                "Colours".to_owned(),
                settings.colour_mode.to_string(),
                key(KeybindingAction::CycleColourMode),
            ),
            (
                "Mode".to_owned(),
                settings.force_mode.to_string(),
                key(KeybindingAction::ToggleForceMode),
            ),
            ("FPS".to_owned(), format!("{fps:.1}"), String::new()),
        ];

        let mut lines = vec![format!(" {TITLE}")];
        for (name, value, keys) in rows {
            lines.push(format!(" {name:<10}{value:<9}{keys} "));
        }
        lines.push(format!(
            " {} clear  {} hide  {} quit ",
            key(KeybindingAction::ClearParticles),
            key(KeybindingAction::TogglePanel),
            key(KeybindingAction::Quit),
        ));

        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or_default();
        lines
            .into_iter()
            .map(|line| format!("{line:<width$}"))
            .collect()
    }

    /// The top-left cell of the panel, if it fits in the terminal.
    fn origin(
        lines: &[String],
        terminal_width: usize,
        terminal_height: usize,
    ) -> Option<(usize, usize)> {
        let width = lines.first().map(|line| line.chars().count())?;
        let col = terminal_width.checked_sub(width + MARGIN)?;
        if lines.len() + MARGIN > terminal_height {
            return None;
        }
        Some((col, MARGIN))
    }

    /// The area covered by the panel, in canvas pixels. Presses here are meant for the panel, not
    /// the particles.
    #[must_use]
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Terminal sizes are far smaller than f32's precision limit"
    )]
    pub fn region(
        &self,
        lines: &[String],
        terminal_width: usize,
        terminal_height: usize,
    ) -> Option<Region> {
        if !self.is_visible {
            return None;
        }
        let (col, row) = Self::origin(lines, terminal_width, terminal_height)?;
        let width = lines.first().map(|line| line.chars().count())?;
        Some(Region::new(
            Vec2::new(col as f32, (row * 2) as f32),
            Vec2::new(width as f32, (lines.len() * 2) as f32),
        ))
    }

    /// Draw the panel over the top of a frame.
    pub fn draw(&self, lines: &[String], surface: &mut Surface) {
        if !self.is_visible {
            return;
        }
        let Some((col, row)) = Self::origin(lines, surface.width, surface.height) else {
            return;
        };
        for (offset, line) in lines.iter().enumerate() {
            surface.add_text(
                col,
                row + offset,
                line.clone(),
                Some(BACKGROUND),
                Some(FOREGROUND),
            );
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::as_conversions,
    clippy::cast_precision_loss,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;
    use crate::particles::{colour_mode::ColourMode, config::ForceMode, config::Settings};

    fn simulation() -> Simulation {
        Simulation::new(100.0, 100.0, Settings::default())
    }

    fn keybindings() -> KeybindingsAsEvents {
        let mut keybindings = KeybindingsAsEvents::new();
        keybindings.insert(
            KeybindingAction::GravityUp,
            termwiz::input::KeyEvent {
                modifiers: termwiz::input::Modifiers::NONE,
                key: termwiz::input::KeyCode::Char('G'),
            },
        );
        keybindings.insert(
            KeybindingAction::Quit,
            termwiz::input::KeyEvent {
                modifiers: termwiz::input::Modifiers::CTRL,
                key: termwiz::input::KeyCode::Char('c'),
            },
        );
        keybindings
    }

    #[test]
    fn particle_count_is_clamped() {
        let mut panel = Panel::new(true);
        let mut sim = simulation();
        sim.set_particle_count(995);
        panel.apply(KeybindingAction::ParticlesMore, &mut sim);
        assert_eq!(sim.settings.particle_count, 1000);
        panel.apply(KeybindingAction::ParticlesMore, &mut sim);
        assert_eq!(sim.settings.particle_count, 1000);

        sim.set_particle_count(15);
        panel.apply(KeybindingAction::ParticlesFewer, &mut sim);
        assert_eq!(sim.settings.particle_count, 10);
    }

    #[test]
    fn fewer_particles_trims_immediately() {
        let mut panel = Panel::new(true);
        let mut sim = simulation();
        sim.replenish();
        panel.apply(KeybindingAction::ParticlesFewer, &mut sim);
        assert_eq!(sim.settings.particle_count, 140);
        assert_eq!(sim.particles.len(), 140);
    }

    #[test]
    fn gravity_steps_without_drifting() {
        let mut panel = Panel::new(true);
        let mut sim = simulation();
        for _ in 0..30 {
            panel.apply(KeybindingAction::GravityUp, &mut sim);
        }
        assert_eq!(sim.settings.gravity, 3.0);
        for _ in 0..28 {
            panel.apply(KeybindingAction::GravityDown, &mut sim);
        }
        assert!((sim.settings.gravity - 0.2).abs() < 1e-5);
        for _ in 0..5 {
            panel.apply(KeybindingAction::GravityDown, &mut sim);
        }
        assert!((sim.settings.gravity - 0.1).abs() < 1e-5);
    }

    #[test]
    fn speed_is_clamped() {
        let mut panel = Panel::new(true);
        let mut sim = simulation();
        for _ in 0..20 {
            panel.apply(KeybindingAction::SpeedUp, &mut sim);
        }
        assert_eq!(sim.settings.speed, 10);
        for _ in 0..20 {
            panel.apply(KeybindingAction::SpeedDown, &mut sim);
        }
        assert_eq!(sim.settings.speed, 1);
    }

    #[test]
    fn modes_and_toggles() {
        let mut panel = Panel::new(true);
        let mut sim = simulation();
        sim.replenish();

        panel.apply(KeybindingAction::CycleColourMode, &mut sim);
        assert_eq!(sim.settings.colour_mode, ColourMode::Mono);
        panel.apply(KeybindingAction::ToggleForceMode, &mut sim);
        assert_eq!(sim.settings.force_mode, ForceMode::Repel);
        panel.apply(KeybindingAction::ClearParticles, &mut sim);
        assert!(sim.particles.is_empty());
        panel.apply(KeybindingAction::TogglePanel, &mut sim);
        assert!(!panel.is_visible);
        assert_eq!(
            panel.apply(KeybindingAction::Quit, &mut sim),
            Outcome::Quit
        );
    }

    #[test]
    fn lines_show_settings_and_keys() {
        let sim = simulation();
        let lines = Panel::lines(&sim, 59.94, &keybindings());
        let text = lines.join("\n");
        assert!(text.contains("0/150"), "{text}");
        assert!(text.contains("1.3"), "{text}");
        assert!(text.contains("rainbow"), "{text}");
        assert!(text.contains("attract"), "{text}");
        assert!(text.contains("59.9"), "{text}");
        assert!(text.contains("G/?"), "{text}");
        assert!(text.contains("Ctrl-c quit"), "{text}");

        let width = lines[0].chars().count();
        assert!(lines.iter().all(|line| line.chars().count() == width));
    }

    #[test]
    fn region_is_in_the_top_right() {
        let panel = Panel::new(true);
        let lines = Panel::lines(&simulation(), 60.0, &keybindings());
        let width = lines[0].chars().count();

        let region = panel.region(&lines, 100, 40).unwrap();
        assert_eq!(region.origin, Vec2::new((100 - width - 1) as f32, 2.0));
        assert_eq!(region.size.y, (lines.len() * 2) as f32);

        assert!(panel.region(&lines, 10, 40).is_none());
        assert!(Panel::new(false).region(&lines, 100, 40).is_none());
    }

    #[test]
    fn drawing_writes_text() {
        let panel = Panel::new(true);
        let lines = Panel::lines(&simulation(), 60.0, &keybindings());
        let mut surface = Surface::new(100, 40);
        panel.draw(&lines, &mut surface);

        let width = lines[0].chars().count();
        let cells = surface.surface.screen_cells();
        assert_eq!(cells[1][100 - width - 1 + 1].str(), "✦");
    }
}
