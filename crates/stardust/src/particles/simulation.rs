//! The simulation context. It owns every particle, the pointer field and the live settings, and
//! is only ever mutated by the task driving the frame loop.

use glam::Vec2;

use super::colour_mode::ColourMode;
use super::config::{ForceMode, Settings};
use super::field::Field;
use super::particle::Particle;
use crate::canvas::{from_rgb8, Canvas};

/// The translucent wash drawn over the whole canvas at the start of every frame.
const OVERLAY_ALPHA: f32 = 0.05;

/// The particle simulation
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Simulation {
    /// Width of the canvas in pixels
    pub width: f32,
    /// Height of the canvas in pixels
    pub height: f32,
    /// All the live particles
    pub particles: Vec<Particle>,
    /// The pointer
    pub field: Field,
    /// The user's settings
    pub settings: Settings,
}

impl Simulation {
    /// Initialise a new simulation
    #[must_use]
    pub fn new(width: f32, height: f32, settings: Settings) -> Self {
        Self {
            width,
            height,
            particles: Vec::with_capacity(settings.particle_count),
            field: Field::default(),
            settings,
        }
    }

    /// Is the simulation ready to run?
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// The size of the canvas as a vector.
    #[must_use]
    pub const fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// The canvas has changed size. Particles outside the new bounds bounce back in on their
    /// next update.
    pub const fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// A single frame: update and draw every particle, prune the dead, top the population back
    /// up, and handle spawning while the pointer is held.
    pub fn tick(&mut self, canvas: &mut impl Canvas, seconds: f32) {
        canvas.clear();
        canvas.fill_rect(
            Vec2::ZERO,
            Vec2::new(canvas.width(), canvas.height()),
            from_rgb8(10, 10, 46, OVERLAY_ALPHA),
        );

        let forces = self.field.forces(&self.settings, self.bounds(), seconds);
        let render_scale = self.settings.render_scale;
        for index in (0..self.particles.len()).rev() {
            let Some(particle) = self.particles.get_mut(index) else {
                continue;
            };
            particle.update(&forces);
            particle.draw(canvas, render_scale);
            if particle.is_dead() {
                self.particles.remove(index);
            }
        }

        self.replenish();

        if self.field.tick_hold() {
            self.hold_spawn();
        }
    }

    /// Change the target population. When lowered, excess particles are removed straight away.
    pub fn set_particle_count(&mut self, count: usize) {
        self.settings.particle_count = count;
        if self.particles.len() > count {
            self.particles.truncate(count);
        }
    }

    /// Change the strength of the pointer's gravity.
    pub const fn set_gravity(&mut self, gravity: f32) {
        self.settings.gravity = gravity;
    }

    /// Change how fast particles move.
    pub const fn set_speed(&mut self, speed: u32) {
        self.settings.speed = speed;
    }

    /// Change how particles are coloured.
    pub const fn set_colour_mode(&mut self, colour_mode: ColourMode) {
        self.settings.colour_mode = colour_mode;
    }

    /// Change whether the pointer attracts or repels.
    pub const fn set_force_mode(&mut self, force_mode: ForceMode) {
        self.settings.force_mode = force_mode;
    }

    /// Replace all the settings at once, eg when the config file changes.
    pub fn apply_settings(&mut self, settings: Settings) {
        let count = settings.particle_count;
        self.settings = settings;
        self.set_particle_count(count);
    }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "Tests aren't so strict")]
pub(crate) mod test {
    use super::*;
    use crate::canvas::Colour;

    /// A canvas that just remembers what was asked of it.
    #[derive(Default)]
    pub(crate) struct RecordingCanvas {
        pub calls: Vec<&'static str>,
        pub overlay: Option<Colour>,
    }

    impl Canvas for RecordingCanvas {
        fn width(&self) -> f32 {
            100.0
        }
        fn height(&self) -> f32 {
            100.0
        }
        fn clear(&mut self) {
            self.calls.push("clear");
        }
        fn fill_rect(&mut self, _origin: Vec2, _size: Vec2, colour: Colour) {
            self.calls.push("fill_rect");
            self.overlay = Some(colour);
        }
        fn fill_circle(&mut self, _centre: Vec2, _radius: f32, _colour: Colour) {
            self.calls.push("fill_circle");
        }
        fn stroke_polyline(&mut self, _points: &[Vec2], _width: f32, _colour: Colour) {
            self.calls.push("stroke_polyline");
        }
        fn fill_radial_gradient(&mut self, _c: Vec2, _r: f32, _inner: Colour, _outer: Colour) {
            self.calls.push("fill_radial_gradient");
        }
    }

    fn simulation(count: usize) -> Simulation {
        let settings = Settings {
            particle_count: count,
            ..Settings::default()
        };
        Simulation::new(100.0, 100.0, settings)
    }

    #[test]
    fn first_tick_fills_population() {
        let mut sim = simulation(40);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);
        assert_eq!(sim.particles.len(), 40);
    }

    #[test]
    fn overlay_is_drawn_before_particles() {
        let mut sim = simulation(3);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);
        sim.tick(&mut canvas, 0.0);
        assert_eq!(canvas.calls.first(), Some(&"clear"));
        assert_eq!(canvas.calls.get(1), Some(&"fill_rect"));
        assert_eq!(canvas.overlay.map(|colour| colour.3), Some(OVERLAY_ALPHA));
        assert!(canvas.calls.contains(&"fill_circle"));
        assert!(canvas.calls.contains(&"fill_radial_gradient"));
    }

    #[test]
    fn dead_particles_are_removed_and_replaced() {
        let mut sim = simulation(10);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);
        for particle in &mut sim.particles {
            particle.life = 0.001;
        }
        sim.tick(&mut canvas, 0.0);

        assert_eq!(sim.particles.len(), 10);
        for particle in &sim.particles {
            assert_eq!(particle.life, 1.0);
        }
    }

    #[test]
    fn removing_a_dead_particle_keeps_the_draw_order() {
        let mut sim = simulation(10);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);

        let mut decays = Vec::new();
        let mut decay = 0.0;
        for (index, particle) in sim.particles.iter_mut().enumerate() {
            decay += 0.0001;
            particle.decay = if index == 4 { 2.0 } else { decay };
            decays.push(particle.decay);
        }
        decays.remove(4);
        sim.tick(&mut canvas, 0.0);

        let survivors: Vec<f32> = sim
            .particles
            .iter()
            .take(9)
            .map(|particle| particle.decay)
            .collect();
        assert_eq!(survivors, decays);
        assert_eq!(sim.particles.len(), 10);
    }

    #[test]
    fn no_negative_life_survives_a_frame() {
        let mut sim = simulation(50);
        let mut canvas = RecordingCanvas::default();
        for _ in 0..500 {
            sim.tick(&mut canvas, 0.0);
            assert!(sim.particles.iter().all(|particle| particle.life > 0.0));
        }
    }

    #[test]
    fn lowering_count_trims_immediately() {
        let mut sim = simulation(50);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);
        sim.set_particle_count(20);
        assert_eq!(sim.particles.len(), 20);
        sim.tick(&mut canvas, 0.0);
        assert_eq!(sim.particles.len(), 20);
    }

    #[test]
    fn holding_the_pointer_spawns_every_fifth_frame() {
        let mut sim = simulation(10);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);
        for particle in &mut sim.particles {
            particle.decay = 0.0;
        }
        sim.field.press(Vec2::new(50.0, 50.0));

        for _ in 0..4 {
            sim.tick(&mut canvas, 0.0);
        }
        assert_eq!(sim.particles.len(), 10);

        sim.tick(&mut canvas, 0.0);
        assert_eq!(sim.particles.len(), 12);

        sim.field.release();
        for _ in 0..10 {
            sim.tick(&mut canvas, 0.0);
        }
        assert!(sim.particles.len() <= 12);
    }

    #[test]
    fn apply_settings_replaces_everything() {
        let mut sim = simulation(30);
        let mut canvas = RecordingCanvas::default();
        sim.tick(&mut canvas, 0.0);

        let settings = Settings {
            particle_count: 5,
            colour_mode: ColourMode::Ocean,
            ..Settings::default()
        };
        sim.apply_settings(settings.clone());
        assert_eq!(sim.settings, settings);
        assert_eq!(sim.particles.len(), 5);
    }
}
