//! A single speck of stardust and the rule that moves it every frame.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng as _;

use super::colour_mode::ColourInput;
use super::config::ForceMode;
use super::field::Forces;
use crate::canvas::{with_alpha, Canvas, Colour};

/// The number of past positions kept for drawing a particle's trail.
pub const TRAIL_LENGTH: usize = 8;

/// How much velocity survives bouncing off the edge of the canvas.
pub const BOUNCE_DAMPING: f32 = 0.8;

/// Scales the pointer's pull or push.
const POINTER_FORCE_SCALE: f32 = 0.2;

/// Scales the constant downwards pull.
const WORLD_GRAVITY_SCALE: f32 = 0.01;

/// Scales the user's speed setting down to something visually calm.
const SPEED_SCALE: f32 = 0.1;

/// Particles that first appear scattered over the canvas.
const SCATTERED_SIZE: std::ops::Range<f32> = 1.0..5.0;
/// The range of each axis of a scattered particle's initial velocity.
const SCATTERED_VELOCITY: std::ops::Range<f32> = -2.0..2.0;
/// How much life a scattered particle loses every frame.
const SCATTERED_DECAY: std::ops::Range<f32> = 0.002..0.007;

/// The colour particles have before their first update.
const INITIAL_COLOUR: Colour = (0.4, 0.494, 0.918, 0.8);

/// A particle
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Particle {
    /// Where the particle is
    pub position: Vec2,
    /// Where the particle is going
    pub velocity: Vec2,
    /// The radius of the particle
    pub size: f32,
    /// Remaining life, starting at 1.0. The particle is dead when this reaches 0.0
    pub life: f32,
    /// How much life is lost every frame
    pub decay: f32,
    /// The most recent positions, oldest first
    pub trail: VecDeque<Vec2>,
    /// The colour from the last update
    pub colour: Colour,
}

impl Particle {
    /// Create a particle with explicit state.
    #[must_use]
    pub fn new(position: Vec2, velocity: Vec2, size: f32, decay: f32) -> Self {
        Self {
            position,
            velocity,
            size,
            life: 1.0,
            decay,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            colour: INITIAL_COLOUR,
        }
    }

    /// Create a particle somewhere random on a canvas of the given size, drifting in a random
    /// direction.
    #[must_use]
    pub fn scattered(bounds: Vec2) -> Self {
        let mut rng = rand::thread_rng();
        let position = Vec2::new(
            rng.gen_range(0.0..=bounds.x.max(0.0)),
            rng.gen_range(0.0..=bounds.y.max(0.0)),
        );
        let velocity = Vec2::new(
            rng.gen_range(SCATTERED_VELOCITY),
            rng.gen_range(SCATTERED_VELOCITY),
        );
        Self::new(
            position,
            velocity,
            rng.gen_range(SCATTERED_SIZE),
            rng.gen_range(SCATTERED_DECAY),
        )
    }

    /// Whether the particle has run out of life.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Advance the particle by one frame.
    pub fn update(&mut self, forces: &Forces) {
        self.apply_pointer_force(forces);
        self.velocity.y += forces.gravity * WORLD_GRAVITY_SCALE;
        self.position += self.velocity * forces.speed * SPEED_SCALE;
        self.bounce(forces.bounds);
        self.life -= self.decay;
        self.record_trail();
        self.colour = forces.colour_mode.colour(&ColourInput {
            position: self.position,
            life: self.life,
            bounds: forces.bounds,
            seconds: forces.seconds,
        });
    }

    /// Pull towards, or push away from, the pointer. The force falls off with distance but never
    /// quite reaches zero inside twice the effective radius.
    fn apply_pointer_force(&mut self, forces: &Forces) {
        let delta = forces.pointer - self.position;
        let distance = delta.length();
        if distance >= forces.effective_radius * 2.0 {
            return;
        }

        let normalised_distance = (distance / forces.effective_radius).min(2.0);
        let force = 1.0 / (normalised_distance * normalised_distance + 1.0);
        let multiplier = force * forces.gravity * POINTER_FORCE_SCALE;
        let angle = delta.y.atan2(delta.x);
        let push = Vec2::new(angle.cos(), angle.sin()) * multiplier;

        match forces.force_mode {
            ForceMode::Attract => self.velocity += push,
            ForceMode::Repel => self.velocity -= push,
        }
    }

    /// Bounce off the edges of the canvas, losing some energy.
    fn bounce(&mut self, bounds: Vec2) {
        if self.position.x <= 0.0 || self.position.x >= bounds.x {
            self.velocity.x *= -BOUNCE_DAMPING;
            self.position.x = if self.position.x <= 0.0 { 0.0 } else { bounds.x };
        }
        if self.position.y <= 0.0 || self.position.y >= bounds.y {
            self.velocity.y *= -BOUNCE_DAMPING;
            self.position.y = if self.position.y <= 0.0 { 0.0 } else { bounds.y };
        }
    }

    /// Remember the current position, forgetting the oldest one when the trail is full.
    fn record_trail(&mut self) {
        self.trail.push_back(self.position);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    /// Draw the particle: its trail, its body and a soft glow around it.
    pub fn draw(&self, canvas: &mut impl Canvas, render_scale: f32) {
        if self.is_dead() {
            return;
        }

        let radius = self.size * render_scale;
        canvas.fill_circle(self.position, radius, self.colour);

        if self.trail.len() > 1 {
            let points: Vec<Vec2> = self.trail.iter().copied().collect();
            canvas.stroke_polyline(&points, radius * 0.5, with_alpha(self.colour, 0.3));
        }

        canvas.fill_radial_gradient(
            self.position,
            radius * 3.0,
            with_alpha(self.colour, 0.6),
            with_alpha(self.colour, 0.0),
        );
    }
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;
    use crate::particles::{
        colour_mode::ColourMode,
        config::Settings,
        field::{Field, OFF_CANVAS},
    };

    fn forces_with(pointer: Vec2, force_mode: ForceMode, speed: u32) -> Forces {
        let mut field = Field::default();
        field.move_pointer(pointer);
        let settings = Settings {
            speed,
            force_mode,
            colour_mode: ColourMode::Mono,
            ..Settings::default()
        };
        field.forces(&settings, Vec2::new(100.0, 100.0), 0.0)
    }

    #[test]
    fn bounce_off_left_wall() {
        let mut particle = Particle::new(Vec2::new(50.0, 50.0), Vec2::new(-10.0, 0.0), 1.0, 0.0);
        let mut forces = forces_with(OFF_CANVAS, ForceMode::Attract, 100);
        forces.gravity = 0.0;
        particle.update(&forces);

        assert_eq!(particle.position.x, 0.0);
        assert!((particle.velocity.x - 8.0).abs() < 1e-5);
    }

    #[test]
    fn bounce_off_bottom_wall() {
        let mut particle = Particle::new(Vec2::new(50.0, 95.0), Vec2::new(0.0, 10.0), 1.0, 0.0);
        let mut forces = forces_with(OFF_CANVAS, ForceMode::Attract, 10);
        forces.gravity = 0.0;
        particle.update(&forces);

        assert_eq!(particle.position.y, 100.0);
        assert!((particle.velocity.y + 8.0).abs() < 1e-5);
    }

    #[test]
    fn life_only_goes_down() {
        let mut particle = Particle::scattered(Vec2::new(100.0, 100.0));
        let forces = forces_with(Vec2::new(50.0, 50.0), ForceMode::Attract, 5);
        let mut previous = particle.life;
        for _ in 0..50 {
            particle.update(&forces);
            assert!(particle.life < previous);
            previous = particle.life;
        }
    }

    #[test]
    fn trail_keeps_most_recent_positions_in_order() {
        let mut particle = Particle::new(Vec2::new(10.0, 50.0), Vec2::new(1.0, 0.0), 1.0, 0.0);
        let mut forces = forces_with(OFF_CANVAS, ForceMode::Attract, 10);
        forces.gravity = 0.0;

        let mut positions = Vec::new();
        for _ in 0..12 {
            particle.update(&forces);
            positions.push(particle.position);
        }

        assert_eq!(particle.trail.len(), TRAIL_LENGTH);
        let expected: Vec<Vec2> = positions[positions.len() - TRAIL_LENGTH..].to_vec();
        let actual: Vec<Vec2> = particle.trail.iter().copied().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn repel_pushes_further_than_attract() {
        let pointer = Vec2::new(50.0, 50.0);
        let start = Particle::new(Vec2::new(40.0, 50.0), Vec2::ZERO, 1.0, 0.0);

        let mut attracted = start.clone();
        let mut repelled = start;
        for _ in 0..5 {
            attracted.update(&forces_with(pointer, ForceMode::Attract, 5));
            repelled.update(&forces_with(pointer, ForceMode::Repel, 5));
        }

        let attracted_distance = attracted.position.distance(pointer);
        let repelled_distance = repelled.position.distance(pointer);
        assert!(repelled_distance > attracted_distance);
        assert!(repelled_distance > 10.0);
    }

    #[test]
    fn far_away_pointer_has_no_influence() {
        let mut particle = Particle::new(Vec2::new(50.0, 50.0), Vec2::ZERO, 1.0, 0.0);
        let mut forces = forces_with(OFF_CANVAS, ForceMode::Attract, 5);
        forces.gravity = 0.0;
        particle.update(&forces);
        assert_eq!(particle.velocity, Vec2::ZERO);
    }

    #[test]
    fn world_gravity_pulls_down() {
        let mut particle = Particle::new(Vec2::new(50.0, 50.0), Vec2::ZERO, 1.0, 0.0);
        let forces = forces_with(OFF_CANVAS, ForceMode::Attract, 5);
        particle.update(&forces);
        assert!(particle.velocity.y > 0.0);
        assert_eq!(particle.velocity.x, 0.0);
    }

    #[test]
    fn colour_follows_mode() {
        let mut particle = Particle::new(Vec2::new(50.0, 50.0), Vec2::ZERO, 1.0, 0.01);
        let mut forces = forces_with(OFF_CANVAS, ForceMode::Attract, 5);
        forces.colour_mode = ColourMode::Fire;
        particle.update(&forces);
        assert_eq!(particle.colour.0, 1.0);
    }

    #[test]
    fn scattered_particles_start_on_the_canvas() {
        let bounds = Vec2::new(80.0, 40.0);
        for _ in 0..100 {
            let particle = Particle::scattered(bounds);
            assert!((0.0..=80.0).contains(&particle.position.x));
            assert!((0.0..=40.0).contains(&particle.position.y));
            assert!(SCATTERED_SIZE.contains(&particle.size));
            assert!(SCATTERED_DECAY.contains(&particle.decay));
            assert_eq!(particle.life, 1.0);
        }
    }
}
