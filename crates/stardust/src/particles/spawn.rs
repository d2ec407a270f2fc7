//! Functions that add and remove particles

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng as _;

use super::{particle::Particle, simulation::Simulation};

/// The range of a burst particle's speed, before the burst's own multiplier.
pub const BURST_SPEED: std::ops::Range<f32> = 2.0..7.0;
/// The range of a burst particle's size.
const BURST_SIZE: std::ops::Range<f32> = 1.0..4.0;
/// Burst particles burn out quicker than scattered ones.
const BURST_DECAY: std::ops::Range<f32> = 0.005..0.015;

/// The number of particles spawned every few frames whilst the pointer is held down.
pub const HOLD_BURST_COUNT: usize = 2;

/// The kinds of burst the effect uses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Burst {
    /// How many particles
    pub count: usize,
    /// How fast they fly out
    pub speed_multiplier: f32,
}

impl Burst {
    /// A small, gentle burst for a primary click.
    pub const PRIMARY: Self = Self {
        count: 5,
        speed_multiplier: 1.2,
    };

    /// A big, fast, one-shot burst for a secondary click.
    pub const SECONDARY: Self = Self {
        count: 50,
        speed_multiplier: 2.5,
    };

    /// The large burst that greets the user when the effect starts.
    pub const INITIAL: Self = Self {
        count: 100,
        speed_multiplier: 1.0,
    };
}

impl Simulation {
    /// Create enough scattered particles to get back to the target population.
    pub fn replenish(&mut self) {
        let target = self.settings.particle_count;
        let shortfall = target.saturating_sub(self.particles.len());
        for _ in 0..shortfall {
            self.add_scattered_particle();
        }
    }

    /// Add a single particle somewhere random on the canvas.
    pub fn add_scattered_particle(&mut self) {
        self.particles.push(Particle::scattered(self.bounds()));
    }

    /// Shoot `count` particles out from a single point in random directions.
    pub fn burst(&mut self, origin: Vec2, count: usize, speed_multiplier: f32) {
        tracing::trace!("Bursting {count} particles at {origin}");

        let mut rng = rand::thread_rng();
        self.particles.reserve(count);
        for _ in 0..count {
            let angle = rng.gen_range(0.0..TAU);
            let speed = rng.gen_range(BURST_SPEED) * speed_multiplier;
            let velocity = Vec2::new(angle.cos(), angle.sin()) * speed;
            let particle = Particle::new(
                origin,
                velocity,
                rng.gen_range(BURST_SIZE),
                rng.gen_range(BURST_DECAY),
            );
            self.particles.push(particle);
        }
    }

    /// Spawn one of the effect's predefined bursts.
    pub fn spawn(&mut self, origin: Vec2, burst: Burst) {
        self.burst(origin, burst.count, burst.speed_multiplier);
    }

    /// The small burst at the pointer, spawned periodically while it's held down.
    pub fn hold_spawn(&mut self) {
        self.burst(self.field.pointer, HOLD_BURST_COUNT, 1.0);
    }

    /// A burst from the middle of the canvas.
    pub fn centre_burst(&mut self, burst: Burst) {
        self.spawn(self.bounds() / 2.0, burst);
    }

    /// Remove every particle.
    pub fn clear_particles(&mut self) {
        tracing::debug!("Clearing {} particles", self.particles.len());
        self.particles.clear();
    }
}
