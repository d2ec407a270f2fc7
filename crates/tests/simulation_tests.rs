//! Drive the particle simulation for many frames through its public API.
#[cfg(test)]
#[expect(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    clippy::indexing_slicing,
    reason = "Tests aren't so strict"
)]
mod simulation {
    use glam::Vec2;
    use stardust::canvas::Canvas as _;
    use stardust::framebuffer::Framebuffer;
    use stardust::particles::config::{ForceMode, Settings};
    use stardust::particles::interaction::{Interaction, PointerButton, PointerEvent, Region};
    use stardust::particles::simulation::Simulation;
    use stardust::particles::spawn::Burst;
    use stardust::surface::Surface;

    const COLS: u16 = 60;
    const ROWS: u16 = 20;

    fn setup(settings: Settings) -> (Simulation, Framebuffer) {
        let framebuffer = Framebuffer::for_terminal(COLS, ROWS).unwrap();
        let simulation = Simulation::new(framebuffer.width(), framebuffer.height(), settings);
        (simulation, framebuffer)
    }

    fn run_frames(simulation: &mut Simulation, framebuffer: &mut Framebuffer, frames: usize) {
        for frame in 0..frames {
            simulation.tick(framebuffer, frame as f32 / 60.0);
        }
    }

    fn no_replenishing() -> Settings {
        let mut settings = Settings::default();
        settings.particle_count = 0;
        settings
    }

    #[test]
    fn population_is_kept_at_target() {
        let (mut simulation, mut framebuffer) = setup(Settings::default());
        for frame in 0..600 {
            simulation.tick(&mut framebuffer, frame as f32 / 60.0);
            assert_eq!(simulation.particles.len(), 150, "frame {frame}");
            assert!(simulation.particles.iter().all(|particle| particle.life > 0.0));
        }
    }

    #[test]
    fn life_only_ever_decreases() {
        let (mut simulation, mut framebuffer) = setup(no_replenishing());
        simulation.burst(Vec2::new(30.0, 20.0), 40, 1.0);

        let mut previous: Vec<f32> = simulation.particles.iter().map(|p| p.life).collect();
        for frame in 0..20 {
            simulation.tick(&mut framebuffer, frame as f32 / 60.0);
            assert_eq!(simulation.particles.len(), previous.len());
            let current: Vec<f32> = simulation.particles.iter().map(|p| p.life).collect();
            for (before, after) in previous.iter().zip(&current) {
                assert!(after < before, "{after} >= {before}");
            }
            previous = current;
        }
    }

    #[test]
    fn burst_particles_eventually_all_expire() {
        let (mut simulation, mut framebuffer) = setup(no_replenishing());
        simulation.spawn(Vec2::new(30.0, 20.0), Burst::SECONDARY);
        assert_eq!(simulation.particles.len(), 50);

        // The slowest burst particles lose 0.005 of their life every frame.
        run_frames(&mut simulation, &mut framebuffer, 201);
        assert!(simulation.particles.is_empty());
    }

    #[test]
    fn particles_stay_on_the_canvas() {
        let mut settings = Settings::default();
        settings.speed = 10;
        settings.gravity = 3.0;
        let (mut simulation, mut framebuffer) = setup(settings);
        let bounds = simulation.bounds();

        for frame in 0..300 {
            simulation.tick(&mut framebuffer, frame as f32 / 60.0);
            for particle in &simulation.particles {
                assert!(particle.position.x >= 0.0 && particle.position.x <= bounds.x);
                assert!(particle.position.y >= 0.0 && particle.position.y <= bounds.y);
            }
        }
    }

    #[test]
    fn holding_the_pointer_keeps_spawning() {
        let (mut simulation, mut framebuffer) = setup(no_replenishing());
        let interaction = Interaction::default();
        let point = Vec2::new(10.0, 10.0);

        interaction.handle(
            PointerEvent::Press(point, PointerButton::Primary),
            &mut simulation,
        );
        assert_eq!(simulation.particles.len(), Burst::PRIMARY.count);

        run_frames(&mut simulation, &mut framebuffer, 10);
        assert_eq!(simulation.particles.len(), Burst::PRIMARY.count + 4);

        interaction.handle(PointerEvent::Release, &mut simulation);
        run_frames(&mut simulation, &mut framebuffer, 10);
        assert_eq!(simulation.particles.len(), Burst::PRIMARY.count + 4);
    }

    #[test]
    fn secondary_press_is_a_one_off() {
        let (mut simulation, mut framebuffer) = setup(no_replenishing());
        let interaction = Interaction::default();

        interaction.handle(
            PointerEvent::Press(Vec2::new(10.0, 10.0), PointerButton::Secondary),
            &mut simulation,
        );
        run_frames(&mut simulation, &mut framebuffer, 10);
        assert_eq!(simulation.particles.len(), Burst::SECONDARY.count);
        assert!(!simulation.field.is_pointer_down);
    }

    #[test]
    fn presses_on_controls_are_ignored() {
        let (mut simulation, mut framebuffer) = setup(no_replenishing());
        let mut interaction = Interaction::default();
        interaction.set_ui_regions(vec![Region::new(
            Vec2::new(40.0, 0.0),
            Vec2::new(20.0, 10.0),
        )]);

        interaction.handle(
            PointerEvent::Press(Vec2::new(45.0, 5.0), PointerButton::Primary),
            &mut simulation,
        );
        interaction.handle(PointerEvent::TouchStart(Vec2::new(45.0, 5.0)), &mut simulation);
        run_frames(&mut simulation, &mut framebuffer, 10);
        assert!(simulation.particles.is_empty());
    }

    #[test]
    fn repelling_clears_space_around_the_pointer() {
        let mut attract_settings = Settings::default();
        attract_settings.gravity = 2.0;
        let mut repel_settings = attract_settings.clone();
        repel_settings.force_mode = ForceMode::Repel;

        let centre = Vec2::new(30.0, 20.0);
        let mut distances = Vec::new();
        for settings in [attract_settings, repel_settings] {
            let (mut simulation, mut framebuffer) = setup(settings);
            simulation.field.move_pointer(centre);
            run_frames(&mut simulation, &mut framebuffer, 120);
            let average = simulation
                .particles
                .iter()
                .map(|particle| particle.position.distance(centre))
                .sum::<f32>()
                / simulation.particles.len() as f32;
            distances.push(average);
        }

        assert!(distances[0] < distances[1], "{distances:?}");
    }

    #[test]
    fn lowering_the_target_trims_straight_away() {
        let (mut simulation, mut framebuffer) = setup(Settings::default());
        run_frames(&mut simulation, &mut framebuffer, 5);

        simulation.set_particle_count(20);
        assert_eq!(simulation.particles.len(), 20);
        run_frames(&mut simulation, &mut framebuffer, 5);
        assert_eq!(simulation.particles.len(), 20);
    }

    #[test]
    fn frames_become_half_block_cells() {
        let (mut simulation, mut framebuffer) = setup(Settings::default());
        run_frames(&mut simulation, &mut framebuffer, 30);
        assert!(framebuffer.visible_pixels().count() > 0);

        let mut surface = Surface::from_framebuffer(&framebuffer, COLS.into(), ROWS.into());
        let glyphs = surface
            .surface
            .screen_cells()
            .iter()
            .flat_map(|line| line.iter())
            .filter(|cell| cell.str() == "▀" || cell.str() == "▄")
            .count();
        assert!(glyphs > 0);
    }
}
