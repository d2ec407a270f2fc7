//! The frame loop that drives the particles. It owns the simulation and is the only thing that
//! ever changes it: input, resizes and config changes all arrive as protocol messages and are
//! applied between frames.

use std::collections::VecDeque;
use std::sync::Arc;

use color_eyre::eyre::Result;

use super::interaction::Interaction;
use super::panel::{Outcome, Panel};
use super::pointer::PointerTracker;
use super::simulation::Simulation;
use super::spawn::Burst;
use crate::canvas::Canvas as _;
use crate::config::input::KeybindingsAsEvents;
use crate::framebuffer::Framebuffer;
use crate::run::Protocol;
use crate::shared_state::SharedState;
use crate::surface::Surface;

/// How long after starting before the welcoming burst of particles.
const INITIAL_BURST_DELAY: std::time::Duration = std::time::Duration::from_millis(500);

/// The number of frames that the FPS is averaged over.
const FPS_SAMPLES: usize = 30;

/// `Stardust`
pub struct Stardust {
    /// Shared app state
    state: Arc<SharedState>,
    /// A channel to send finished frames to the renderer.
    output: tokio::sync::mpsc::Sender<Surface>,
    /// All the particles and the pointer
    pub simulation: Simulation,
    /// Where particles are drawn
    framebuffer: Framebuffer,
    /// Turns pointer events into bursts and changes to the pointer field.
    interaction: Interaction,
    /// Turns terminal mouse reports into pointer events.
    pointer: PointerTracker,
    /// The settings panel
    pub panel: Panel,
    /// Our own copy of the keybindings. Saves taking read locks on every key press.
    keybindings: KeybindingsAsEvents,
    /// TTY width
    width: u16,
    /// TTY height
    height: u16,
    /// The target frame rate.
    frame_rate: u32,
    /// The time at which the previous frame was rendererd.
    last_frame_tick: std::time::Instant,
    /// When the effect started.
    started_at: std::time::Instant,
    /// Whether the welcoming burst has happened yet.
    is_initial_burst_done: bool,
    /// The time between recent frames, newest first.
    durations: VecDeque<f64>,
}

impl Stardust {
    /// Instantiate. Without a terminal to draw on there's nothing to do, so that's an error.
    pub async fn new(
        state: Arc<SharedState>,
        output: tokio::sync::mpsc::Sender<Surface>,
    ) -> Result<Self> {
        let tty_size = state.get_tty_size().await;
        if tty_size.width == 0 || tty_size.height == 0 {
            color_eyre::eyre::bail!(
                "Terminal has no size ({}x{}), so there's nowhere to draw particles",
                tty_size.width,
                tty_size.height
            );
        }

        let framebuffer = Framebuffer::for_terminal(tty_size.width, tty_size.height)?;
        let config = state.config.read().await.clone();
        let keybindings = state.keybindings.read().await.clone();
        let simulation = Simulation::new(
            framebuffer.width(),
            framebuffer.height(),
            config.stardust.clone(),
        );
        tracing::debug!(
            "Simulation initialised at {}x{} pixels",
            simulation.width,
            simulation.height
        );

        Ok(Self {
            state,
            output,
            simulation,
            framebuffer,
            interaction: Interaction::default(),
            pointer: PointerTracker::default(),
            panel: Panel::new(config.show_panel),
            keybindings,
            width: tty_size.width,
            height: tty_size.height,
            frame_rate: config.frame_rate,
            last_frame_tick: std::time::Instant::now(),
            started_at: std::time::Instant::now(),
            is_initial_burst_done: false,
            durations: VecDeque::default(),
        })
    }

    /// Our main entrypoint.
    pub async fn start(
        state: Arc<SharedState>,
        output: tokio::sync::mpsc::Sender<Surface>,
    ) -> Result<()> {
        let protocol_tx = state.protocol_tx.clone();
        let result = Self::run(state, output).await;
        if result.is_err() {
            crate::run::broadcast_protocol_end(&protocol_tx);
        }
        result
    }

    /// The frame loop, alternating between drawing frames and handling messages.
    async fn run(state: Arc<SharedState>, output: tokio::sync::mpsc::Sender<Surface>) -> Result<()> {
        let mut protocol = state.protocol_tx.subscribe();
        let mut stardust = Self::new(state, output).await?;

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        loop {
            tokio::select! {
                () = stardust.sleep_until_next_frame_tick() => {
                    if stardust.render().await? == Outcome::Quit {
                        break;
                    }
                },
                Ok(message) = protocol.recv() => {
                    if stardust.handle_protocol_message(message).await? == Outcome::Quit {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Leaving the particle loop");
        Ok(())
    }

    /// Sleep until the next frame render is due.
    pub async fn sleep_until_next_frame_tick(&mut self) {
        let frame_time = std::time::Duration::from_secs(1) / self.frame_rate.max(1);
        if let Some(wait) = frame_time.checked_sub(self.last_frame_tick.elapsed()) {
            tokio::time::sleep(wait).await;
        }

        self.durations
            .push_front(self.last_frame_tick.elapsed().as_secs_f64());
        if self.durations.len() > FPS_SAMPLES {
            self.durations.pop_back();
        }
        self.last_frame_tick = std::time::Instant::now();
    }

    /// Is there a terminal to draw on?
    const fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// The average frames per second over recent frames.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "There are only ever a handful of samples"
    )]
    fn fps(&self) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        let average = self.durations.iter().sum::<f64>() / self.durations.len() as f64;
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }

    /// Handle messages from the global Stardust protocol.
    pub async fn handle_protocol_message(&mut self, message: Protocol) -> Result<Outcome> {
        tracing::trace!("Stardust received protocol message: {message:?}");

        match message {
            Protocol::End => return Ok(Outcome::Quit),
            Protocol::Resize { width, height } => self.resize(width, height)?,
            Protocol::Input(input) => return Ok(self.handle_input(&input.event)),
            Protocol::Config(config) => {
                self.simulation.apply_settings(config.stardust);
                self.frame_rate = config.frame_rate;
                self.panel.is_visible = config.show_panel;
                self.keybindings = self.state.keybindings.read().await.clone();
            }
        }

        Ok(Outcome::Continue)
    }

    /// Handle keyboard and mouse input from the user.
    pub fn handle_input(&mut self, event: &termwiz::input::InputEvent) -> Outcome {
        #[expect(
            clippy::wildcard_enum_match_arm,
            reason = "Pastes and wake ups don't affect particles"
        )]
        match event {
            termwiz::input::InputEvent::Key(key) => return self.handle_key(key),
            termwiz::input::InputEvent::Mouse(mouse) => {
                let events = self.pointer.translate(mouse, self.width, self.height);
                for pointer_event in events {
                    self.interaction.handle(pointer_event, &mut self.simulation);
                }
            }
            _ => (),
        }

        Outcome::Continue
    }

    /// Run the action bound to a key, if any. `CTRL-c` always quits, so that there's always a way
    /// out of the raw-mode terminal.
    fn handle_key(&mut self, key: &termwiz::input::KeyEvent) -> Outcome {
        let is_ctrl_c = key.modifiers.contains(termwiz::input::Modifiers::CTRL)
            && matches!(key.key, termwiz::input::KeyCode::Char('c'));
        if is_ctrl_c {
            return Outcome::Quit;
        }

        match crate::config::input::find_action(&self.keybindings, key) {
            Some(action) => self.panel.apply(action, &mut self.simulation),
            None => Outcome::Continue,
        }
    }

    /// The user's terminal changed size. Terminals don't report the pointer leaving, and its old
    /// position may no longer be meaningful, so it's treated as having left.
    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        tracing::debug!("Resizing simulation to {width}x{height} cells");
        self.width = width;
        self.height = height;
        self.pointer.reset();
        self.interaction
            .handle(super::interaction::PointerEvent::Leave, &mut self.simulation);

        if !self.is_ready() {
            tracing::warn!("Terminal has no size, pausing particles");
            return Ok(());
        }

        self.framebuffer = Framebuffer::for_terminal(width, height)?;
        self.simulation
            .resize(self.framebuffer.width(), self.framebuffer.height());
        Ok(())
    }

    /// One frame of the effect
    pub async fn render(&mut self) -> Result<Outcome> {
        if !self.is_ready() {
            return Ok(Outcome::Continue);
        }

        let elapsed = self.started_at.elapsed();
        if !self.is_initial_burst_done && elapsed >= INITIAL_BURST_DELAY {
            self.simulation.centre_burst(Burst::INITIAL);
            self.is_initial_burst_done = true;
        }

        self.simulation
            .tick(&mut self.framebuffer, elapsed.as_secs_f32());

        let width = usize::from(self.width);
        let height = usize::from(self.height);
        let mut surface = Surface::from_framebuffer(&self.framebuffer, width, height);

        let lines = Panel::lines(&self.simulation, self.fps(), &self.keybindings);
        let regions = self.panel.region(&lines, width, height).into_iter().collect();
        self.interaction.set_ui_regions(regions);
        self.panel.draw(&lines, &mut surface);

        if self.output.send(surface).await.is_err() {
            tracing::debug!("Renderer has gone away, so there's nowhere to send frames");
            return Ok(Outcome::Quit);
        }

        Ok(Outcome::Continue)
    }
}
