//! Put finished frames on the user's terminal.
//!
//! The renderer owns the real terminal. While it runs, the terminal is in raw mode, with mouse
//! reporting on, on the alternate screen and without a visible cursor. All of that is undone
//! however the render loop ends.

use std::sync::Arc;

use color_eyre::eyre::Result;
use termwiz::surface::{Change, CursorVisibility};
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal};

use crate::run::Protocol;
use crate::shared_state::{SharedState, TTYSize};
use crate::surface::Surface;

/// Renders frames from the particle loop
pub struct Renderer {
    /// Shared app state
    state: Arc<SharedState>,
    /// The terminal size that frames are currently being made for
    size: TTYSize,
}

impl Renderer {
    /// Start rendering on its own task. Frames arrive on `surfaces_rx`, and rendering stops when
    /// `Protocol::End` is broadcast.
    #[must_use]
    pub fn start(
        state: Arc<SharedState>,
        surfaces_rx: tokio::sync::mpsc::Receiver<Surface>,
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let size = state.get_tty_size().await;
            let mut renderer = Self { state, size };
            let result = renderer.run(surfaces_rx, protocol_rx, &protocol_tx).await;
            if result.is_err() {
                crate::run::broadcast_protocol_end(&protocol_tx);
            }
            result
        })
    }

    /// A handle on the user's terminal.
    fn open_terminal() -> Result<impl Terminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// The size of the user's terminal right now.
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        Ok(Self::open_terminal()?.get_screen_size()?)
    }

    /// Take over the terminal, render until the end, then give the terminal back. The terminal is
    /// given back even when taking it over or rendering fails part way.
    async fn run(
        &mut self,
        mut surfaces_rx: tokio::sync::mpsc::Receiver<Surface>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        let mut terminal = BufferedTerminal::new(Self::open_terminal()?)?;

        let result = match Self::take_over(&mut terminal) {
            Ok(()) => {
                self.render_loop(&mut surfaces_rx, &mut protocol_rx, protocol_tx, &mut terminal)
                    .await
            }
            Err(error) => Err(error),
        };
        let restored = Self::give_back(&mut terminal);

        first_error([result, restored])
    }

    /// Raw mode, the alternate screen and no cursor.
    fn take_over(terminal: &mut BufferedTerminal<impl Terminal>) -> Result<()> {
        tracing::debug!("Taking over the terminal");
        // Raw mode in termwiz includes mouse reporting.
        terminal.terminal().set_raw_mode()?;
        terminal.terminal().enter_alternate_screen()?;
        Self::show_cursor(terminal, false)?;
        Ok(())
    }

    /// Undo everything `take_over` does. Every step is tried, whether or not an earlier one
    /// failed, and the first failure is returned.
    fn give_back(terminal: &mut BufferedTerminal<impl Terminal>) -> Result<()> {
        tracing::debug!("Giving the terminal back");
        let cursor = Self::show_cursor(terminal, true);
        let screen = terminal
            .terminal()
            .exit_alternate_screen()
            .map_err(color_eyre::eyre::Report::from);
        let mode = terminal
            .terminal()
            .set_cooked_mode()
            .map_err(color_eyre::eyre::Report::from);

        first_error([cursor, screen, mode])
    }

    /// Draw frames as they arrive.
    async fn render_loop<T: Terminal + Send>(
        &mut self,
        surfaces_rx: &mut tokio::sync::mpsc::Receiver<Surface>,
        protocol_rx: &mut tokio::sync::broadcast::Receiver<Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
        terminal: &mut BufferedTerminal<T>,
    ) -> Result<()> {
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        loop {
            tokio::select! {
                Some(surface) = surfaces_rx.recv() => {
                    self.check_for_resize(terminal, protocol_tx).await?;
                    Self::draw(&surface, terminal)?;
                }
                Ok(message) = protocol_rx.recv() => {
                    if matches!(message, Protocol::End) {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Render loop finished");
        Ok(())
    }

    /// Terminals only tell us they've been resized when we ask. If it has been, everyone else
    /// needs to know.
    async fn check_for_resize<T: Terminal + Send>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        if !terminal.check_for_resize()? {
            return Ok(());
        }
        terminal.repaint()?;

        let (width, height) = terminal.dimensions();
        self.size = TTYSize {
            width: width.try_into()?,
            height: height.try_into()?,
        };
        tracing::debug!("Terminal resized to {:?}", self.size);
        self.state
            .set_tty_size(self.size.width, self.size.height)
            .await;
        protocol_tx.send(Protocol::Resize {
            width: self.size.width,
            height: self.size.height,
        })?;

        Ok(())
    }

    /// Show or hide the terminal's cursor.
    fn show_cursor(terminal: &mut BufferedTerminal<impl Terminal>, is_visible: bool) -> Result<()> {
        let visibility = if is_visible {
            CursorVisibility::Visible
        } else {
            CursorVisibility::Hidden
        };
        terminal.add_change(Change::CursorVisibility(visibility));
        terminal.flush()?;
        Ok(())
    }

    /// Send a frame to the terminal. Termwiz diffs it against the previous frame, so only
    /// changed cells are written. Frames made before a resize are skipped, the next one will fit.
    fn draw(surface: &Surface, terminal: &mut BufferedTerminal<impl Terminal>) -> Result<()> {
        if terminal.dimensions() != surface.surface.dimensions() {
            tracing::trace!("Skipping a frame made for a different terminal size");
            return Ok(());
        }

        terminal.draw_from_screen(&surface.surface, 0, 0);
        terminal.flush()?;
        Ok(())
    }
}

/// All the results are already in, so this only picks which one to report. Later failures are
/// logged, so they aren't lost.
fn first_error(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    let mut first = Ok(());
    for result in results {
        if let Err(error) = result {
            if first.is_ok() {
                first = Err(error);
            } else {
                tracing::error!("Also failed while giving the terminal back: {error:?}");
            }
        }
    }
    first
}
