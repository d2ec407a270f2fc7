//! Start every part of Stardust, wait for the particle loop to finish, then shut everything else
//! down.

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::cli_args::CliArgs;
use crate::config::main::{Config, LogLevel};
use crate::raw_input::RawInput;
use crate::renderer::Renderer;
use crate::shared_state::SharedState;

/// Setting this env var overrides all other logging config with arbitrary `tracing` filters.
const LOG_FILTERS_ENV: &str = "STARDUST_LOG";

/// How many finished frames can wait for the renderer before the particle loop has to wait too.
const FRAME_QUEUE_SIZE: usize = 8;

/// Messages broadcast between Stardust's tasks and threads.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Protocol {
    /// Everything should stop.
    End,
    /// The user's terminal changed size.
    Resize {
        /// Columns
        width: u16,
        /// Rows
        height: u16,
    },
    /// Keyboard or mouse input.
    Input(crate::raw_input::ParsedInput),
    /// The config file was edited and reloaded.
    Config(Config),
}

/// Run Stardust until the user quits.
pub async fn run(state: &Arc<SharedState>) -> Result<()> {
    let protocol_tx = state.protocol_tx.clone();
    setup(state).await?;
    log_panics();

    let (frames_tx, frames_rx) = tokio::sync::mpsc::channel(FRAME_QUEUE_SIZE);
    let renderer = Renderer::start(Arc::clone(state), frames_rx, protocol_tx.clone());
    let config_watcher = Config::watch(Arc::clone(state));
    let input = RawInput::start(protocol_tx.clone());
    let particles = tokio::spawn(crate::particles::main::Stardust::start(
        Arc::clone(state),
        frames_tx,
    ));

    let particles_result = particles.await;
    tracing::debug!("Particle loop finished, shutting down");
    broadcast_protocol_end(&protocol_tx);

    renderer.await??;
    config_watcher.await??;
    // The input thread spends its life blocked on reading STDIN, so it never sees `End`. It's
    // only worth joining if it has already stopped, because then it has an error to report.
    if input.is_finished() {
        input
            .join()
            .map_err(|error| color_eyre::eyre::eyre!("Input thread panicked: {error:?}"))??;
    }
    particles_result??;

    Ok(())
}

/// Panics would normally be printed to the terminal, where the renderer immediately paints over
/// them. So they go to the log instead.
fn log_panics() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| payload.downcast_ref::<&str>().copied())
            .unwrap_or("(panic with a non-string payload)");
        let location = info.location().map_or_else(
            || "unknown location".to_owned(),
            |location| format!("{}:{}:{}", location.file(), location.line(), location.column()),
        );
        tracing::error!("Panic at {location}: {message}");
    }));
}

/// Tell every task and thread to stop.
///
/// A failure here is logged rather than returned: the `End` message is what lets the other tasks
/// finish, so an error bubbled up from here might never be seen.
pub fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting `End`");
    if let Err(error) = protocol_tx.send(Protocol::End) {
        tracing::error!("Couldn't broadcast `End`: {error:?}");
    }
}

/// Everything that has to happen before the terminal is taken over.
async fn setup(state: &Arc<SharedState>) -> Result<()> {
    let cli_args = CliArgs::parse();
    state
        .main_config_file
        .write()
        .await
        .clone_from(&cli_args.main_config);

    if let Err(error) = Config::setup_directory(cli_args.config_dir.clone(), state).await {
        color_eyre::eyre::bail!("Couldn't set up the config directory: {error:?}");
    }
    if let Err(error) = Config::load_config_into_shared_state(state).await {
        let path = Config::main_config_path(state).await;
        color_eyre::eyre::bail!("Bad config file: {error:?}\n\nConfig path: {}", path.display());
    }

    setup_logging(&cli_args, state).await?;
    cli_args.override_settings(&mut state.config.write().await.stardust);

    // Particle colours need true colour, and termwiz checks this to decide what it can output.
    std::env::set_var("COLORTERM", "truecolor");

    tracing::info!("Starting Stardust");
    tracing::debug!("Config: {:?}", state.config.read().await);

    let size = Renderer::get_users_tty_size()?;
    state
        .set_tty_size(size.cols.try_into()?, size.rows.try_into()?)
        .await;

    Ok(())
}

/// Logs always go to a file, never the terminal, which is busy showing particles.
async fn setup_logging(cli_args: &CliArgs, state: &Arc<SharedState>) -> Result<()> {
    let custom_filters = std::env::var(LOG_FILTERS_ENV).is_ok();
    let (level, path) = {
        let config = state.config.read().await;
        (
            cli_args.log_level.clone().unwrap_or_else(|| config.log_level.clone()),
            cli_args.log_path.clone().unwrap_or_else(|| config.log_path.clone()),
        )
    };

    if level == LogLevel::Off && !custom_filters {
        return Ok(());
    }

    let directory = path.parent().context("Log path has no parent directory")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(&path)?;

    let filters = if custom_filters {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .with_env_var(LOG_FILTERS_ENV)
            .from_env_lossy()
    } else {
        let level = format!("{level:?}").to_lowercase();
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .parse_lossy("")
            .add_directive(format!("stardust={level}").parse()?)
            .add_directive(format!("tests={level}").parse()?)
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file)
        .with_filter(filters);
    tracing_subscriber::registry().with(file_layer).try_init()?;

    *state.is_logging.write().await = true;
    state.config.write().await.log_path = path;

    Ok(())
}
