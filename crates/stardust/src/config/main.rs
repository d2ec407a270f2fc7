//! Stardust's config file: where it lives, how it's parsed, and how edits to it reach the running
//! effect.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use color_eyre::eyre::{ContextCompat as _, Result};
use notify_debouncer_full::notify;

use super::input::{KeybindingsAsEvents, KeybindingsRaw};
use crate::shared_state::SharedState;

/// The shipped config. It's what users start from, so it doubles as documentation.
static DEFAULT_CONFIG: &str = include_str!("../../default_config.toml");

/// How long the watcher waits for a burst of file system events to settle.
const WATCH_DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(100);

/// Log levels, as understood by `tracing`.
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Everything a user can put in `stardust.toml`. Missing fields take their defaults.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// The most verbose level that gets logged
    pub log_level: LogLevel,
    /// Where the log file goes
    pub log_path: PathBuf,
    /// Frames per second to aim for
    pub frame_rate: u32,
    /// Whether to show the settings panel in the top-right of the terminal.
    pub show_panel: bool,
    /// The particle effect itself
    pub stardust: crate::particles::config::Settings,
    /// Key presses for the panel's actions
    pub keybindings: KeybindingsRaw,
}

impl Default for Config {
    fn default() -> Self {
        let state_directory = dirs::state_dir().unwrap_or_else(|| PathBuf::from("./"));

        Self {
            log_level: LogLevel::Off,
            log_path: state_directory.join("stardust").join("stardust.log"),
            frame_rate: 60,
            show_panel: true,
            stardust: crate::particles::config::Settings::default(),
            keybindings: KeybindingsRaw::new(),
        }
    }
}

impl Config {
    /// The directory holding the config, as decided at startup.
    pub async fn directory(state: &Arc<SharedState>) -> PathBuf {
        state.config_path.read().await.clone()
    }

    /// The platform's usual place for config, eg `~/.config/stardust` on Linux.
    pub fn default_directory() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No standard config directory on this system")?;
        Ok(base.join("stardust"))
    }

    /// Use the given directory, or the platform default, for config. It's created if it doesn't
    /// exist yet.
    pub async fn setup_directory(custom: Option<PathBuf>, state: &Arc<SharedState>) -> Result<()> {
        let directory = match custom {
            Some(directory) => directory,
            None => Self::default_directory()?,
        };

        std::fs::create_dir_all(&directory)?;
        *state.config_path.write().await = directory;
        Ok(())
    }

    /// Full path to the main config file.
    pub async fn main_config_path(state: &Arc<SharedState>) -> PathBuf {
        let file_name = state.main_config_file.read().await.clone();
        Self::directory(state).await.join(file_name)
    }

    /// Only the default config file is created automatically. A custom one that's missing is
    /// more likely a typo on the command line.
    fn write_default_config_if_missing(path: &Path) -> Result<()> {
        let file_name = path.file_name().context("Config path has no file name")?;
        if file_name != crate::cli_args::DEFAULT_CONFIG_FILE_NAME || path.exists() {
            return Ok(());
        }

        tracing::info!("First run, writing default config to {path:?}");
        std::fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    /// Read and parse the main config, also refreshing the keybindings in the shared state.
    pub async fn load(state: &Arc<SharedState>) -> Result<Self> {
        let path = Self::main_config_path(state).await;
        Self::write_default_config_if_missing(&path)?;

        tracing::info!("Loading config from {path:?}");
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) => {
                tracing::error!("Reading config: {error:?}");
                color_eyre::eyre::bail!("Couldn't load config at {path:?}: {error}");
            }
        };
        tracing::trace!("Config contents:\n{contents}");

        let mut config = toml::from_str::<Self>(&contents)?;
        config.stardust = config.stardust.clamped();
        *state.keybindings.write().await = Self::keybindings_as_events(&config)?;
        Ok(config)
    }

    /// Parse the shipped config.
    fn parse_default_config() -> Result<Self> {
        Ok(toml::from_str::<Self>(DEFAULT_CONFIG)?)
    }

    /// Load the config and make it the current one.
    pub async fn load_config_into_shared_state(state: &Arc<SharedState>) -> Result<Self> {
        let config = Self::load(state).await?;
        state.config.write().await.clone_from(&config);
        Ok(config)
    }

    /// Every action gets the shipped key unless the user's config binds it to something else. A
    /// shipped binding is dropped when the user has given its key to a different action.
    fn keybindings_as_events(user_config: &Self) -> Result<KeybindingsAsEvents> {
        let mut keybindings = Self::parse_keybindings(Self::parse_default_config()?.keybindings)?;
        let users = Self::parse_keybindings(user_config.keybindings.clone())?;

        keybindings.retain(|action, key_event| {
            let is_taken =
                !users.contains_key(action) && users.values().any(|users_key| users_key == key_event);
            if is_taken {
                tracing::warn!(
                    "{key_event:?} is taken by another action, so {action:?} is unbound"
                );
            }
            !is_taken
        });
        keybindings.extend(users);

        Ok(keybindings)
    }

    /// Turn keybindings from the config file into the key events terminals send.
    fn parse_keybindings(raw: KeybindingsRaw) -> Result<KeybindingsAsEvents> {
        raw.into_iter()
            .map(|(action, binding)| -> Result<_> {
                tracing::trace!("Parsing keybinding for {action:?}: {binding:?}");
                let key_event: termwiz::input::KeyEvent = binding.try_into()?;
                Ok((action, key_event))
            })
            .collect()
    }

    /// Start a task that reloads the config whenever the main config file is edited, and
    /// broadcasts the result to the rest of the app.
    pub fn watch(state: Arc<SharedState>) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let directory = Self::directory(&state).await;
            tracing::debug!("Watching {directory:?} for config changes");

            let (events_tx, mut events_rx) = tokio::sync::mpsc::channel(1);
            let mut debouncer = notify_debouncer_full::new_debouncer(
                WATCH_DEBOUNCE,
                None,
                move |result: notify_debouncer_full::DebounceEventResult| {
                    let events = match result {
                        Ok(events) => events,
                        Err(errors) => {
                            tracing::error!("Config watcher: {errors:?}");
                            return;
                        }
                    };
                    for event in events {
                        if let Err(error) = events_tx.blocking_send(event) {
                            tracing::error!("Forwarding config watcher event: {error:?}");
                        }
                    }
                },
            )?;
            debouncer.watch(&directory, notify::RecursiveMode::NonRecursive)?;

            let mut protocol_rx = state.protocol_tx.subscribe();
            #[expect(
                clippy::integer_division_remainder_used,
                reason = "This is caused by the `tokio::select!`"
            )]
            loop {
                tokio::select! {
                    Some(event) = events_rx.recv() => {
                        let path = Self::main_config_path(&state).await;
                        if Self::is_edit_of(&event, &path) {
                            Self::reload(&state).await;
                        }
                    },
                    Ok(message) = protocol_rx.recv() => {
                        if matches!(message, crate::run::Protocol::End) {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Config watcher finished");
            Ok(())
        })
    }

    /// Whether a file system event is a change to the contents of the given file. Editors
    /// produce all sorts of other events, like touching swap files, which we don't care about.
    fn is_edit_of(event: &notify::Event, path: &Path) -> bool {
        let notify::EventKind::Modify(notify::event::ModifyKind::Data(_)) = event.kind else {
            return false;
        };
        let Some(file_name) = path.file_name() else {
            return false;
        };
        event.paths.iter().any(|changed| changed.ends_with(file_name))
    }

    /// Reload the config after an edit. A broken edit is logged and the previous config stays
    /// in use, so users can fix their typos without the effect stopping.
    async fn reload(state: &Arc<SharedState>) {
        tracing::debug!("Config file edited, reloading");
        match Self::load_config_into_shared_state(state).await {
            Ok(config) => {
                let result = state.protocol_tx.send(crate::run::Protocol::Config(config));
                if let Err(error) = result {
                    tracing::error!("Broadcasting reloaded config: {error:?}");
                }
            }
            Err(error) => tracing::error!("Reloading config: {}", error.root_cause()),
        }
    }
}
