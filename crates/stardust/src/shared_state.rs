//! State that more than one task needs to see. Every field sits behind its own lock, so that,
//! for example, reading the terminal size never waits on a config reload.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::sync::RwLock;

use crate::config::input::KeybindingsAsEvents;
use crate::config::main::Config;
use crate::run::Protocol;

/// The user's terminal size, in cells.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "A terminal only ever has a width and a height"
)]
pub struct TTYSize {
    /// Columns
    pub width: u16,
    /// Rows
    pub height: u16,
}

/// State shared between Stardust's tasks
#[non_exhaustive]
pub struct SharedState {
    /// Sender for the app-wide protocol channel. Tasks subscribe to it for their own receivers.
    pub protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    /// The config directory
    pub config_path: RwLock<PathBuf>,
    /// The main config file's name, relative to the config directory
    pub main_config_file: RwLock<PathBuf>,
    /// The config currently in use
    pub config: RwLock<Config>,
    /// Keybindings, already parsed into terminal key events
    pub keybindings: RwLock<KeybindingsAsEvents>,
    /// The user's terminal size
    pub tty_size: RwLock<TTYSize>,
    /// Whether a log file is being written
    pub is_logging: RwLock<bool>,
}

impl SharedState {
    /// Shared state for a terminal of the given size. Everything else starts at its default
    /// until the config is loaded.
    pub async fn init(
        width: u16,
        height: u16,
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<Arc<Self>> {
        let state = Self {
            protocol_tx,
            config_path: RwLock::default(),
            main_config_file: RwLock::new(crate::cli_args::DEFAULT_CONFIG_FILE_NAME.into()),
            config: RwLock::default(),
            keybindings: RwLock::default(),
            tty_size: RwLock::default(),
            is_logging: RwLock::new(false),
        };
        state.set_tty_size(width, height).await;
        Ok(Arc::new(state))
    }

    /// Shared state sized to whatever terminal Stardust was started in.
    pub async fn init_with_users_tty_size(
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<Arc<Self>> {
        let size = crate::renderer::Renderer::get_users_tty_size()?;
        Self::init(size.cols.try_into()?, size.rows.try_into()?, protocol_tx).await
    }

    /// The terminal size.
    pub async fn get_tty_size(&self) -> TTYSize {
        *self.tty_size.read().await
    }

    /// Record a new terminal size.
    pub async fn set_tty_size(&self, width: u16, height: u16) {
        *self.tty_size.write().await = TTYSize { width, height };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn starts_with_defaults_and_the_given_size() {
        let (protocol_tx, _) = tokio::sync::broadcast::channel(16);
        let state = SharedState::init(10, 5, protocol_tx).await.unwrap();

        assert_eq!(
            state.get_tty_size().await,
            TTYSize {
                width: 10,
                height: 5
            }
        );
        assert_eq!(
            *state.main_config_file.read().await,
            PathBuf::from("stardust.toml")
        );
        assert!(!*state.is_logging.read().await);
    }

    #[tokio::test]
    async fn tty_size_can_change() {
        let (protocol_tx, _) = tokio::sync::broadcast::channel(16);
        let state = SharedState::init(10, 5, protocol_tx).await.unwrap();

        state.set_tty_size(80, 24).await;
        assert_eq!(state.get_tty_size().await.width, 80);
        assert_eq!(state.get_tty_size().await.height, 24);
    }
}
