//! The `stardust` binary. Everything interesting lives in the library.

use std::sync::Arc;

use color_eyre::eyre::Result;
use stardust::shared_state::SharedState;

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "Once the terminal is handed back, this is the only way to talk to the user"
)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (protocol_tx, _) = tokio::sync::broadcast::channel(1024);
    let state = SharedState::init_with_users_tty_size(protocol_tx).await?;
    let result = stardust::run::run(&Arc::clone(&state)).await;

    let log_path = state.config.read().await.log_path.clone();
    let is_logging = *state.is_logging.read().await;

    if let Err(error) = result {
        tracing::error!("{error:?}");
        eprintln!("Error: {error}");
        if is_logging {
            eprintln!("More details in {}", log_path.display());
        }
    } else if is_logging {
        println!("Logs saved to {}", log_path.display());
    }

    Ok(())
}
