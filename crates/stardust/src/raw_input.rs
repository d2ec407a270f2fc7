//! Keyboard and mouse input, straight from the user's terminal.

use std::io::Read;

use color_eyre::eyre::Result;

use crate::run::Protocol;

/// How many bytes are read from STDIN at a time.
const READ_BUFFER_SIZE: usize = 128;

/// A keyboard, mouse or other terminal event, decoded from STDIN.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ParsedInput {
    /// The decoded event
    pub event: termwiz::input::InputEvent,
}

impl ParsedInput {
    /// Instantiate
    #[must_use]
    pub const fn new(event: termwiz::input::InputEvent) -> Self {
        Self { event }
    }
}

/// Decodes terminal input and broadcasts it.
pub struct RawInput {
    /// Where decoded events are sent.
    protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    /// Termwiz's escape sequence decoder. It keeps partial sequences between reads.
    parser: termwiz::input::InputParser,
}

impl RawInput {
    /// Read STDIN on its own OS thread. Reading STDIN blocks, so it doesn't belong on the async
    /// runtime.
    #[must_use]
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        std::thread::spawn(move || -> Result<()> {
            let mut input = Self::new(protocol_tx.clone());
            let result = input.consume(std::io::stdin().lock());
            if result.is_err() {
                crate::run::broadcast_protocol_end(&protocol_tx);
            }
            result
        })
    }

    /// Instantiate
    fn new(protocol_tx: tokio::sync::broadcast::Sender<Protocol>) -> Self {
        Self {
            protocol_tx,
            parser: termwiz::input::InputParser::new(),
        }
    }

    /// Decode everything from a reader until it closes.
    fn consume(&mut self, mut reader: impl Read) -> Result<()> {
        tracing::debug!("Listening for terminal input");

        let mut buffer = [0; READ_BUFFER_SIZE];
        loop {
            let count = reader.read(&mut buffer)?;
            let Some(bytes) = buffer.get(..count) else {
                continue;
            };
            if bytes.is_empty() {
                tracing::debug!("Terminal input closed");
                return Ok(());
            }
            tracing::trace!("Terminal input bytes: {bytes:x?}");

            let protocol_tx = &self.protocol_tx;
            // Mouse reports arrive whole, so a lone escape isn't worth waiting on.
            self.parser.parse(
                bytes,
                |event| Self::broadcast(protocol_tx, event),
                false,
            );
        }
    }

    /// Send a decoded event to the rest of the app.
    fn broadcast(
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
        event: termwiz::input::InputEvent,
    ) {
        tracing::trace!("Terminal input event: {event:?}");
        let result = protocol_tx.send(Protocol::Input(ParsedInput::new(event)));
        if let Err(error) = result {
            tracing::error!("Broadcasting terminal input: {error:?}");
        }
    }
}
