use smsforward_core::{OutgoingMessage, SmsTransport, TransportError};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Writes each outgoing message as one JSON line.
pub struct OutboxTransport<W> {
    writer: Mutex<W>,
}

impl OutboxTransport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> OutboxTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> SmsTransport for OutboxTransport<W> {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let line =
            serde_json::to_string(message).map_err(|err| TransportError::Encode(err.to_string()))?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
