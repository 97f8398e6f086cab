use log::trace;
use shared::{encode, frame, ParticipantState, TransportError};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Sends the local participant's state, one line per tick
///
/// There is no acknowledgement or resend, so a failed write is returned to
/// the caller and ends the session.
pub struct Publisher<W> {
    writer: W,
    sent: u64,
}

impl<W> Publisher<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    pub async fn publish(&mut self, state: &ParticipantState) -> Result<(), TransportError> {
        let line = frame(&encode(state));
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(TransportError::Write)?;
        self.sent += 1;
        trace!("Published update {}: {}", self.sent, line.trim_end());
        Ok(())
    }

    /// Number of updates written so far
    pub fn sent(&self) -> u64 {
        self.sent
    }
}
