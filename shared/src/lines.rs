//! Length-bounded line reading for both ends of a connection

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest line either side accepts, terminator included
///
/// Valid records are a few dozen bytes; the cap leaves room for long
/// coordinate literals and batched relay lines.
pub const MAX_LINE_LEN: usize = 1024;

/// Outcome of one [`read_line_bounded`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A complete line, terminator included, is in the buffer
    Line,
    /// A line longer than the cap was read and thrown away through its terminator
    Overlong,
    /// The stream ended; any unterminated tail was discarded
    Eof,
}

/// Reads one newline-terminated line into `buffer`, holding at most `max_len`
/// bytes of it in memory
///
/// An overlong line is consumed in `max_len` chunks and discarded, so a peer
/// that never sends a terminator costs a bounded amount of memory.
pub async fn read_line_bounded<R>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    max_len: usize,
) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let max_len = max_len.max(1);
    let limit = max_len as u64;

    buffer.clear();
    let read = (&mut *reader).take(limit).read_until(b'\n', buffer).await?;
    if buffer.last() == Some(&b'\n') {
        return Ok(LineRead::Line);
    }
    if read < max_len {
        buffer.clear();
        return Ok(LineRead::Eof);
    }

    loop {
        buffer.clear();
        let read = (&mut *reader).take(limit).read_until(b'\n', buffer).await?;
        let terminated = buffer.last() == Some(&b'\n');
        buffer.clear();
        if terminated {
            return Ok(LineRead::Overlong);
        }
        if read < max_len {
            return Ok(LineRead::Eof);
        }
    }
}
