//! Fixed-capacity payload buffer shared by all encoders.

use super::{ContentFormat, MAX_PAYLOAD_LEN};
use std::fmt;
use std::io;

/// `io::Write` sink over a fixed array that refuses to grow.
///
/// A write that does not fit is rejected whole and latches
/// [`overflowed`](Self::overflowed), so callers can tell buffer exhaustion
/// apart from other serializer failures.
pub struct PayloadWriter {
    buf: [u8; MAX_PAYLOAD_LEN],
    len: usize,
    overflowed: bool,
}

impl PayloadWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_PAYLOAD_LEN],
            len: 0,
            overflowed: false,
        }
    }

    /// True once any write has been rejected for lack of space.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Seal the buffer as a payload of the given format.
    pub fn finish(self, format: ContentFormat) -> Encoded {
        Encoded {
            buf: self.buf,
            len: self.len,
            format,
        }
    }
}

impl Default for PayloadWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for PayloadWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let remaining = MAX_PAYLOAD_LEN - self.len;
        if data.len() > remaining {
            self.overflowed = true;
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "payload buffer full",
            ));
        }
        self.buf[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An encoded payload together with the format it was encoded in.
#[derive(Clone)]
pub struct Encoded {
    buf: [u8; MAX_PAYLOAD_LEN],
    len: usize,
    format: ContentFormat,
}

impl Encoded {
    /// The payload bytes (exact length, no terminator).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for an empty payload.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Format the payload was encoded in; declared in the response.
    pub fn format(&self) -> ContentFormat {
        self.format
    }
}

impl PartialEq for Encoded {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Encoded {}

impl fmt::Debug for Encoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoded")
            .field("format", &self.format)
            .field("len", &self.len)
            .field("bytes", &self.as_bytes())
            .finish()
    }
}
