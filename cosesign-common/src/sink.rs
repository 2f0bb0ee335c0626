// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Output sink backing the two-pass sign engine.
//!
//! The engine runs the same emission code twice: once with a counting sink to
//! learn the message size, then with a fixed caller-supplied buffer. Signers
//! cooperate by emitting a placeholder of the exact signature size during the
//! counting pass, so the two passes always agree on the byte count.

/// Error returned when a fixed output buffer fills up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EndOfBuffer;

/// A `minicbor` write sink that either counts bytes or fills a fixed buffer.
#[derive(Debug)]
pub struct MessageSink<'a> {
    buffer: Option<&'a mut [u8]>,
    written: usize,
}

impl MessageSink<'static> {
    /// A sink that counts bytes without storing them (size-calculation pass).
    pub fn size_only() -> Self {
        MessageSink {
            buffer: None,
            written: 0,
        }
    }
}

impl<'a> MessageSink<'a> {
    /// A sink writing into `buffer`; overflowing it is [`EndOfBuffer`].
    pub fn new(buffer: &'a mut [u8]) -> Self {
        MessageSink {
            buffer: Some(buffer),
            written: 0,
        }
    }

    /// Bytes written (or counted) so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    /// True when this sink only counts.
    pub fn is_size_only(&self) -> bool {
        self.buffer.is_none()
    }
}

impl minicbor::encode::Write for MessageSink<'_> {
    type Error = EndOfBuffer;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), EndOfBuffer> {
        if let Some(out) = self.buffer.as_deref_mut() {
            let end = self.written.checked_add(buf.len()).ok_or(EndOfBuffer)?;
            if end > out.len() {
                return Err(EndOfBuffer);
            }
            out[self.written..end].copy_from_slice(buf);
        }
        self.written += buf.len();
        Ok(())
    }
}
