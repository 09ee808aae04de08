//! In-memory log capture backing the `/logs` command
//!
//! `LogBuffer` is a `tracing_subscriber` writer: add a `fmt` layer writing into
//! it and every formatted event is appended to a bounded text buffer.

use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Bounded, shareable text buffer
#[derive(Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<String>>,
    capacity: usize,
}

impl LogBuffer {
    /// Buffer holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(String::new())),
            capacity,
        }
    }

    /// Append text, dropping whole lines from the front when over capacity
    pub fn push(&self, text: &str) {
        let mut buf = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        buf.push_str(text);

        if buf.len() > self.capacity {
            let excess = buf.len() - self.capacity;
            // `excess` may fall inside a multi-byte char, so search bytes; a
            // position right after '\n' is always a char boundary
            let cut = match buf.as_bytes()[excess..].iter().position(|&b| b == b'\n') {
                Some(nl) => excess + nl + 1,
                None => buf.len(),
            };
            buf.drain(..cut);
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> String {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(crate::constants::LOG_BUFFER_CAPACITY)
    }
}

/// Writer handed out per log event
pub struct LogBufferWriter {
    buffer: LogBuffer,
}

impl io::Write for LogBufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogBufferWriter {
            buffer: self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_push_and_snapshot() {
        let buffer = LogBuffer::new(1024);
        buffer.push("first\n");
        buffer.push("second\n");
        assert_eq!(buffer.snapshot(), "first\nsecond\n");
    }

    #[test]
    fn test_capacity_drops_whole_lines() {
        let buffer = LogBuffer::new(12);
        buffer.push("aaaa\n");
        buffer.push("bbbb\n");
        buffer.push("cccc\n");
        assert_eq!(buffer.snapshot(), "bbbb\ncccc\n");
    }

    #[test]
    fn test_capacity_with_multibyte_text() {
        let buffer = LogBuffer::new(8);
        buffer.push("💥💥\n");
        buffer.push("ok\n");
        assert_eq!(buffer.snapshot(), "ok\n");
    }

    #[test]
    fn test_writer_appends() {
        let buffer = LogBuffer::new(1024);
        let mut writer = buffer.make_writer();
        writer.write_all(b"INFO started\n").unwrap();
        assert_eq!(buffer.snapshot(), "INFO started\n");
    }
}
