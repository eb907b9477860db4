//! Tracing writer that routes log lines through the output shim.
//!
//! [`ShimMakeWriter`] hands each event a buffer; on [`Drop`] the whole
//! line is written to the shimmed stderr under one lock, so log lines never
//! interleave with script output mid-line and unencodable characters are
//! substituted like everything else the process prints.

use lantern_runtime::SharedStream;
use std::io::{self, Write};

/// [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) for the stderr layer.
#[derive(Clone, Debug)]
pub struct ShimMakeWriter {
    stream: SharedStream,
}

impl ShimMakeWriter {
    pub fn new(stream: &SharedStream) -> Self {
        Self {
            stream: stream.clone(),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for ShimMakeWriter {
    type Writer = ShimWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ShimWriter {
            stream: self.stream.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer.
///
/// Buffers bytes from the tracing formatter. On [`Drop`], writes the buffer
/// through the shim and flushes.
pub struct ShimWriter {
    stream: SharedStream,
    buf: Vec<u8>,
}

impl Write for ShimWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ShimWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let _ = self.stream.write_bytes(&self.buf);
        let _ = self.stream.flush();
    }
}
