//! Process output streams behind the encoding shim.

use super::encoding::{EncodePolicy, EncodingChoice};
use super::writer::SafeWriter;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Boxed byte sink.
pub type BoxedSink = Box<dyn Write + Send>;

/// A shared, encoding-safe stream.
///
/// Cloning shares the same underlying writer.
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<Mutex<SafeWriter<BoxedSink>>>,
}

impl SharedStream {
    /// Wraps `sink` with the given encoding and policy.
    pub fn new(sink: BoxedSink, choice: EncodingChoice, policy: EncodePolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SafeWriter::new(sink, choice, policy))),
        }
    }

    /// Writes text; unencodable characters are substituted.
    pub fn write_text(&self, text: &str) -> io::Result<()> {
        self.inner.lock().write_text(text)
    }

    /// Writes text followed by a newline and flushes.
    pub fn write_line(&self, text: &str) -> io::Result<()> {
        let mut w = self.inner.lock();
        w.write_text(text)?;
        w.write_text("\n")?;
        w.flush()
    }

    /// Writes raw UTF-8 bytes through the shim.
    pub fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.inner.lock().write_all(bytes)
    }

    /// Flushes the underlying sink.
    pub fn flush(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }

    /// Current encoding choice.
    pub fn choice(&self) -> EncodingChoice {
        self.inner.lock().choice()
    }

    /// Current policy.
    pub fn policy(&self) -> EncodePolicy {
        self.inner.lock().policy()
    }

    fn reconfigure(&self, choice: EncodingChoice, policy: EncodePolicy) {
        self.inner.lock().reconfigure(choice, policy);
    }
}

impl std::fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("encoding", &self.choice().name())
            .field("policy", &self.policy())
            .finish()
    }
}

/// The process's stdout and stderr, both wrapped by the shim.
///
/// Construct this before anything else writes to the standard streams.
#[derive(Debug, Clone)]
pub struct OutputStreams {
    stdout: SharedStream,
    stderr: SharedStream,
}

impl OutputStreams {
    /// Wraps the real process streams.
    #[must_use]
    pub fn install(choice: EncodingChoice, policy: EncodePolicy) -> Self {
        Self::from_sinks(Box::new(io::stdout()), Box::new(io::stderr()), choice, policy)
    }

    /// Wraps arbitrary sinks (tests, embedding).
    #[must_use]
    pub fn from_sinks(
        stdout: BoxedSink,
        stderr: BoxedSink,
        choice: EncodingChoice,
        policy: EncodePolicy,
    ) -> Self {
        Self {
            stdout: SharedStream::new(stdout, choice, policy),
            stderr: SharedStream::new(stderr, choice, policy),
        }
    }

    /// Standard output.
    pub fn stdout(&self) -> &SharedStream {
        &self.stdout
    }

    /// Standard error.
    pub fn stderr(&self) -> &SharedStream {
        &self.stderr
    }

    /// Applies a new encoding and policy to both streams.
    pub fn reconfigure(&self, choice: EncodingChoice, policy: EncodePolicy) {
        tracing::debug!(encoding = choice.name(), policy = %policy, "reconfiguring output streams");
        self.stdout.reconfigure(choice, policy);
        self.stderr.reconfigure(choice, policy);
    }

    /// Flushes both streams at teardown. Failures are logged, not returned.
    pub fn flush_all(&self) {
        for (name, stream) in [("stdout", &self.stdout), ("stderr", &self.stderr)] {
            if let Err(e) = stream.flush() {
                tracing::warn!(stream = name, error = %e, "failed to flush output");
            }
        }
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a boxed writer appending to this buffer.
    #[must_use]
    pub fn sink(&self) -> BoxedSink {
        Box::new(self.clone())
    }

    /// Captured bytes as (lossy) UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Captured raw bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputStreams {
    /// Streams writing into fresh capture buffers.
    ///
    /// Returns `(streams, stdout_buffer, stderr_buffer)`.
    #[must_use]
    pub fn captured(
        choice: EncodingChoice,
        policy: EncodePolicy,
    ) -> (Self, CaptureBuffer, CaptureBuffer) {
        let out = CaptureBuffer::new();
        let err = CaptureBuffer::new();
        let streams = Self::from_sinks(out.sink(), err.sink(), choice, policy);
        (streams, out, err)
    }
}
