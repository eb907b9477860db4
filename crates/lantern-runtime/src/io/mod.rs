//! Output safety shim.
//!
//! Writing text to a stream must never fail because a character cannot be
//! represented in the stream's encoding.
//!
//! ```text
//! text ──► SafeWriter ──► EncodingChoice + EncodePolicy ──► bytes ──► sink
//! ```
//!
//! [`OutputStreams`] holds the shimmed stdout/stderr pair. It is created
//! first at process start; logging, hook actions and scripts all write
//! through it.

mod encoding;
mod streams;
mod writer;

pub use encoding::{EncodePolicy, Encoding, EncodingChoice};
pub use streams::{BoxedSink, CaptureBuffer, OutputStreams, SharedStream};
pub use writer::SafeWriter;
