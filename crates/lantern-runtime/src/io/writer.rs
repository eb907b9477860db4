//! Encoding-safe writer.
//!
//! [`SafeWriter`] decorates a byte sink. Text passes through the chosen
//! encoding; characters the encoding cannot represent are handled by the
//! [`EncodePolicy`] instead of producing an error. I/O errors from the
//! underlying sink still propagate.

use super::encoding::{EncodePolicy, EncodingChoice};
use std::io::{self, Write};

/// Pass-through decorator that never fails on unencodable characters.
#[derive(Debug)]
pub struct SafeWriter<W> {
    inner: W,
    choice: EncodingChoice,
    policy: EncodePolicy,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last `write`.
    pending: Vec<u8>,
}

impl<W: Write> SafeWriter<W> {
    /// Wraps `inner` with the given encoding and policy.
    pub fn new(inner: W, choice: EncodingChoice, policy: EncodePolicy) -> Self {
        Self {
            inner,
            choice,
            policy,
            pending: Vec::new(),
        }
    }

    /// Current encoding choice.
    pub fn choice(&self) -> EncodingChoice {
        self.choice
    }

    /// Current policy.
    pub fn policy(&self) -> EncodePolicy {
        self.policy
    }

    /// Replaces encoding and policy for subsequent writes.
    pub fn reconfigure(&mut self, choice: EncodingChoice, policy: EncodePolicy) {
        self.choice = choice;
        self.policy = policy;
    }

    /// Writes `text`, substituting characters the encoding cannot represent.
    pub fn write_text(&mut self, text: &str) -> io::Result<()> {
        let bytes = self.encode(text);
        self.inner.write_all(&bytes)
    }

    /// Consumes the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Borrows the sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        if self.policy == EncodePolicy::Utf8 {
            return text.as_bytes().to_vec();
        }

        let encoding = self.choice.encoding();
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            if encoding.encode_char(c, &mut out) {
                continue;
            }
            match self.policy {
                EncodePolicy::Escape => {
                    out.extend_from_slice(format!("\\u{{{:04x}}}", u32::from(c)).as_bytes());
                }
                EncodePolicy::Replace | EncodePolicy::Utf8 => out.push(b'?'),
            }
        }
        out
    }
}

impl<W: Write> Write for SafeWriter<W> {
    /// Accepts UTF-8 bytes. Incomplete trailing sequences are held until the
    /// next write; invalid sequences become U+FFFD before encoding.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(buf);

        let split = incomplete_tail_start(&data);
        let tail = data.split_off(split);
        let text = String::from_utf8_lossy(&data).into_owned();
        self.write_text(&text)?;
        self.pending = tail;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let text = String::from_utf8_lossy(&rest).into_owned();
            self.write_text(&text)?;
        }
        self.inner.flush()
    }
}

/// Index where a trailing, possibly incomplete UTF-8 sequence begins.
fn incomplete_tail_start(data: &[u8]) -> usize {
    let len = data.len();
    // A UTF-8 sequence is at most 4 bytes; look back up to 3.
    for back in 1..=len.min(3) {
        let b = data[len - back];
        if b & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = if b & 0b1110_0000 == 0b1100_0000 {
            2
        } else if b & 0b1111_0000 == 0b1110_0000 {
            3
        } else if b & 0b1111_1000 == 0b1111_0000 {
            4
        } else {
            1
        };
        return if needed > back { len - back } else { len };
    }
    len
}
