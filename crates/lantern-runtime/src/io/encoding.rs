//! Output encoding resolution.
//!
//! [`EncodingChoice::resolve`] validates a requested encoding name against
//! the encodings the shim can emit. Resolution is pure and never fails:
//! an unknown request falls back to the provided default, and an unknown
//! default falls back to UTF-8.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encodings the output shim can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// UTF-8 (every `char` is representable).
    Utf8,
    /// 7-bit US-ASCII.
    Ascii,
    /// ISO-8859-1 (one byte per code point up to U+00FF).
    Latin1,
}

impl Encoding {
    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
        }
    }

    /// Looks up an encoding by name or alias (case-insensitive; `_` and `-`
    /// are interchangeable).
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" | "u8" => Some(Self::Utf8),
            "ascii" | "us-ascii" | "646" | "ansi-x3.4-1968" => Some(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Some(Self::Latin1),
            _ => None,
        }
    }

    /// Encodes a single `char`, or returns `None` if it is not representable.
    pub(crate) fn encode_char(&self, c: char, out: &mut Vec<u8>) -> bool {
        match self {
            Self::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                true
            }
            Self::Ascii if c.is_ascii() => {
                out.push(c as u8);
                true
            }
            Self::Latin1 if u32::from(c) <= 0xFF => {
                out.push(u32::from(c) as u8);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated encoding, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingChoice {
    encoding: Encoding,
    fell_back: bool,
}

impl EncodingChoice {
    /// Resolves `requested`, falling back to `default`.
    ///
    /// ```
    /// use lantern_runtime::io::EncodingChoice;
    ///
    /// assert_eq!(EncodingChoice::resolve("utf-9-bogus", "utf-8").name(), "utf-8");
    /// assert_eq!(EncodingChoice::resolve("utf-8", "ascii").name(), "utf-8");
    /// ```
    #[must_use]
    pub fn resolve(requested: &str, default: &str) -> Self {
        if let Some(encoding) = Encoding::lookup(requested) {
            return Self {
                encoding,
                fell_back: false,
            };
        }
        Self {
            encoding: Encoding::lookup(default).unwrap_or(Encoding::Utf8),
            fell_back: true,
        }
    }

    /// Canonical name of the chosen encoding.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// The chosen encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// `true` if the requested name was not recognised.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }
}

impl Default for EncodingChoice {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            fell_back: false,
        }
    }
}

/// What the shim does with a character the encoding cannot represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodePolicy {
    /// Substitute `?`.
    #[default]
    Replace,
    /// Substitute a `\u{XXXX}` escape.
    Escape,
    /// Ignore the chosen encoding and emit UTF-8.
    Utf8,
}

impl EncodePolicy {
    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Escape => "escape",
            Self::Utf8 => "utf-8",
        }
    }
}

impl FromStr for EncodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "escape" => Ok(Self::Escape),
            "utf-8" | "utf8" => Ok(Self::Utf8),
            other => Err(format!(
                "unknown output policy '{other}' (expected replace, escape or utf-8)"
            )),
        }
    }
}

impl fmt::Display for EncodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
