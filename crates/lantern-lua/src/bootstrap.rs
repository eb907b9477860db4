//! Bundled compiler bootstrap.
//!
//! The Brew compiler is embedded at compile time using `include_str!`
//! and resolved by logical name, so a distributed binary needs no
//! external files. A file override is available for development.

use crate::error::EngineError;
use std::borrow::Cow;
use std::path::PathBuf;

/// Brew compiler source.
pub const BREW: &str = include_str!("../bootstrap/brew.lua");

/// Logical name of the default bootstrap.
pub const DEFAULT_BOOTSTRAP: &str = "brew";

/// Gets a bundled bootstrap by logical name.
#[must_use]
pub fn get(name: &str) -> Option<&'static str> {
    match name {
        "brew" => Some(BREW),
        _ => None,
    }
}

/// Where the compiler bootstrap comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapSource {
    /// Bundled resource, by logical name.
    Embedded(String),
    /// Lua file on disk.
    File(PathBuf),
}

impl Default for BootstrapSource {
    fn default() -> Self {
        Self::Embedded(DEFAULT_BOOTSTRAP.to_string())
    }
}

impl BootstrapSource {
    /// Uses `path` when given, otherwise the bundled default.
    #[must_use]
    pub fn from_override(path: Option<PathBuf>) -> Self {
        path.map_or_else(Self::default, Self::File)
    }

    /// Chunk name used when evaluating the bootstrap.
    #[must_use]
    pub fn chunk_name(&self) -> String {
        match self {
            Self::Embedded(name) => format!("={name}"),
            Self::File(path) => format!("@{}", path.display()),
        }
    }

    /// Loads the bootstrap source text.
    ///
    /// # Errors
    ///
    /// [`EngineError::BootstrapMissing`] for an unknown logical name,
    /// [`EngineError::BootstrapRead`] for an unreadable file.
    pub fn load(&self) -> Result<Cow<'static, str>, EngineError> {
        match self {
            Self::Embedded(name) => get(name)
                .map(Cow::Borrowed)
                .ok_or_else(|| EngineError::BootstrapMissing(name.clone())),
            Self::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| EngineError::BootstrapRead {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brew_embedded() {
        assert!(BREW.contains("BREW_LOADS"));
        assert!(BREW.contains("function M.compile"));
    }

    #[test]
    fn get_unknown_returns_none() {
        assert!(get("coffee").is_none());
    }

    #[test]
    fn default_is_embedded_brew() {
        let source = BootstrapSource::default();
        assert_eq!(source, BootstrapSource::Embedded("brew".into()));
        assert_eq!(source.chunk_name(), "=brew");
        assert!(source.load().is_ok());
    }

    #[test]
    fn missing_embedded_name() {
        let err = BootstrapSource::Embedded("nope".into()).load().unwrap_err();
        assert!(matches!(err, EngineError::BootstrapMissing(name) if name == "nope"));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = BootstrapSource::from_override(Some(dir.path().join("absent.lua")));
        assert!(matches!(source.load(), Err(EngineError::BootstrapRead { .. })));
    }
}
