//! Configuration resolver trait.
//!
//! # Architecture
//!
//! ```text
//! argv ──► ConfigResolver.resolve() ──► ExecutionConfig
//!              │
//!              └── ConfigLoader.load() (files + env)
//! ```
//!
//! The controller calls the resolver exactly once, after the
//! `process-starting` hook has fired.

use super::{ConfigError, ExecutionConfig};

/// Produces the final configuration for one run.
pub trait ConfigResolver {
    /// Resolves argument, file and environment layers into an
    /// [`ExecutionConfig`].
    fn resolve(&self) -> Result<ExecutionConfig, ConfigError>;
}

/// Resolver returning a fixed configuration.
///
/// Useful for embedding and for tests.
#[derive(Debug, Clone)]
pub struct StaticResolver(pub ExecutionConfig);

impl ConfigResolver for StaticResolver {
    fn resolve(&self) -> Result<ExecutionConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

impl<F> ConfigResolver for F
where
    F: Fn() -> Result<ExecutionConfig, ConfigError>,
{
    fn resolve(&self) -> Result<ExecutionConfig, ConfigError> {
        self()
    }
}
