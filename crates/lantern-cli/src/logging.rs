//! Tracing setup.
//!
//! The filter sits in a reload layer: the subscriber is installed before
//! configuration exists, then narrowed or widened once settings are known.
//!
//! Filter precedence: `--debug` > `--verbose` > `logging.level` in config >
//! `RUST_LOG` > `warn`.

use crate::tracing_writer::ShimMakeWriter;
use lantern_runtime::SharedStream;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

const DEFAULT_FILTER: &str = "warn";

/// Handle for adjusting the active filter.
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Installs the global subscriber writing to `stderr`.
///
/// # Errors
///
/// Returns error if a global subscriber is already set.
pub fn init(stderr: &SharedStream) -> anyhow::Result<LogControl> {
    let initial =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (filter, handle) = reload::Layer::new(initial);

    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(ShimMakeWriter::new(stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    Ok(LogControl { handle })
}

impl LogControl {
    /// Replaces the filter with `directive`. `None` keeps the current one.
    pub fn apply(&self, directive: Option<&str>) {
        let Some(directive) = directive else {
            return;
        };
        match EnvFilter::try_new(directive) {
            Ok(filter) => {
                if let Err(e) = self.handle.reload(filter) {
                    tracing::warn!(error = %e, "failed to reload log filter");
                }
                tracing::debug!(filter = directive, "log filter applied");
            }
            Err(e) => tracing::warn!(directive, error = %e, "ignoring invalid log filter"),
        }
    }
}
