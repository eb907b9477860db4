//! Engine bridge for the lantern script host.
//!
//! One [`EngineSession`] per process owns the Lua state, the bundled Brew
//! compiler and the `converter` bridge object. [`ConversionService`] hands
//! out that session.
//!
//! # Example
//!
//! ```
//! use lantern_lua::{Conversion, ConversionService};
//!
//! let service = ConversionService::default();
//! let session = service.instance().expect("engine");
//! let result = session.convert("greeting = \"hi\"\nprint greeting\n").expect("convert");
//! assert!(matches!(result, Conversion::Compiled(_)));
//! ```
//!
//! # Modules
//!
//! - [`session`]: `EngineSession`, `ConversionService`, `Conversion`
//! - [`bootstrap`]: bundled compiler resource
//! - [`host`]: the `lantern` table exposed to scripts
//! - [`event_loop`]: timer queue driven on tokio
//! - [`runner`]: loading and running the main script

pub mod bootstrap;
pub mod error;
pub mod event_loop;
pub mod host;
pub mod runner;
pub mod session;

pub use bootstrap::BootstrapSource;
pub use error::EngineError;
pub use event_loop::{EventLoop, SharedTimers, TimerQueue};
pub use host::{ExitSignal, HostContext};
pub use runner::{ScriptKind, ScriptRunner, ScriptStatus, FAILURE_EXIT_CODE};
pub use session::{Conversion, ConversionService, ConverterBridge, EngineSession};
