//! Lantern CLI - run Lua and Brew scripts.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`LANTERN_*`)
//! 3. Explicit config file (`--config`)
//! 4. Project config (`.lantern/config.toml` in current directory)
//! 5. Global config (`~/.lantern/config.toml`)
//! 6. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `LANTERN_DEBUG`: Enable debug mode (`true`/`false`)
//! - `LANTERN_OUTPUT_ENCODING`: Output encoding name
//! - `LANTERN_OUTPUT_POLICY`: `replace`, `escape` or `utf-8`
//! - `LANTERN_BOOTSTRAP`: Compiler bootstrap file
//!
//! # Exit status
//!
//! The script's return code (clamped to `0..=255`); `1` for start-up
//! failures; `2` for usage errors; `0` for `--help` and `--version`.

mod logging;
mod tracing_writer;

use clap::error::ErrorKind;
use clap::Parser;
use lantern_app::{
    App, AppError, ConfigError, ConfigResolver, ExecutionConfig, PluginSet, RunOutcome,
    TracePlugin,
};
use lantern_runtime::{ConfigLoader, EncodePolicy, EncodingChoice, OutputStreams};
use logging::LogControl;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

/// Lantern - run Lua and Brew scripts
#[derive(Parser, Debug)]
#[command(name = "lantern")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Additional config file, applied over global and project config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output encoding for stdout and stderr (also: LANTERN_OUTPUT_ENCODING)
    #[arg(long, value_name = "ENC")]
    output_encoding: Option<String>,

    /// What to do with unencodable characters: replace, escape or utf-8
    #[arg(long, value_name = "POLICY")]
    output_policy: Option<EncodePolicy>,

    /// Load the Brew compiler from this file (also: LANTERN_BOOTSTRAP)
    #[arg(long, value_name = "PATH")]
    bootstrap: Option<PathBuf>,

    /// Script to run (`.brew` files are compiled first)
    script: PathBuf,

    /// Arguments passed to the script as `lantern.args`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// CLI-based configuration resolver.
///
/// Parses argv when the controller asks for configuration, merges
/// file/env config via [`ConfigLoader`] and applies CLI argument overrides
/// as the highest-priority layer.
struct CliConfigResolver {
    argv: Vec<OsString>,
    project_root: PathBuf,
    loader: ConfigLoader,
}

impl CliConfigResolver {
    fn new(argv: impl IntoIterator<Item = OsString>) -> Self {
        let project_root = std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to get current directory, using '.'");
            PathBuf::from(".")
        });
        Self {
            argv: argv.into_iter().collect(),
            loader: ConfigLoader::new().with_project_root(&project_root),
            project_root,
        }
    }

    fn parse(&self) -> Result<Args, ConfigError> {
        Args::try_parse_from(&self.argv).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ConfigError::Info(e.to_string()),
            _ => ConfigError::Usage(e.to_string()),
        })
    }
}

impl ConfigResolver for CliConfigResolver {
    fn resolve(&self) -> Result<ExecutionConfig, ConfigError> {
        let args = self.parse()?;

        let mut loader = self.loader.clone();
        if let Some(ref path) = args.config {
            loader = loader.with_config_file(path);
        }
        let mut settings = loader.load()?;

        // CLI args override (highest priority)
        if args.debug {
            settings.debug = true;
            settings.logging.level = Some("debug".into());
        } else if args.verbose {
            settings.logging.level = Some("info".into());
        }
        if let Some(encoding) = args.output_encoding {
            settings.output.encoding = encoding;
        }
        if let Some(policy) = args.output_policy {
            settings.output.policy = policy;
        }
        if let Some(path) = args.bootstrap {
            settings.engine.bootstrap_path = Some(path);
        }

        Ok(ExecutionConfig::new(args.script)
            .with_args(args.args)
            .with_base_dir(&self.project_root)
            .with_settings(settings))
    }
}

/// Maps a script return code onto a process exit status.
fn exit_status(code: i32) -> u8 {
    u8::try_from(code.clamp(0, 255)).unwrap_or(u8::MAX)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let streams = OutputStreams::install(EncodingChoice::default(), EncodePolicy::default());
    let log = logging::init(streams.stderr())?;

    let code = match launch(&streams, &log, std::env::args_os()).await {
        Ok(outcome) => exit_status(outcome.exit_code),
        Err(e) => report(&streams, &e),
    };

    streams.flush_all();
    Ok(ExitCode::from(code))
}

/// Creates, configures and runs the app. Errors stay `AppError` (it is not
/// `Send`) and are printed by [`report`].
async fn launch(
    streams: &OutputStreams,
    log: &LogControl,
    argv: impl IntoIterator<Item = OsString>,
) -> Result<RunOutcome, AppError> {
    let app = App::new(streams.clone(), &PluginSet::new().with(TracePlugin))?;
    let configured = app.configure(CliConfigResolver::new(argv))?;
    let settings = &configured.config().settings;
    log.apply(settings.logging.directive(settings.debug).as_deref());
    configured.run().await
}

/// Prints a start-up error and returns the exit status for it.
fn report(streams: &OutputStreams, err: &AppError) -> u8 {
    tracing::debug!(code = err.code(), "start-up aborted");
    let (stream, text) = match err {
        AppError::Config(ConfigError::Info(text)) => (streams.stdout(), text.clone()),
        AppError::Config(ConfigError::Usage(text)) => (streams.stderr(), text.clone()),
        other => (streams.stderr(), format!("Error: {other}")),
    };
    if let Err(e) = stream.write_line(text.trim_end()) {
        tracing::warn!(error = %e, code = err.code(), "failed to print start-up error");
    }
    exit_status(err.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(args: &[&str], root: &std::path::Path) -> CliConfigResolver {
        let argv = std::iter::once("lantern")
            .chain(args.iter().copied())
            .map(OsString::from);
        CliConfigResolver {
            argv: argv.collect(),
            project_root: root.to_path_buf(),
            loader: ConfigLoader::new()
                .with_project_root(root)
                .skip_global_config()
                .skip_env_vars(),
        }
    }

    #[test]
    fn resolve_defaults_no_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = resolver(&["main.lua"], dir.path()).resolve().expect("resolve");
        assert_eq!(config.script, PathBuf::from("main.lua"));
        assert!(config.args.is_empty());
        assert!(!config.settings.debug);
        assert_eq!(config.settings.logging.level, None);
        assert_eq!(config.base_dir, dir.path());
    }

    #[test]
    fn script_args_pass_through_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = resolver(&["-d", "main.brew", "one", "--two", "-x"], dir.path())
            .resolve()
            .expect("resolve");
        assert!(config.settings.debug);
        assert_eq!(config.args, vec!["one", "--two", "-x"]);
    }

    #[test]
    fn cli_overrides_file_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = dir.path().join(".lantern");
        std::fs::create_dir_all(&project).expect("mkdir");
        std::fs::write(
            project.join("config.toml"),
            "[output]\nencoding = \"latin-1\"\npolicy = \"escape\"\n",
        )
        .expect("write");

        let config = resolver(&["main.lua"], dir.path()).resolve().expect("resolve");
        assert_eq!(config.settings.output.encoding, "latin-1");
        assert_eq!(config.settings.output.policy, EncodePolicy::Escape);

        let config = resolver(
            &["--output-encoding", "ascii", "--output-policy", "replace", "main.lua"],
            dir.path(),
        )
        .resolve()
        .expect("resolve");
        assert_eq!(config.settings.output.encoding, "ascii");
        assert_eq!(config.settings.output.policy, EncodePolicy::Replace);
    }

    #[test]
    fn verbose_sets_info_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = resolver(&["-v", "main.lua"], dir.path()).resolve().expect("resolve");
        assert_eq!(config.settings.logging.level.as_deref(), Some("info"));
    }

    #[test]
    fn bootstrap_flag_sets_engine_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = resolver(&["--bootstrap", "brew.lua", "main.brew"], dir.path())
            .resolve()
            .expect("resolve");
        assert_eq!(
            config.settings.engine.bootstrap_path,
            Some(PathBuf::from("brew.lua"))
        );
    }

    #[test]
    fn missing_script_is_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolver(&[], dir.path()).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Usage(_)));
    }

    #[test]
    fn bad_policy_is_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolver(&["--output-policy", "shout", "main.lua"], dir.path())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Usage(ref m) if m.contains("shout")));
    }

    #[test]
    fn help_and_version_are_informational() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolver(&["--help"], dir.path()).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Info(ref m) if m.contains("Usage")));
        let err = resolver(&["--version"], dir.path()).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Info(ref m) if m.contains(env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolver(&["--config", "nope.toml", "main.lua"], dir.path())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn report_survives_closed_output() {
        let streams = OutputStreams::from_sinks(
            Box::new(ClosedPipe),
            Box::new(ClosedPipe),
            EncodingChoice::default(),
            EncodePolicy::Replace,
        );
        let usage = AppError::Config(ConfigError::Usage("error: bad flag".into()));
        assert_eq!(report(&streams, &usage), 2);
        let help = AppError::Config(ConfigError::Info("Usage: lantern".into()));
        assert_eq!(report(&streams, &help), 0);
        streams.flush_all();
    }

    #[test]
    fn exit_status_clamps() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(3), 3);
        assert_eq!(exit_status(300), 255);
        assert_eq!(exit_status(-4), 0);
    }
}
