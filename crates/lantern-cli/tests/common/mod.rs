//! Shared E2E test helpers for `lantern` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Environment variables that would leak host configuration into tests.
const LANTERN_VARS: &[&str] = &[
    "LANTERN_DEBUG",
    "LANTERN_OUTPUT_ENCODING",
    "LANTERN_OUTPUT_POLICY",
    "LANTERN_BOOTSTRAP",
    "RUST_LOG",
];

/// Scratch project directory that also serves as `HOME`.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir for workspace"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `name` under the workspace and returns its path.
    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, contents).expect("write workspace file");
        path
    }

    /// A `lantern` command running inside this workspace.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("lantern");
        cmd.timeout(TIMEOUT_BASIC);
        cmd.current_dir(self.dir.path());
        cmd.env("HOME", self.dir.path());
        for var in LANTERN_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}
