//! Running scripts end to end inside an engine session.

use lantern_lua::{
    ConversionService, EngineError, HostContext, ScriptRunner, ScriptStatus, TimerQueue,
};
use lantern_runtime::io::CaptureBuffer;
use lantern_runtime::{EncodePolicy, EncodingChoice, OutputStreams, ReturnCode};
use std::path::Path;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    runner: ScriptRunner,
    rc: ReturnCode,
    out: CaptureBuffer,
    err: CaptureBuffer,
}

fn harness(file_name: &str, source: &str) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join(file_name);
    std::fs::write(&script, source).expect("write script");
    harness_for(dir, &script)
}

fn harness_for(dir: TempDir, script: &Path) -> Harness {
    let (streams, out, err) =
        OutputStreams::captured(EncodingChoice::default(), EncodePolicy::Replace);
    let rc = ReturnCode::new();
    let host = HostContext {
        script: script.to_path_buf(),
        args: vec!["alpha".into()],
        return_code: rc.clone(),
        streams,
        timers: TimerQueue::shared(),
    };
    let service = ConversionService::default();
    let session = service.instance().expect("session");
    let runner = ScriptRunner::new(session, host).expect("runner");
    Harness {
        _dir: dir,
        runner,
        rc,
        out,
        err,
    }
}

#[tokio::test]
async fn lua_script_exit_code() {
    let h = harness(
        "main.lua",
        "print('hello ' .. lantern.args[1])\nlantern.exit(3)\nprint('unreachable')\n",
    );
    let status = h.runner.run().await.expect("run");
    assert_eq!(status, ScriptStatus::Exited);
    assert_eq!(h.rc.resolve(), 3);
    assert_eq!(h.out.contents(), "hello alpha\n");
    assert!(h.err.contents().is_empty());
}

#[tokio::test]
async fn completed_script_leaves_code_unset() {
    let h = harness("ok.lua", "local x = 1 + 1\n");
    let status = h.runner.run().await.expect("run");
    assert_eq!(status, ScriptStatus::Completed);
    assert_eq!(h.rc.get(), None);
    assert_eq!(h.rc.resolve(), 0);
}

#[tokio::test]
async fn brew_script_with_callbacks() {
    let h = harness(
        "main.brew",
        "\
lantern.set_timeout (-> print \"timeout\"), 5
lantern.defer ->
  print \"deferred\"
print \"main\"
",
    );
    let status = h.runner.run().await.expect("run");
    assert_eq!(status, ScriptStatus::Completed);
    assert_eq!(h.out.contents(), "main\ndeferred\ntimeout\n");
}

#[tokio::test]
async fn uncaught_error_reports_and_fails() {
    let h = harness("bad.lua", "error('boom')\n");
    let status = h.runner.run().await.expect("run");
    assert!(matches!(status, ScriptStatus::Failed(ref msg) if msg.contains("boom")));
    assert_eq!(h.rc.resolve(), 1);
    let err = h.err.contents();
    assert!(err.starts_with("Error: "), "stderr: {err}");
    assert!(err.contains("boom"));
}

#[tokio::test]
async fn error_in_callback_fails_run() {
    let h = harness(
        "cb.lua",
        "lantern.defer(function() error('callback broke') end)\n",
    );
    let status = h.runner.run().await.expect("run");
    assert!(matches!(status, ScriptStatus::Failed(_)));
    assert_eq!(h.rc.resolve(), 1);
    assert!(h.err.contents().contains("callback broke"));
}

#[tokio::test]
async fn exit_from_callback_stops_loop() {
    let h = harness(
        "exit.lua",
        "lantern.defer(function() lantern.exit(4) end)\n\
         lantern.set_timeout(function() print('late') end, 10)\n",
    );
    let status = h.runner.run().await.expect("run");
    assert_eq!(status, ScriptStatus::Exited);
    assert_eq!(h.rc.resolve(), 4);
    assert!(h.out.contents().is_empty());
}

#[tokio::test]
async fn brew_conversion_failure() {
    let h = harness("broken.brew", "if yes\nprint 1\n");
    let status = h.runner.run().await.expect("run");
    assert!(matches!(status, ScriptStatus::ConversionFailed(ref msg) if msg.contains("line 2")));
    assert_eq!(h.rc.resolve(), 1);
    assert!(h.err.contents().starts_with("Error: "));
}

#[tokio::test]
async fn scripts_can_compile_brew() {
    let h = harness(
        "compile.lua",
        "local code = lantern.compile('x = 1')\nprint(code:find('x = 1', 1, true) ~= nil)\n\
         local ok, err = pcall(lantern.compile, 'if x\\ny = 1')\nprint(ok, err)\n",
    );
    h.runner.run().await.expect("run");
    assert_eq!(
        h.out.contents(),
        "true\nfalse\tline 2: expected an indented block after 'if'\n"
    );
}

#[tokio::test]
async fn missing_script_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("absent.lua");
    let h = harness_for(dir, &script);
    let err = h.runner.run().await.unwrap_err();
    assert!(matches!(err, EngineError::ScriptRead { .. }));
}

#[tokio::test]
async fn pcall_does_not_swallow_exit() {
    let h = harness("guarded.lua", "pcall(lantern.exit, 3)\nprint('after exit')\n");
    let status = h.runner.run().await.expect("run");
    assert_eq!(status, ScriptStatus::Exited);
    assert_eq!(h.rc.resolve(), 3);
    assert!(h.out.contents().is_empty());
    assert!(h.err.contents().is_empty());
}

#[tokio::test]
async fn infinite_timeout_fails_the_script() {
    let h = harness(
        "forever.lua",
        "lantern.set_timeout(function() end, math.huge)\nprint('unreachable')\n",
    );
    let status = h.runner.run().await.expect("run");
    assert!(matches!(status, ScriptStatus::Failed(ref msg) if msg.contains("invalid timeout")));
    assert_eq!(h.rc.resolve(), 1);
    assert!(h.out.contents().is_empty());
}
