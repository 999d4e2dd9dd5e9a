#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/lspwire-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn endpoint_for(path: &Path) -> String {
    format!("unix:{}", path.display())
}

struct ServeGuard {
    child: Child,
    dir: PathBuf,
}

impl Drop for ServeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn start_server(tag: &str, extra: &[&str]) -> (ServeGuard, String) {
    let dir = unique_temp_dir(tag);
    let sock_path = dir.join("lsp.sock");
    let endpoint = endpoint_for(&sock_path);

    let child = Command::new(env!("CARGO_BIN_EXE_lspwire"))
        .args(["--log-level", "error", "serve", &endpoint])
        .args(extra)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve command should start");
    let guard = ServeGuard { child, dir };

    wait_for_socket(&sock_path, Duration::from_secs(3));
    (guard, endpoint)
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while std::os::unix::net::UnixStream::connect(path).is_err() {
        if start.elapsed() >= timeout {
            panic!("server did not come up at {}", path.display());
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn lspwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lspwire"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("lspwire should run")
}

#[test]
fn send_ping_prints_pong() {
    let (_server, endpoint) = start_server("ping", &[]);

    let output = lspwire(&["send", &endpoint, "ping", "--id", "7"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), r#"{"kind":"response","id":7,"result":"pong"}"#);
}

#[test]
fn send_echo_returns_params_with_string_id() {
    let (_server, endpoint) = start_server("echo", &[]);

    let output = lspwire(&[
        "send",
        &endpoint,
        "echo",
        "--id",
        "req-9",
        "--params",
        r#"{"uri":"file:///a.rs"}"#,
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"{"kind":"response","id":"req-9","result":{"uri":"file:///a.rs"}}"#
    );
}

#[test]
fn unknown_method_exits_with_failure() {
    let (_server, endpoint) = start_server("unknown", &[]);

    let output = lspwire(&["send", &endpoint, "textDocument/hover"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"{"kind":"diagnostic","message":"invalid method"}"#
    );
}

#[test]
fn exit_notification_gets_no_reply() {
    let (_server, endpoint) = start_server("notify", &[]);

    let output = lspwire(&["send", &endpoint, "exit", "--notify"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), r#"{"kind":"empty"}"#);
}

#[test]
fn raw_format_prints_the_envelope() {
    let (_server, endpoint) = start_server("raw", &[]);

    let output = Command::new(env!("CARGO_BIN_EXE_lspwire"))
        .args(["--format", "raw", "send", &endpoint, "ping"])
        .output()
        .expect("send should run");
    assert!(output.status.success());
    assert_eq!(output.stdout, br#"{"jsonrpc":"2.0","id":1,"result":"pong"}"#);
}

#[test]
fn server_keeps_serving_after_each_connection() {
    let (_server, endpoint) = start_server("repeat", &[]);

    for id in 1..=3 {
        let output = lspwire(&["send", &endpoint, "ping", "--id", &id.to_string()]);
        assert!(output.status.success(), "call {id} failed");
    }
}

#[test]
fn missing_socket_is_transport_error() {
    let dir = unique_temp_dir("missing");
    let endpoint = endpoint_for(&dir.join("absent.sock"));

    let output = lspwire(&["send", &endpoint, "ping"]);
    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_params_is_usage_error() {
    let output = lspwire(&["send", "127.0.0.1:9", "echo", "--params", "{nope"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn invalid_endpoint_is_usage_error() {
    let output = lspwire(&["send", "no-port-here", "ping"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_crate_version() {
    let output = lspwire(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("lspwire {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_features() {
    let output = lspwire(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: lspwire"));
    assert!(stdout.contains("cli=true"));
}

#[cfg(feature = "async")]
#[test]
fn async_server_answers_ping() {
    let (_server, endpoint) = start_server("async", &["--async"]);

    let output = lspwire(&["send", &endpoint, "ping", "--id", "2"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), r#"{"kind":"response","id":2,"result":"pong"}"#);
}
