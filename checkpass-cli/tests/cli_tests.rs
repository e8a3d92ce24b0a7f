use std::io::Write;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_checkpass"))
        .args(args)
        .env("RUN_MODE", "test")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn checkpass");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write password");
    child.wait_with_output().expect("Failed to wait for checkpass")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone())
        .expect("stdout is UTF-8")
        .trim_end()
        .to_string()
}

#[test]
fn test_verify_exit_status() {
    let hash = "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5";

    let matched = run(&["verify", hash], "Hello world!\n");
    assert!(matched.status.success());
    assert_eq!(stdout(&matched), "match");

    let mismatched = run(&["verify", hash], "Hello world?\n");
    assert_eq!(mismatched.status.code(), Some(1));
    assert_eq!(stdout(&mismatched), "mismatch");
}

#[test]
fn test_newhash_uses_configured_defaults() {
    let output = run(&["newhash", "--id", "bcrypt"], "secret\n");
    assert!(output.status.success());
    let hash = stdout(&output);
    assert!(hash.starts_with("$2b$04$"), "{hash}");

    let verified = run(&["verify", &hash], "secret\n");
    assert!(verified.status.success());
}

#[test]
fn test_environment_overrides_file() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_checkpass"))
        .args(["newhash", "--id", "pbkdf2-sha256"])
        .env("RUN_MODE", "test")
        .env("RUST_LOG", "off")
        .env("CHECKPASS__DEFAULTS__PBKDF2__ROUNDS", "3")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn checkpass");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"secret\n")
        .expect("Failed to write password");
    let output = child.wait_with_output().expect("Failed to wait for checkpass");

    assert!(stdout(&output).starts_with("$pbkdf2-sha256$i=3$"));
}

#[test]
fn test_unrecognized_hash_fails() {
    let output = run(&["identify", "$1$abc$def"], "");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
