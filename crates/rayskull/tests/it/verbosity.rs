use crate::common::{TestContext, fixture};

#[test]
fn quiet_suppresses_warnings() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("--quiet")
        .arg("merge")
        .arg(fixture("records/primary.json"))
        .arg("--available")
        .arg(fixture("available.txt"));

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(
        stderr.is_empty(),
        "Expected no output with --quiet, got: {stderr}"
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("requests >=2.0"));
}

#[test]
fn quiet_keeps_errors() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["-q", "cran", "missing"]);

    let output = cmd.output().expect("Failed to execute rayskull");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn verbose_shows_debug_messages() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("-v")
        .arg("merge")
        .arg(fixture("records/primary.json"));

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(stderr.contains("debug: 4 records from"), "Got: {stderr}");
    assert!(stderr.contains("Running `rayskull merge`"), "Got: {stderr}");
}

#[test]
fn log_filter_from_environment() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.env("RAYSKULL_LOG", "rayskull=debug")
        .arg("merge")
        .arg(fixture("records/primary.json"));

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(stderr.contains("Skipping `pytest`"), "Got: {stderr}");
    assert!(!stderr.contains("debug: 4 records"), "Got: {stderr}");
}
