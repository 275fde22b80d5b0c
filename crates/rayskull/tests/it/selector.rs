use crate::common::{INSTA_FILTERS, TestContext};
use crate::rayskull_snapshot;

#[test]
fn lower_bound_below_baseline() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.5", "--baseline", "2.7,3.6,3.7,3.8"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    selector: # [py2k]
    limit: >=3.6
    ----- stderr -----
    ");
}

#[test]
fn inclusive_upper_bound() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", "<=3.7", "--baseline", "2.7,3.6,3.7,3.8"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    selector: # [py>=38]
    limit: <3.8
    ----- stderr -----
    ");
}

#[test]
fn strict_mode_has_a_floor() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.5", "--strict"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    limit: >=3.7
    ----- stderr -----
    ");
}

#[test]
fn strict_mode_upper_bound() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", "<3.9", "--strict"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    selector: # [py>=39]
    limit: <3.9
    ----- stderr -----
    ");
}

#[test]
fn strict_mode_baseline_replaces_conda_forge_interpreters() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.9", "--strict", "--baseline", "3.8,3.9,3.10"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    selector: # [py<39]
    limit: >=3.9
    ----- stderr -----
    ");
}

#[test]
fn window_renders_exclusions() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.7,<3.9", "--baseline", "3.6,3.7,3.8,3.9"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    selector: # [py==36 or py==39]
    limit: !=3.6,!=3.9
    ----- stderr -----
    ");
}

#[test]
fn unrestricted() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=2.7", "--baseline", "2.7,3.6,3.7,3.8"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    `>=2.7` allows every supported interpreter
    ");
}

#[test]
fn excludes_everything() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=4.0", "--baseline", "3.8,3.9"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    warning: `>=4.0` excludes every supported interpreter
    ");
}

#[test]
fn upper_bound_below_baseline_excludes_everything() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", "<3.0", "--baseline", "3.8,3.9"]);

    let output = cmd.output().expect("Failed to execute rayskull");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_baseline() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.8", "--baseline", "three"]);

    let output = cmd.output().expect("Failed to execute rayskull");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid version `three`"));
}
