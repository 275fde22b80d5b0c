use crate::common::{INSTA_FILTERS, TestContext, fixture};
use crate::rayskull_snapshot;

#[test]
fn discovered_file_enables_strict_mode() {
    let context = TestContext::new();
    context.write("rayskull.toml", "strict-conda-forge = true\n");
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.5"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    limit: >=3.7
    ----- stderr -----
    ");
}

#[test]
fn maintainers_from_file() {
    let context = TestContext::new();
    context.write("rayskull.toml", "maintainers = [\"alice\", \"bob\"]\n");
    let mut cmd = context.command();
    cmd.arg("cran").arg(fixture("fastmatch/DESCRIPTION"));

    let output = cmd.output().expect("Failed to execute rayskull");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("  recipe-maintainers:\n    - alice\n    - bob\n"));
    assert!(!stdout.contains("AddYourGitHubIdHere"));
}

#[test]
fn explicit_config_must_exist() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.env("RAYSKULL_CONFIG", "nowhere.toml")
        .args(["selector", ">=3.8"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    error: RAYSKULL_CONFIG is set to 'nowhere.toml' but the file does not exist
    ");
}

#[test]
fn unknown_setting_is_rejected() {
    let context = TestContext::new();
    context.write("rayskull.toml", "strict = true\n");
    let mut cmd = context.command();
    cmd.args(["selector", ">=3.8"]);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Failed to parse"), "Got: {stderr}");
    assert!(stderr.contains("unknown field `strict`"), "Got: {stderr}");
}
