use crate::common::{INSTA_FILTERS, TestContext, fixture};
use crate::rayskull_snapshot;

#[test]
fn merge_sources() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("merge")
        .arg(fixture("records/primary.json"))
        .arg(fixture("records/manifest.json"));

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    click >=8.0
    colorama  # [win]
    pkg_name
    requests >=2.0
    ----- stderr -----
    ");
}

#[test]
fn merge_against_available_names() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("merge")
        .arg(fixture("records/primary.json"))
        .arg(fixture("records/manifest.json"))
        .arg("--available")
        .arg(fixture("available.txt"));

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    click >=8.0
    colorama  # [win]
    pkg-name
    requests >=2.0
    ----- stderr -----
    warning: `colorama` may not be available on conda-forge
    ");
}

#[test]
fn invalid_constraint() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("merge").arg(fixture("records/invalid.json"));

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    error: Invalid constraint `>=abc` for `requests`
      Caused by: Invalid version `abc`: expected `major[.minor[.patch]]`
    ");
}

#[test]
fn malformed_records() {
    let context = TestContext::new();
    let records = context.write("records.json", r#"{"name": "requests"}"#);
    let mut cmd = context.command();
    cmd.arg("merge").arg(records);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Failed to parse requirement records"));
    assert!(stderr.contains("Caused by"));
}

#[test]
fn only_skipped_records() {
    let context = TestContext::new();
    let records = context.write(
        "records.json",
        r#"[{"name": "pytest", "environment_marker_expression": "extra == 'test'", "source_priority": "build-backend"}]"#,
    );
    let mut cmd = context.command();
    cmd.arg("merge").arg(records);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    No requirements to merge
    ");
}
