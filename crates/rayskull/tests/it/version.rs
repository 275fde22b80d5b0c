use crate::common::rayskull_command;

#[test]
fn version_flag_shows_version() {
    let mut cmd = rayskull_command();
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute rayskull");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.starts_with("rayskull "),
        "Expected version string starting with 'rayskull ', got: {stdout}"
    );
}

#[test]
fn short_version_flag_works() {
    let mut cmd = rayskull_command();
    cmd.arg("-V");

    let output = cmd.output().expect("Failed to execute rayskull");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("rayskull "));
}
