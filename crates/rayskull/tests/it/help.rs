use crate::common::{INSTA_FILTERS, rayskull_command, rayskull_help};
use crate::rayskull_snapshot;

#[test]
fn help_shows_all_commands() {
    rayskull_snapshot!(&INSTA_FILTERS, rayskull_help(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Generate conda recipes from package metadata.

    Usage: rayskull [OPTIONS] <COMMAND>

    Commands:
      pypi       Generate a recipe from PyPI release metadata
      pyproject  Generate a recipe from a `pyproject.toml`
      cran       Generate an R recipe from a CRAN `DESCRIPTION` file
      selector   Print the skip selector and python limit for a `requires-python` value
      merge      Merge requirement records into conda requirement lines
      help       Print this message or the help of the given subcommand(s)

    Options:
      -v, --verbose...  Increase logging verbosity
      -q, --quiet       Suppress all output except the result
      -h, --help        Print help
      -V, --version     Print version

    Use `rayskull help <command>` for more information on a specific command.
    ----- stderr -----
    ");
}

#[test]
fn help_pypi() {
    let mut cmd = rayskull_command();
    cmd.args(["help", "pypi"]);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("PyPI release metadata"));
    assert!(stdout.contains("--sdist-metadata"));
    assert!(stdout.contains("--strict-conda-forge"));
    assert!(stdout.contains("--available"));
}

#[test]
fn unknown_command_errors() {
    let mut cmd = rayskull_command();
    cmd.arg("nonexistent");

    let output = cmd.output().expect("Failed to execute rayskull");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn no_args_shows_usage() {
    let output = rayskull_command()
        .output()
        .expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("Usage") || stderr.contains("subcommand"),
        "Expected usage info in stderr, got: {stderr}"
    );
}

#[test]
fn merge_requires_a_file() {
    let mut cmd = rayskull_command();
    cmd.arg("merge");

    let output = cmd.output().expect("Failed to execute rayskull");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("<RECORDS>"));
}
