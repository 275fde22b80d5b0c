// The `unreachable_pub` is to silence false positives in RustRover.
#![allow(dead_code, unreachable_pub)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Insta snapshot filters shared across rayskull tests.
pub const INSTA_FILTERS: &[(&str, &str)] = &[
    // Rewrite Windows output to Unix output
    (r"\\([\w\d]|\.)", "/$1"),
    (r"rayskull\.exe", "rayskull"),
    // rayskull version display
    (
        r"rayskull \d+\.\d+\.\d+(-(alpha|beta|rc)\.\d+)?(\+\d+)?",
        r"rayskull [VERSION]",
    ),
    // Fixture paths
    (r"`[^`]*tests/fixtures/", "`[FIXTURES]/"),
    // Trim end-of-line whitespaces
    (r"([^\s])[ \t]+(\r?\n)", "$1$2"),
];

/// Returns the rayskull binary that cargo built before launching the tests.
pub fn get_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rayskull"))
}

/// Path to a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A scratch working directory, so no `rayskull.toml` from the checkout is
/// picked up.
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A `rayskull` command running inside the scratch directory.
    pub fn command(&self) -> Command {
        let mut command = rayskull_command();
        command.current_dir(self.path());
        command
    }

    /// Write a file into the scratch directory.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs_err::write(&path, content).expect("Failed to write test file");
        path
    }
}

/// Create a `rayskull` command for testing.
pub fn rayskull_command() -> Command {
    let mut command = Command::new(get_bin());
    // Clear environment variables that might interfere with tests.
    command.env_remove("RAYSKULL_CONFIG");
    command.env_remove("RAYSKULL_MAX_DEPTH");
    command.env_remove("RAYSKULL_LOG");
    command
}

/// Create a `rayskull help` command.
pub fn rayskull_help() -> Command {
    let mut command = rayskull_command();
    command.arg("help");
    command
}

/// Snapshot test helper macro. Runs a command and asserts against an insta snapshot.
#[macro_export]
macro_rules! rayskull_snapshot {
    ($filters:expr, $command:expr, @$expected:literal) => {{
        let output = $command.output().expect("Failed to execute rayskull");
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let mut combined = format!(
            "success: {:?}\nexit_code: {}\n----- stdout -----\n{}\n----- stderr -----\n{}",
            output.status.success(),
            output.status.code().unwrap_or(-1),
            stdout.trim(),
            stderr.trim(),
        );

        for (pattern, replacement) in $filters.iter() {
            let re = regex::Regex::new(pattern).expect("Invalid filter regex");
            combined = re.replace_all(&combined, *replacement).to_string();
        }

        insta::assert_snapshot!(combined, @$expected);
    }};
}
