use crate::common::{INSTA_FILTERS, TestContext, fixture};
use crate::rayskull_snapshot;

#[test]
fn pep621_project() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("pyproject").arg(fixture("black/pyproject.toml"));

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {% set name = "black" %}
    {% set version = "24.1.0" %}

    package:
      name: {{ name|lower }}
      version: {{ version }}

    build:
      noarch: python
      entry_points:
        - black = black:patched_main
      script: {{ PYTHON }} -m pip install . -vv --no-deps --no-build-isolation
      number: 0

    requirements:
      host:
        - python >=3.8
        - pip
        - hatchling >=1.5
      run:
        - python >=3.8
        - click >=8.0.0
        - platformdirs >=2

    test:
      imports:
        - black
      commands:
        - pip check
        - black --help
      requires:
        - pip

    about:
      home: https://github.com/psf/black
      summary: The uncompromising code formatter.
      license: MIT
      dev_url: https://github.com/psf/black

    extra:
      recipe-maintainers:
        - AddYourGitHubIdHere
    ----- stderr -----
    "#);
}

#[test]
fn writes_recipe_to_file() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("pyproject")
        .arg(fixture("black/pyproject.toml"))
        .args(["--output", "meta.yaml"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    Wrote recipe to `meta.yaml`
    ");

    let recipe = fs_err::read_to_string(context.path().join("meta.yaml")).unwrap();
    assert!(recipe.starts_with("{% set name = \"black\" %}\n"));
    assert!(recipe.contains("  noarch: python\n"));
}

#[test]
fn poetry_project() {
    let context = TestContext::new();
    let path = context.write(
        "pyproject.toml",
        r#"
[tool.poetry]
name = "pkg"
version = "1.0.0"
license = "MIT"

[tool.poetry.dependencies]
python = "^3.8"
requests = "^2.28"
pywin32 = { version = "*", platform = "win32" }
pandas = { version = "^1.5", optional = true }
"#,
    );
    let mut cmd = context.command();
    cmd.arg("pyproject").arg(path);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("    - poetry-core\n"));
    assert!(stdout.contains("    - requests >=2.28.0,<3.0.0\n"));
    assert!(stdout.contains("    - pywin32  # [win]\n"));
    assert!(stdout.contains("  run_constrained:\n    - pandas >=1.5.0,<2.0.0\n"));
    assert!(!stdout.contains("noarch"));
}

#[test]
fn missing_file() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.args(["pyproject", "missing.toml"]);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("missing.toml"), "Expected the path, got: {stderr}");
}
