use crate::common::{INSTA_FILTERS, TestContext, fixture};
use crate::rayskull_snapshot;

#[test]
fn click_release() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("pypi").arg(fixture("click.json"));

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {% set name = "click" %}
    {% set version = "8.1.7" %}

    package:
      name: {{ name|lower }}
      version: {{ version }}

    source:
      url: https://pypi.org/packages/source/{{ name[0] }}/{{ name }}/click-{{ version }}.tar.gz
      sha256: ca9853ad459e787e2192211578cc907e7594e294c7ccc834310722b41b9ca6de

    build:
      skip: true  # [py<37]
      script: {{ PYTHON }} -m pip install . -vv --no-deps --no-build-isolation
      number: 0

    requirements:
      host:
        - python
        - pip
      run:
        - python
        - colorama  # [win]
        - importlib-metadata  # [py<38]

    test:
      imports:
        - click
      commands:
        - pip check
      requires:
        - pip

    about:
      home: https://palletsprojects.com/p/click/
      summary: Composable command line interface toolkit
      license: BSD-3-Clause

    extra:
      recipe-maintainers:
        - AddYourGitHubIdHere
    ----- stderr -----
    "#);
}

#[test]
fn unknown_names_are_reported() {
    let context = TestContext::new();
    let available = context.write("available.txt", "colorama\n");
    let mut cmd = context.command();
    cmd.arg("pypi")
        .arg(fixture("click.json"))
        .arg("--available")
        .arg(available);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(stderr.contains("warning: `importlib-metadata` may not be available on conda-forge"));
    assert!(!stderr.contains("`colorama`"));
}

#[test]
fn strict_conda_forge_drops_legacy_guards() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("pypi")
        .arg(fixture("click.json"))
        .arg("--strict-conda-forge");

    let output = cmd.output().expect("Failed to execute rayskull");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("- colorama  # [win]"));
    assert!(!stdout.contains("py<37"));
}

#[test]
fn bare_info_object_without_version() {
    let context = TestContext::new();
    let info = context.write("info.json", r#"{"name": "nothing"}"#);
    let mut cmd = context.command();
    cmd.arg("pypi").arg(info);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("error:"), "Expected an error, got: {stderr}");
}
