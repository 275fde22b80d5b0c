use crate::common::{INSTA_FILTERS, TestContext, fixture};
use crate::rayskull_snapshot;

#[test]
fn compiled_package() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("cran").arg(fixture("fastmatch/DESCRIPTION"));

    let output = cmd.output().expect("Failed to execute rayskull");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.starts_with("{% set name = \"fastmatch\" %}\n"));
    assert!(stdout.contains("{% set posix = 'm2-' if win else '' %}\n"));
    assert!(stdout.contains("  name: r-{{ name|lower }}\n"));
    assert!(stdout.contains("    - {{ compiler('m2w64_c') }}  # [win]\n"));
    assert!(stdout.contains("    - r-rcpp >=1.0.0\n"));
    assert!(stdout.ends_with("# NeedsCompilation: yes\n"));
    assert!(output.stderr.is_empty());
}

#[test]
fn pure_r_package() {
    let context = TestContext::new();
    context.write(
        "DESCRIPTION",
        "Package: glue\nVersion: 1.7.0\nTitle: Interpreted String Literals\nLicense: MIT + file LICENSE\n",
    );
    let mut cmd = context.command();
    cmd.args(["cran", "DESCRIPTION"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {% set name = "glue" %}
    {% set version = "1.7.0" %}

    package:
      name: r-{{ name|lower }}
      version: {{ version }}

    source:
      url:
        - {{ cran_mirror }}/src/contrib/{{ name }}_{{ version }}.tar.gz
        - {{ cran_mirror }}/src/contrib/Archive/{{ name }}/{{ name }}_{{ version }}.tar.gz

    build:
      noarch: generic
      number: 0
      merge_build_host: true  # [win]
      script: R CMD INSTALL --build . $R_ARGS
      rpaths:
        - lib/R/lib/
        - lib/

    requirements:
      host:
        - r-base
      run:
        - r-base

    test:
      commands:
        - $R -e "library('glue')"  # [not win]
        - "\"%R%\" -e \"library('glue')\""  # [win]

    about:
      home: https://CRAN.R-project.org/package=glue
      summary: Interpreted String Literals
      license: MIT + file LICENSE

    extra:
      recipe-maintainers:
        - AddYourGitHubIdHere

    # Package: glue
    # Version: 1.7.0
    # Title: Interpreted String Literals
    # License: MIT + file LICENSE
    ----- stderr -----
    "#);
}

#[test]
fn description_without_package() {
    let context = TestContext::new();
    context.write("DESCRIPTION", "Version: 1.0\n");
    let mut cmd = context.command();
    cmd.args(["cran", "DESCRIPTION"]);

    rayskull_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    error: Failed to parse `DESCRIPTION`
      Caused by: Missing required field `Package`
    ");
}

#[test]
fn missing_license_is_a_warning() {
    let context = TestContext::new();
    context.write("DESCRIPTION", "Package: nolicense\nVersion: 0.1\n");
    let mut cmd = context.command();
    cmd.args(["cran", "DESCRIPTION"]);

    let output = cmd.output().expect("Failed to execute rayskull");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(stderr.contains("warning: No license found for `nolicense`, please add one"));
}
