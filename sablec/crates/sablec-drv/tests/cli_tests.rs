//! CLI smoke tests for the `sablec` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_compiles_file_and_prints_mir() {
    let mut source = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(source, "def main() -> int:").unwrap();
    writeln!(source, "    return 7").unwrap();

    Command::cargo_bin("sablec")
        .expect("binary exists")
        .arg(source.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("__main__.main:"))
        .stdout(predicate::str::contains("v0 = iconst.64 7"))
        .stdout(predicate::str::contains("return v0"));
}

#[test]
fn test_reports_validation_diagnostics() {
    let mut source = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(source, "x = 1").unwrap();

    Command::cargo_bin("sablec")
        .expect("binary exists")
        .arg(source.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Regular assignment is not supported"));
}

#[test]
fn test_usage_without_arguments() {
    Command::cargo_bin("sablec")
        .expect("binary exists")
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage"));
}

#[test]
fn test_missing_file_fails_with_context() {
    Command::cargo_bin("sablec")
        .expect("binary exists")
        .arg("no-such-file.sbl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
