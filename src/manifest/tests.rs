//! Tests for manifest parsing and loading.

use super::*;
use crate::ast::{Command, StringOrList};
use camino::Utf8PathBuf;
use miette::Diagnostic;
use rstest::rstest;

const FULL: &str = r#"
kumiki_version: "1.0.0"
macros:
  CXX: clang++
  CXXFLAGS: [-std=c++11, -Wall]
  OUTDIR: bin/
silent: [app]
suffixes: []
projects:
  - name: app
    inputs: [src/main.cpp]
    outname: app.bin
    flags:
      compile-c++: [-O2]
      link: [-lm]
    postbuild: ["@echo built", [strip, "$@"]]
  - name: docs
"#;

#[rstest]
fn parses_full_manifest() {
    let manifest = from_str(FULL).expect("parse");
    assert_eq!(manifest.kumiki_version, semver::Version::new(1, 0, 0));
    let keys: Vec<&str> = manifest.macros.keys().map(String::as_str).collect();
    assert_eq!(keys, ["CXX", "CXXFLAGS", "OUTDIR"]);
    assert_eq!(manifest.macros["CXX"], StringOrList::String("clang++".into()));
    assert_eq!(manifest.macros["CXXFLAGS"].joined(), "-std=c++11 -Wall");
    assert_eq!(manifest.silent, Some(vec!["app".to_owned()]));
    assert_eq!(manifest.suffixes, Some(Vec::new()));

    let app = &manifest.projects[0];
    assert_eq!(app.outname(), "app.bin");
    assert_eq!(app.flags.compile_cxx, ["-O2"]);
    assert_eq!(app.flags.link, ["-lm"]);
    assert_eq!(
        app.postbuild,
        [
            Command::Literal("@echo built".into()),
            Command::tokens(["strip", "$@"]),
        ]
    );

    let docs = &manifest.projects[1];
    assert!(docs.inputs.is_empty());
    assert_eq!(docs.out_path(), "$(OUTDIR)docs");
}

#[rstest]
#[case::unknown_top_level("kumiki_version: \"1.0.0\"\nprojects: []\ntargets: []\n")]
#[case::unknown_project_key("kumiki_version: \"1.0.0\"\nprojects:\n  - name: a\n    sources: [a.c]\n")]
#[case::unknown_flag_category("kumiki_version: \"1.0.0\"\nprojects:\n  - name: a\n    flags:\n      asm: [-g]\n")]
#[case::missing_version("projects: []\n")]
#[case::bad_version("kumiki_version: one\nprojects: []\n")]
#[case::malformed("kumiki_version: \"1.0.0\"\nprojects: [\n")]
fn rejects_invalid_manifests(#[case] yaml: &str) {
    let err = from_str(yaml).expect_err("invalid manifest");
    assert!(matches!(err, ManifestError::Parse { .. }), "{err:?}");
    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("kumiki::manifest::parse")
    );
}

#[rstest]
fn reads_manifest_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join(DEFAULT_MANIFEST)).expect("utf8 path");
    std::fs::write(&path, FULL).expect("write manifest");
    let manifest = from_path(&path).expect("load");
    assert_eq!(manifest.projects.len(), 2);
}

#[rstest]
fn parse_error_is_named_after_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("broken.yml")).expect("utf8 path");
    std::fs::write(&path, "projects: [\n").expect("write manifest");
    let err = from_path(&path).expect_err("parse error");
    assert!(err.to_string().contains("broken.yml"), "{err}");
}

#[rstest]
fn missing_file_is_a_read_error() {
    let err = from_path("/nonexistent/Kumikifile").expect_err("read error");
    assert!(matches!(err, ManifestError::Read { ref path, .. } if path == "/nonexistent/Kumikifile"));
}
