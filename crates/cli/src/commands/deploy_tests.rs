// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn args(script: PathBuf) -> DeployArgs {
    DeployArgs { script, manifest: None, wait_manifest: false, name: None, owner: Some("alice".into()) }
}

#[test]
fn submission_uses_file_name_and_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bot.py");
    std::fs::write(&path, b"import requests\n").unwrap();

    let submission = build_submission(&args(path)).unwrap();
    assert_eq!(submission.script_name, "bot.py");
    assert_eq!(submission.script, b"import requests\n");
    assert_eq!(submission.manifest, None);
    assert_eq!(submission.owner, OwnerContext::new("alice"));
    assert!(!submission.wait_for_manifest);
}

#[test]
fn explicit_name_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.py");
    let manifest = dir.path().join("requirements.txt");
    std::fs::write(&script, b"print(1)\n").unwrap();
    std::fs::write(&manifest, "requests==2.31\n").unwrap();

    let mut a = args(script);
    a.name = Some("weather-bot.py".into());
    a.manifest = Some(manifest);
    let submission = build_submission(&a).unwrap();
    assert_eq!(submission.script_name, "weather-bot.py");
    assert_eq!(submission.manifest.as_deref(), Some("requests==2.31\n"));
}

#[test]
fn missing_script_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.py");
    let err = build_submission(&args(path.clone())).unwrap_err();
    assert!(err.to_string().contains(&path.display().to_string()), "{err}");
}

#[test]
fn missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("bot.py");
    std::fs::write(&script, b"print(1)\n").unwrap();
    let mut a = args(script);
    a.manifest = Some(dir.path().join("nope.txt"));
    assert!(build_submission(&a).is_err());
}
