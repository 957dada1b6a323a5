// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SCRIPT: &str = "import os\nimport requests\nfrom yaml import safe_load\n";

#[test]
fn manifest_overrides_discovery() {
    let packages = resolve_packages(SCRIPT, Some("flask==3.0\n# web\n"), true);
    assert_eq!(packages, vec!["flask==3.0"]);
}

#[test]
fn discovery_runs_without_manifest() {
    let packages = resolve_packages(SCRIPT, None, true);
    assert_eq!(packages, vec!["requests", "PyYAML"]);
}

#[test]
fn auto_install_off_skips_discovery_but_honours_manifest() {
    assert!(resolve_packages(SCRIPT, None, false).is_empty());
    assert_eq!(resolve_packages(SCRIPT, Some("requests"), false), vec!["requests"]);
}

#[test]
fn empty_manifest_means_no_packages() {
    assert!(resolve_packages(SCRIPT, Some("# nothing\n\n"), true).is_empty());
}

#[test]
fn install_failed_names_packages() {
    let err = ProvisionError::InstallFailed {
        packages: vec!["a".into(), "b".into()],
        output: String::new(),
    };
    assert_eq!(err.to_string(), "failed to install packages: a, b");
}

#[tokio::test]
async fn venv_disabled_uses_shared_interpreter_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = VenvProvisioner::new(
        ProvisionConfig::default().python("sh").use_venv(false).auto_install(false),
    );
    let out = provisioner
        .provision(ProvisionRequest {
            script: "import requests\n".into(),
            manifest: None,
            root: dir.path().join("env"),
        })
        .await
        .unwrap();
    assert!(!out.handle.isolated);
    assert!(out.handle.interpreter.is_absolute());
    assert!(out.handle.packages.is_empty());
    assert_eq!(out.warnings.len(), 1);
    assert!(!dir.path().join("env").exists());
}

#[tokio::test]
async fn venv_failure_falls_back_to_shared() {
    let dir = tempfile::tempdir().unwrap();
    // `false` accepts `-m venv <root>` and exits 1 like a python without venv
    let provisioner =
        VenvProvisioner::new(ProvisionConfig::default().python("false").auto_install(false));
    let out = provisioner
        .provision(ProvisionRequest {
            script: String::new(),
            manifest: None,
            root: dir.path().join("env"),
        })
        .await
        .unwrap();
    assert!(!out.handle.isolated);
    assert!(out.warnings[0].contains("without isolation"), "{:?}", out.warnings);
}

#[tokio::test]
async fn shared_release_is_a_noop() {
    let provisioner = VenvProvisioner::new(ProvisionConfig::default());
    provisioner.release(&EnvironmentHandle::shared("/usr/bin/python3")).await.unwrap();
}

#[tokio::test]
async fn fake_reports_failing_packages() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeProvisioner::new("/bin/sh").failing(["nopenope-pkg"]);
    let err = fake
        .provision(ProvisionRequest {
            script: String::new(),
            manifest: Some("requests\nnopenope-pkg\n".into()),
            root: dir.path().join("env"),
        })
        .await
        .unwrap_err();
    match err {
        ProvisionError::InstallFailed { packages, .. } => assert_eq!(packages, vec!["nopenope-pkg"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fake.provision_count(), 1);
}

#[tokio::test]
async fn fake_counts_releases_per_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("env");
    let fake = FakeProvisioner::new("/bin/sh");
    let out = fake
        .provision(ProvisionRequest { script: String::new(), manifest: None, root: root.clone() })
        .await
        .unwrap();
    assert!(root.is_dir());
    fake.release(&out.handle).await.unwrap();
    assert_eq!(fake.release_count(&root), 1);
    assert!(!root.exists());
}
