//! Integration tests for patching a Guilded installation on disk
//!
//! These tests verify:
//! - A fresh install gets the shim and its originals moved to `_guilded/`
//! - A second run is a no-op for the relocation and rewrites the same shim
//! - Half-patched or unrecognized layouts are rejected without moving anything
//! - The backup always ends up holding both originals or neither, even when the
//!   shim write or the second move fails
//! - The shim references the artifact with forward slashes

mod common;

use camino::{Utf8Path, Utf8PathBuf};
use common::{ORIGINAL_ASAR, create_guilded_resources, utf8_temp_dir};
use guildium_installer::models::{HostPlatform, PlatformProfile, TerminationCommand};
use guildium_installer::services::{
    PatchError, RelocationOutcome, patch_installation, relocate_original_resources,
    write_entrypoint_shim,
};
use std::fs;
use tokio_test::{assert_err, assert_ok};

fn test_profile(root: &Utf8Path) -> PlatformProfile {
    PlatformProfile::new(
        HostPlatform::Linux,
        "guilded",
        TerminationCommand::new("pkill", ["-x", "guilded"]),
        root.join("resources"),
        root.join("Guildium"),
    )
}

fn artifact(profile: &PlatformProfile) -> Utf8PathBuf {
    let artifact = profile.artifact_path("guildium.asar");
    fs::create_dir_all(profile.modification_dir()).unwrap();
    fs::write(&artifact, b"guildium").unwrap();
    artifact
}

#[tokio::test]
async fn test_fresh_installation_patched() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);
    create_guilded_resources(profile.resources_dir());
    let artifact = artifact(&profile);

    let outcome = assert_ok!(patch_installation(&profile, &artifact).await);

    assert_eq!(outcome.relocation, RelocationOutcome::Relocated);
    assert_eq!(outcome.entrypoint, profile.application_dir().join("index.js"));
    assert_eq!(outcome.manifest, profile.application_dir().join("package.json"));

    let index = fs::read_to_string(&outcome.entrypoint).unwrap();
    assert_eq!(index, format!("require(\"{}\");", artifact.as_str().replace('\\', "/")));
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.manifest).unwrap()).unwrap();
    assert_eq!(manifest["name"], "Guilded");
    assert_eq!(manifest["main"], "index.js");

    let backup = profile.backup_dir();
    assert!(!profile.resources_dir().join("app.asar").exists());
    assert!(!profile.resources_dir().join("app.asar.unpacked").exists());
    assert_eq!(fs::read(backup.join("app.asar")).unwrap(), ORIGINAL_ASAR);
    assert!(
        backup
            .join("app.asar.unpacked")
            .join("native")
            .join("module.node")
            .exists()
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);
    create_guilded_resources(profile.resources_dir());
    let artifact = artifact(&profile);

    let first = patch_installation(&profile, &artifact).await.unwrap();
    let first_index = fs::read_to_string(&first.entrypoint).unwrap();

    let second = patch_installation(&profile, &artifact).await.unwrap();

    assert_eq!(second.relocation, RelocationOutcome::AlreadyRelocated);
    assert_eq!(fs::read_to_string(&second.entrypoint).unwrap(), first_index);
    assert_eq!(fs::read(profile.backup_dir().join("app.asar")).unwrap(), ORIGINAL_ASAR);
}

#[tokio::test]
async fn test_missing_originals_rejected() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);
    fs::create_dir_all(profile.resources_dir()).unwrap();

    let err = assert_err!(relocate_original_resources(&profile).await);

    match err {
        PatchError::SourceMissing { path } => {
            assert_eq!(path, profile.resources_dir().join("app.asar"))
        }
        other => panic!("expected missing source, got {:?}", other),
    }
    assert!(!profile.backup_dir().exists());
}

#[tokio::test]
async fn test_partial_layout_moves_nothing() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);
    create_guilded_resources(profile.resources_dir());
    fs::remove_dir_all(profile.resources_dir().join("app.asar.unpacked")).unwrap();

    let result = relocate_original_resources(&profile).await;

    assert!(matches!(result, Err(PatchError::SourceMissing { .. })));
    assert_eq!(
        fs::read(profile.resources_dir().join("app.asar")).unwrap(),
        ORIGINAL_ASAR
    );
    assert!(!profile.backup_dir().exists());
}

#[tokio::test]
async fn test_occupied_backup_rejected() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);
    create_guilded_resources(profile.resources_dir());
    // Guilded updated itself after an earlier patch: fresh originals and an old backup
    fs::create_dir_all(profile.backup_dir()).unwrap();
    fs::write(profile.backup_dir().join("app.asar"), b"older backup").unwrap();

    let result = relocate_original_resources(&profile).await;

    match result {
        Err(PatchError::BackupOccupied { path }) => {
            assert_eq!(path, profile.backup_dir().join("app.asar"))
        }
        other => panic!("expected occupied backup, got {:?}", other),
    }
    assert_eq!(
        fs::read(profile.backup_dir().join("app.asar")).unwrap(),
        b"older backup"
    );
    assert!(profile.resources_dir().join("app.asar.unpacked").exists());
}

#[tokio::test]
async fn test_shim_uses_forward_slashes() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);

    let (entrypoint, _) = write_entrypoint_shim(&profile, &root.join("Guildium").join("guildium.asar"))
        .await
        .unwrap();

    let index = fs::read_to_string(entrypoint).unwrap();
    assert!(index.starts_with("require(\""));
    assert!(index.ends_with("guildium.asar\");"));
    assert!(!index.contains('\\'));
}

fn backup_entries(profile: &PlatformProfile) -> (bool, bool) {
    let backup = profile.backup_dir();
    (
        backup.join("app.asar").exists(),
        backup.join("app.asar.unpacked").exists(),
    )
}

#[tokio::test]
async fn test_shim_failure_does_not_split_backup() {
    for _ in 0..25 {
        let (_temp_dir, root) = utf8_temp_dir();
        let profile = test_profile(&root);
        create_guilded_resources(profile.resources_dir());
        let artifact = artifact(&profile);
        // A directory where the manifest goes makes the shim write fail
        fs::create_dir_all(profile.application_dir().join("package.json")).unwrap();

        let result = patch_installation(&profile, &artifact).await;

        match result {
            Err(PatchError::WriteFile { path, .. }) => {
                assert_eq!(path, profile.application_dir().join("package.json"))
            }
            other => panic!("expected shim write error, got {:?}", other),
        }
        // The relocation still ran to completion
        assert_eq!(backup_entries(&profile), (true, true));
        assert!(!profile.resources_dir().join("app.asar").exists());
        assert!(!profile.resources_dir().join("app.asar.unpacked").exists());
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_second_move_restores_first() {
    let (_temp_dir, root) = utf8_temp_dir();
    let profile = test_profile(&root);
    create_guilded_resources(profile.resources_dir());
    // A dangling symlink passes the existence check but cannot be replaced by a directory
    fs::create_dir_all(profile.backup_dir()).unwrap();
    std::os::unix::fs::symlink(
        root.join("nowhere"),
        profile.backup_dir().join("app.asar.unpacked"),
    )
    .unwrap();

    let result = relocate_original_resources(&profile).await;

    match result {
        Err(PatchError::Relocate { from, .. }) => {
            assert_eq!(from, profile.resources_dir().join("app.asar.unpacked"))
        }
        other => panic!("expected failed move, got {:?}", other),
    }
    assert_eq!(
        fs::read(profile.resources_dir().join("app.asar")).unwrap(),
        ORIGINAL_ASAR
    );
    assert!(!profile.backup_dir().join("app.asar").exists());
    assert!(
        profile
            .resources_dir()
            .join("app.asar.unpacked")
            .join("native")
            .join("module.node")
            .exists()
    );
}
