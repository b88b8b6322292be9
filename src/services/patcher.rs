//! Installation patching: replaces Guilded's entrypoint with a shim that loads
//! the downloaded artifact and moves the original resources out of the way.
//!
//! Electron prefers `resources/app.asar` over `resources/app/`, so the original
//! packed resource (and its unpacked companion) is relocated into
//! `resources/_guilded/` and a minimal package is written to `resources/app/`.
//!
//! The two mutations touch disjoint subtrees and run concurrently. They are not
//! transactional with each other, but the relocation on its own moves both
//! entries or neither.

use crate::models::platform::{PACKED_RESOURCE_NAME, UNPACKED_RESOURCE_NAME};
use crate::models::PlatformProfile;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::io;
use thiserror::Error;

pub const ENTRYPOINT_FILE_NAME: &str = "index.js";
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Package name written into the shim manifest
pub const APPLICATION_PACKAGE_NAME: &str = "Guilded";

/// Errors that can occur while patching the installation
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to inspect {path}: {source}")]
    Inspect {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Relocate {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} not found; Guilded is already patched or is a version this installer does not recognize")]
    SourceMissing { path: Utf8PathBuf },

    #[error("Backup entry {path} already exists and would be overwritten")]
    BackupOccupied { path: Utf8PathBuf },

    #[error("Artifact path {0} cannot be made absolute")]
    InvalidArtifactPath(Utf8PathBuf),

    #[error("Failed to serialize shim: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of relocating the original resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Both entries were moved into the backup directory by this run
    Relocated,

    /// The backup already held both entries; nothing was moved
    AlreadyRelocated,
}

/// Result of a successful [`patch_installation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub entrypoint: Utf8PathBuf,
    pub manifest: Utf8PathBuf,
    pub relocation: RelocationOutcome,
}

#[derive(Serialize)]
struct ShimManifest<'a> {
    name: &'a str,
    main: &'a str,
}

/// Render a path with forward slashes regardless of the host separator.
pub fn normalize_path(path: &Utf8Path) -> String {
    path.as_str().replace('\\', "/")
}

/// Source of the shim entrypoint: a single `require` of the artifact.
///
/// `artifact` must be absolute; the path literal is JSON-escaped, which is
/// also a valid JavaScript string literal.
pub fn entrypoint_source(artifact: &Utf8Path) -> Result<String, PatchError> {
    let literal = serde_json::to_string(&normalize_path(artifact))?;
    Ok(format!("require({});", literal))
}

/// Contents of the shim `package.json`
pub fn manifest_source() -> Result<String, PatchError> {
    Ok(serde_json::to_string(&ShimManifest {
        name: APPLICATION_PACKAGE_NAME,
        main: ENTRYPOINT_FILE_NAME,
    })?)
}

fn absolute_artifact_path(artifact: &Utf8Path) -> Result<Utf8PathBuf, PatchError> {
    if artifact.is_absolute() {
        return Ok(artifact.to_path_buf());
    }
    std::path::absolute(artifact)
        .ok()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .ok_or_else(|| PatchError::InvalidArtifactPath(artifact.to_path_buf()))
}

/// Create `resources/app/` and write the entrypoint shim and manifest into it.
///
/// Idempotent: rerunning rewrites identical contents.
pub async fn write_entrypoint_shim(
    profile: &PlatformProfile,
    artifact: &Utf8Path,
) -> Result<(Utf8PathBuf, Utf8PathBuf), PatchError> {
    let app_dir = profile.application_dir();
    tokio::fs::create_dir_all(app_dir)
        .await
        .map_err(|source| PatchError::CreateDirectory {
            path: app_dir.to_path_buf(),
            source,
        })?;

    let artifact = absolute_artifact_path(artifact)?;
    let entrypoint = app_dir.join(ENTRYPOINT_FILE_NAME);
    write_file(&entrypoint, entrypoint_source(&artifact)?).await?;

    let manifest = app_dir.join(MANIFEST_FILE_NAME);
    write_file(&manifest, manifest_source()?).await?;

    tracing::info!("Wrote entrypoint shim {} -> {}", entrypoint, artifact);
    Ok((entrypoint, manifest))
}

async fn write_file(path: &Utf8Path, contents: String) -> Result<(), PatchError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| PatchError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
}

async fn exists(path: &Utf8Path) -> Result<bool, PatchError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| PatchError::Inspect {
            path: path.to_path_buf(),
            source,
        })
}

/// Move `app.asar` and `app.asar.unpacked` into `resources/_guilded/`.
///
/// All preconditions are checked before anything is touched:
/// - both originals present and neither in the backup: move both
/// - both originals absent and both in the backup: already patched, no change
/// - anything else: [`PatchError::BackupOccupied`] or [`PatchError::SourceMissing`]
///
/// If the second move fails the first one is undone, so the backup never holds
/// just one of the two entries.
pub async fn relocate_original_resources(
    profile: &PlatformProfile,
) -> Result<RelocationOutcome, PatchError> {
    let resources = profile.resources_dir();
    let backup = profile.backup_dir();

    let mut moves = Vec::with_capacity(2);
    for name in [PACKED_RESOURCE_NAME, UNPACKED_RESOURCE_NAME] {
        let from = resources.join(name);
        let to = backup.join(name);
        let source_present = exists(&from).await?;
        let backup_present = exists(&to).await?;
        moves.push((from, to, source_present, backup_present));
    }

    if moves.iter().all(|(_, _, source, backup)| !source && *backup) {
        tracing::info!("Original resources already relocated to {}", backup);
        return Ok(RelocationOutcome::AlreadyRelocated);
    }

    for (from, to, source_present, backup_present) in &moves {
        if *source_present && *backup_present {
            return Err(PatchError::BackupOccupied { path: to.clone() });
        }
        if !source_present {
            return Err(PatchError::SourceMissing { path: from.clone() });
        }
    }

    tokio::fs::create_dir_all(&backup)
        .await
        .map_err(|source| PatchError::CreateDirectory {
            path: backup.clone(),
            source,
        })?;

    let mut moved: Vec<(&Utf8PathBuf, &Utf8PathBuf)> = Vec::with_capacity(moves.len());
    for (from, to, _, _) in &moves {
        if let Err(source) = tokio::fs::rename(from, to).await {
            undo_moves(&moved).await;
            return Err(PatchError::Relocate {
                from: from.clone(),
                to: to.clone(),
                source,
            });
        }
        tracing::debug!("Moved {} -> {}", from, to);
        moved.push((from, to));
    }

    tracing::info!("Relocated original resources to {}", backup);
    Ok(RelocationOutcome::Relocated)
}

async fn undo_moves(moved: &[(&Utf8PathBuf, &Utf8PathBuf)]) {
    for (from, to) in moved.iter().rev() {
        match tokio::fs::rename(to, from).await {
            Ok(()) => tracing::warn!("Rolled back move of {} to {}", from, to),
            Err(e) => tracing::error!(
                "Failed to roll back {} to {}: {}; restore it manually",
                to,
                from,
                e
            ),
        }
    }
}

/// Write the shim and relocate the original resources concurrently.
///
/// Both steps always run to completion, so a failing shim write can never
/// interrupt the relocation between its two moves. Succeeds only when both
/// steps succeed; otherwise the shim error is returned first.
pub async fn patch_installation(
    profile: &PlatformProfile,
    artifact: &Utf8Path,
) -> Result<PatchOutcome, PatchError> {
    let (shim, relocation) = tokio::join!(
        write_entrypoint_shim(profile, artifact),
        relocate_original_resources(profile)
    );

    if let (Err(_), Ok(outcome)) = (&shim, &relocation) {
        tracing::warn!("Shim write failed after relocation finished ({:?})", outcome);
    }
    let (entrypoint, manifest) = shim?;
    let relocation = relocation?;

    Ok(PatchOutcome {
        entrypoint,
        manifest,
        relocation,
    })
}
