//! Services module - the installation pipeline.
//!
//! Each stage is a free function taking the immutable [`PlatformProfile`]
//! (or the pieces of it it needs) as an explicit argument:
//!
//! - [`platform`]: resolve the [`PlatformProfile`] for the host OS
//! - [`process`]: best-effort termination of running Guilded processes
//! - [`release`]: look up the latest release tag on GitHub
//! - [`download`]: stream the release artifact to disk, following redirects
//! - [`patcher`]: write the entrypoint shim and relocate the original resources
//! - [`installer`]: the [`Installer`] that runs the stages in order
//!
//! All I/O is async on tokio. The only concurrency is inside the patcher,
//! whose two filesystem mutations touch disjoint subtrees and are joined
//! before the stage completes.
//!
//! ```ignore
//! use guildium_installer::services::{Installer, detect_profile};
//!
//! let profile = detect_profile(&config.paths)?;
//! let report = Installer::new(profile, config)?.run().await?;
//! println!("Installed {}", report.tag);
//! ```
//!
//! [`PlatformProfile`]: crate::models::PlatformProfile

pub mod download;
pub mod http;
pub mod installer;
pub mod patcher;
pub mod platform;
pub mod process;
pub mod release;

pub use download::{DownloadError, DownloadOutcome, DownloadTarget, download_file};
pub use installer::{InstallError, InstallReport, Installer};
pub use patcher::{
    PatchError, PatchOutcome, RelocationOutcome, patch_installation, relocate_original_resources,
    write_entrypoint_shim,
};
pub use platform::{detect_profile, resolve_profile, resolve_profile_for_os};
pub use process::{TerminationOutcome, terminate_application};
pub use release::{ReleaseLookupError, fetch_latest_release_tag, parse_release_tag};
