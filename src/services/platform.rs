//! Platform resolution: maps the host operating system to a [`PlatformProfile`].
//!
//! Roots are taken from the environment wherever the host provides one:
//!
//! | Platform | Resources directory | Modification directory |
//! |----------|---------------------|------------------------|
//! | Windows  | `%LOCALAPPDATA%\Programs\Guilded\Resources` | `%ProgramFiles%\Guildium` |
//! | macOS    | `/Applications/Guilded.app/Contents/Resources` | `$HOME/Library/Application Support/Guildium` |
//! | Linux    | `/opt/Guilded/resources` | `$XDG_DATA_HOME/Guildium` or `$HOME/.local/share/Guildium` |
//!
//! The environment is passed in as a lookup function so profiles for every
//! platform can be resolved (and tested) from any host.

use crate::models::platform::{HostPlatform, PlatformError, PlatformProfile, TerminationCommand};
use crate::models::PathOverrides;
use camino::Utf8PathBuf;

/// Directory name of the modification package on every platform
pub const MODIFICATION_DIR_NAME: &str = "Guildium";

const MACOS_RESOURCES_DIR: &str = "/Applications/Guilded.app/Contents/Resources";
const LINUX_RESOURCES_DIR: &str = "/opt/Guilded/resources";

/// Resolve the profile for `platform`, reading roots through `env`.
///
/// # Errors
///
/// [`PlatformError::MissingEnvironment`] if a root variable the platform
/// needs is unset or empty.
pub fn resolve_profile<F>(platform: HostPlatform, env: F) -> Result<PlatformProfile, PlatformError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |variable: &'static str| -> Result<Utf8PathBuf, PlatformError> {
        env(variable)
            .filter(|value| !value.is_empty())
            .map(Utf8PathBuf::from)
            .ok_or(PlatformError::MissingEnvironment { platform, variable })
    };

    let profile = match platform {
        HostPlatform::Windows => {
            let local_app_data = require("LOCALAPPDATA")?;
            let program_files = require("ProgramFiles")?;
            PlatformProfile::new(
                platform,
                "Guilded.exe",
                TerminationCommand::new("taskkill", ["/F", "/IM", "Guilded.exe", "/T"]),
                local_app_data.join("Programs").join("Guilded").join("Resources"),
                program_files.join(MODIFICATION_DIR_NAME),
            )
        }
        HostPlatform::MacOs => {
            let home = require("HOME")?;
            PlatformProfile::new(
                platform,
                "Guilded",
                TerminationCommand::new("pkill", ["-x", "Guilded"]),
                Utf8PathBuf::from(MACOS_RESOURCES_DIR),
                home.join("Library")
                    .join("Application Support")
                    .join(MODIFICATION_DIR_NAME),
            )
        }
        HostPlatform::Linux => {
            let data_home = match env("XDG_DATA_HOME").filter(|value| !value.is_empty()) {
                Some(dir) => Utf8PathBuf::from(dir),
                None => require("HOME")?.join(".local").join("share"),
            };
            PlatformProfile::new(
                platform,
                "guilded",
                TerminationCommand::new("pkill", ["-x", "guilded"]),
                Utf8PathBuf::from(LINUX_RESOURCES_DIR),
                data_home.join(MODIFICATION_DIR_NAME),
            )
        }
    };

    tracing::debug!(
        "Resolved {} profile: resources={}, modification={}",
        platform,
        profile.resources_dir(),
        profile.modification_dir()
    );

    Ok(profile)
}

/// Resolve the profile for an operating-system identifier such as
/// `std::env::consts::OS`.
pub fn resolve_profile_for_os<F>(os: &str, env: F) -> Result<PlatformProfile, PlatformError>
where
    F: Fn(&str) -> Option<String>,
{
    let platform: HostPlatform = os.parse()?;
    resolve_profile(platform, env)
}

/// Resolve the profile for the running host from the process environment and
/// apply any configured path overrides.
pub fn detect_profile(overrides: &PathOverrides) -> Result<PlatformProfile, PlatformError> {
    let platform = HostPlatform::current()?;
    let profile = resolve_profile(platform, |key| std::env::var(key).ok())?;

    if overrides.resources_dir.is_some() || overrides.modification_dir.is_some() {
        tracing::info!("Applying configured path overrides");
    }

    Ok(profile.with_overrides(
        overrides.resources_dir.as_deref(),
        overrides.modification_dir.as_deref(),
    ))
}
