use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of the backup directory the original resources are relocated into.
pub const BACKUP_DIR_NAME: &str = "_guilded";

/// Packed application resource shipped by Electron.
pub const PACKED_RESOURCE_NAME: &str = "app.asar";

/// Unpacked companion tree of [`PACKED_RESOURCE_NAME`].
pub const UNPACKED_RESOURCE_NAME: &str = "app.asar.unpacked";

/// Directory (under the resources directory) Electron loads when no `app.asar` is present.
pub const APPLICATION_DIR_NAME: &str = "app";

/// Operating systems the installer knows how to patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPlatform {
    Windows,
    MacOs,
    Linux,
}

/// Errors raised while resolving the platform profile
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Environment variable {variable} is required on {platform} but is not set")]
    MissingEnvironment {
        platform: HostPlatform,
        variable: &'static str,
    },
}

impl HostPlatform {
    /// All supported platforms
    pub const ALL: [HostPlatform; 3] = [HostPlatform::Windows, HostPlatform::MacOs, HostPlatform::Linux];

    /// Detect the platform this binary was compiled for.
    pub fn current() -> Result<Self, PlatformError> {
        std::env::consts::OS.parse()
    }

    /// The identifier used by `std::env::consts::OS`
    pub fn as_str(&self) -> &'static str {
        match self {
            HostPlatform::Windows => "windows",
            HostPlatform::MacOs => "macos",
            HostPlatform::Linux => "linux",
        }
    }
}

impl FromStr for HostPlatform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" => Ok(HostPlatform::Windows),
            "macos" => Ok(HostPlatform::MacOs),
            "linux" => Ok(HostPlatform::Linux),
            other => Err(PlatformError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External command used to stop the running application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TerminationCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for TerminationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Resolved filesystem locations and process control for one operating system.
///
/// Built once at startup and never mutated; every installer component borrows it.
/// The application directory is always derived from the resources directory, so
/// `application_dir() == resources_dir().join("app")` holds for every instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    platform: HostPlatform,
    process_name: String,
    termination_command: TerminationCommand,
    resources_dir: Utf8PathBuf,
    application_dir: Utf8PathBuf,
    modification_dir: Utf8PathBuf,
}

impl PlatformProfile {
    pub fn new(
        platform: HostPlatform,
        process_name: impl Into<String>,
        termination_command: TerminationCommand,
        resources_dir: Utf8PathBuf,
        modification_dir: Utf8PathBuf,
    ) -> Self {
        Self {
            platform,
            process_name: process_name.into(),
            termination_command,
            application_dir: resources_dir.join(APPLICATION_DIR_NAME),
            resources_dir,
            modification_dir,
        }
    }

    /// Copy of this profile with the resources and/or modification directory replaced.
    pub fn with_overrides(
        &self,
        resources_dir: Option<&Utf8Path>,
        modification_dir: Option<&Utf8Path>,
    ) -> Self {
        Self::new(
            self.platform,
            self.process_name.clone(),
            self.termination_command.clone(),
            resources_dir.map_or_else(|| self.resources_dir.clone(), Utf8Path::to_path_buf),
            modification_dir.map_or_else(|| self.modification_dir.clone(), Utf8Path::to_path_buf),
        )
    }

    /// Copy of this profile using a different termination command.
    pub fn with_termination_command(&self, command: TerminationCommand) -> Self {
        Self {
            termination_command: command,
            ..self.clone()
        }
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn termination_command(&self) -> &TerminationCommand {
        &self.termination_command
    }

    pub fn resources_dir(&self) -> &Utf8Path {
        &self.resources_dir
    }

    pub fn application_dir(&self) -> &Utf8Path {
        &self.application_dir
    }

    pub fn modification_dir(&self) -> &Utf8Path {
        &self.modification_dir
    }

    /// `resources/_guilded`
    pub fn backup_dir(&self) -> Utf8PathBuf {
        self.resources_dir.join(BACKUP_DIR_NAME)
    }

    /// Location of the downloaded artifact inside the modification directory
    pub fn artifact_path(&self, artifact_name: &str) -> Utf8PathBuf {
        self.modification_dir.join(artifact_name)
    }
}
