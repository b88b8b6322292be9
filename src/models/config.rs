use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// GitHub "latest release" endpoint of the modification package
pub const DEFAULT_RELEASE_API_URL: &str =
    "https://api.github.com/repos/valkcoder/Guildium/releases/latest";

/// Base URL release assets are served from (`<base>/<tag>/<artifact>`)
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://github.com/valkcoder/Guildium/releases/download";

pub const DEFAULT_ARTIFACT_NAME: &str = "guildium.asar";

/// GitHub rejects API requests without a User-Agent
pub const DEFAULT_USER_AGENT: &str = "Guildium-Installer";

/// Installer configuration from `Guildium Installer.yaml`
///
/// Every field has a default, so an empty or missing file yields a working
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub release: ReleaseSettings,
    pub network: NetworkSettings,
    pub process: ProcessSettings,
    pub paths: PathOverrides,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
    pub api_url: String,
    pub download_base_url: String,
    pub artifact_name: String,
    pub user_agent: String,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_RELEASE_API_URL.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ReleaseSettings {
    /// `<download_base_url>/<tag>/<artifact_name>`
    pub fn artifact_url(&self, tag: &str) -> String {
        format!(
            "{}/{}/{}",
            self.download_base_url.trim_end_matches('/'),
            tag,
            self.artifact_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub request_timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            max_redirects: 10,
        }
    }
}

impl NetworkSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    pub termination_timeout_secs: u64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            termination_timeout_secs: 15,
        }
    }
}

impl ProcessSettings {
    pub fn termination_timeout(&self) -> Duration {
        Duration::from_secs(self.termination_timeout_secs)
    }
}

/// Overrides for installs outside the platform's default location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOverrides {
    pub resources_dir: Option<Utf8PathBuf>,
    pub modification_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: String,
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            debug: false,
            console: true,
        }
    }
}

/// Problems found by [`InstallerConfig::validate`]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Setting {0} must not be empty")]
    Empty(&'static str),

    #[error("Setting {0} must be greater than zero")]
    Zero(&'static str),

    #[error("Artifact name {0:?} must be a plain file name")]
    InvalidArtifactName(String),
}

impl InstallerConfig {
    /// Reject settings the installer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let release = &self.release;
        if release.api_url.trim().is_empty() {
            return Err(ConfigError::Empty("release.api_url"));
        }
        if release.download_base_url.trim().is_empty() {
            return Err(ConfigError::Empty("release.download_base_url"));
        }
        if release.user_agent.trim().is_empty() {
            return Err(ConfigError::Empty("release.user_agent"));
        }
        if release.artifact_name.trim().is_empty() {
            return Err(ConfigError::Empty("release.artifact_name"));
        }
        if release.artifact_name.contains(['/', '\\']) || release.artifact_name == ".." {
            return Err(ConfigError::InvalidArtifactName(release.artifact_name.clone()));
        }
        if self.network.max_redirects == 0 {
            return Err(ConfigError::Zero("network.max_redirects"));
        }
        if self.network.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("network.request_timeout_secs"));
        }
        if self.process.termination_timeout_secs == 0 {
            return Err(ConfigError::Zero("process.termination_timeout_secs"));
        }
        Ok(())
    }
}
