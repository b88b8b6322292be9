use crate::models::InstallerConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// File name of the installer configuration inside the config directory
pub const CONFIG_FILE_NAME: &str = "Guildium Installer.yaml";

/// Prefix of environment variables that override file settings,
/// e.g. `GUILDIUM_NETWORK__MAX_REDIRECTS=5`
pub const ENV_PREFIX: &str = "GUILDIUM";

/// Configuration manager for loading and saving the installer configuration.
///
/// Settings are layered: built-in defaults, then `Guildium Installer.yaml`
/// (optional), then `GUILDIUM_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager rooted at `config_dir`.
    ///
    /// Nothing is created on disk until [`save_config`](Self::save_config).
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        }
    }

    /// Whether `Guildium Installer.yaml` exists
    pub fn has_config_file(&self) -> bool {
        self.config_path.exists()
    }

    /// Load the configuration, falling back to defaults for anything not set.
    ///
    /// Runs before logging is set up, so it does not log; callers report the
    /// source with [`has_config_file`](Self::has_config_file).
    pub fn load_config(&self) -> Result<InstallerConfig> {
        let settings = Config::builder()
            .add_source(File::new(self.config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read installer config: {}", self.config_path))?;

        let config: InstallerConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse installer config: {}", self.config_path))?;

        config.validate().with_context(|| {
            format!("Invalid installer config: {}", self.config_path)
        })?;

        Ok(config)
    }

    /// Save the configuration as YAML, creating the config directory if needed.
    pub fn save_config(&self, config: &InstallerConfig) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).with_context(|| {
                format!("Failed to create config directory: {}", self.config_dir)
            })?;
        }

        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize installer config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write installer config: {}", self.config_path))?;

        tracing::info!("Saved installer config to {}", self.config_path);
        Ok(())
    }

    /// Write a default configuration template if none exists yet.
    ///
    /// Returns `true` when a new file was written.
    pub fn ensure_default_config(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }
        self.save_config(&InstallerConfig::default())?;
        Ok(true)
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
