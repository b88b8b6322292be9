//! Guildium Installer
//!
//! Closes Guilded, downloads the latest Guildium release and patches the
//! Guilded installation so it loads Guildium on its next start.
//!
//! # Execution Flow
//!
//! 1. Load `Guildium Data/Guildium Installer.yaml` if present, else defaults
//! 2. Initialize logging → `logs/guildium-installer.<date>` plus console
//! 3. Create a tokio runtime with 2 worker threads
//! 4. Resolve the platform profile for the host OS
//! 5. Run the installer stages in order; stop at the first fatal error
//!
//! The process exits non-zero if any fatal stage fails.

use anyhow::{Context, Result};
use guildium_installer::{APP_NAME, ConfigManager, Installer, VERSION};

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("Guildium Data");
    let config = config_manager.load_config()?;

    let _log_guard = guildium_installer::logging::setup_logging(&config.logging, APP_NAME)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if config_manager.has_config_file() {
        tracing::info!("Loaded configuration from {}", config_manager.config_path());
    } else {
        tracing::info!(
            "No configuration at {}, using defaults",
            config_manager.config_path()
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("guildium-worker")
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(async {
        let installer = match Installer::for_host(config) {
            Ok(installer) => installer,
            Err(e) => {
                tracing::error!("Could not prepare the installer: {}", e);
                return Err(e);
            }
        };
        let profile = installer.profile();
        tracing::info!(
            "Platform {}: resources={}, modification={}",
            profile.platform(),
            profile.resources_dir(),
            profile.modification_dir()
        );

        let outcome = installer.run().await;
        installer.metrics().log_summary();
        outcome
    });

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    match result {
        Ok(report) => {
            tracing::info!(
                "Installed Guildium {} ({} bytes) at {}",
                report.tag,
                report.bytes_written,
                report.artifact
            );
            Ok(())
        }
        // Already logged by the installer
        Err(e) => Err(anyhow::Error::new(e).context("Guildium installation failed")),
    }
}
