// Guildium Installer - installs the Guildium modification into Guilded
//
// This is the library crate containing the installation pipeline and data structures.
// The binary crate (main.rs) runs the pipeline once and exits.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{HostPlatform, InstallStage, InstallState, InstallerConfig, PlatformProfile};
pub use services::{InstallError, InstallReport, Installer};
pub use state::{InstallStateManager, StateChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
