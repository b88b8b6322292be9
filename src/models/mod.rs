//! Data models for the Guildium installer.
//!
//! - [`PlatformProfile`]: resolved paths and termination command for the host OS
//! - [`InstallerConfig`]: settings loaded from `Guildium Installer.yaml`
//! - [`InstallState`]: progress of the current run, owned by
//!   [`InstallStateManager`](crate::state::InstallStateManager)

pub mod config;
pub mod install_state;
pub mod platform;

pub use config::{
    ConfigError, InstallerConfig, LoggingSettings, NetworkSettings, PathOverrides,
    ProcessSettings, ReleaseSettings,
};
pub use install_state::{InstallStage, InstallState};
pub use platform::{HostPlatform, PlatformError, PlatformProfile, TerminationCommand};
