use crate::metrics::Metrics;
use crate::models::{InstallStage, InstallerConfig, PlatformError, PlatformProfile};
use crate::services::download::{DownloadError, download_file};
use crate::services::http::{build_api_client, build_download_client};
use crate::services::patcher::{PatchError, RelocationOutcome, patch_installation};
use crate::services::platform::detect_profile;
use crate::services::process::{TerminationOutcome, terminate_application};
use crate::services::release::{ReleaseLookupError, fetch_latest_release_tag};
use crate::state::InstallStateManager;
use camino::{Utf8Path, Utf8PathBuf};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Any fatal failure of an installer run
#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    ReleaseLookup(#[from] ReleaseLookupError),

    #[error("Failed to create {path}: {source}")]
    PrepareDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub tag: String,
    pub artifact: Utf8PathBuf,
    pub bytes_written: u64,
    pub termination: TerminationOutcome,
    pub relocation: RelocationOutcome,
}

/// Runs the installation sequence against one [`PlatformProfile`].
///
/// Stages run strictly in order and the first fatal error ends the run:
/// 1. close Guilded (never fatal)
/// 2. look up the latest release tag
/// 3. create the modification directory and download the artifact into it
/// 4. write the entrypoint shim and relocate the original resources
pub struct Installer {
    profile: PlatformProfile,
    config: InstallerConfig,
    api_client: Client,
    download_client: Client,
    state: InstallStateManager,
    metrics: Arc<Metrics>,
}

impl Installer {
    pub fn new(profile: PlatformProfile, config: InstallerConfig) -> Result<Self, InstallError> {
        let api_client = build_api_client(&config.release, &config.network)
            .map_err(InstallError::HttpClient)?;
        let download_client = build_download_client(&config.release, &config.network)
            .map_err(InstallError::HttpClient)?;

        Ok(Self {
            profile,
            config,
            api_client,
            download_client,
            state: InstallStateManager::new(),
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Installer for the running host, with `config.paths` overrides applied.
    pub fn for_host(config: InstallerConfig) -> Result<Self, InstallError> {
        let profile = detect_profile(&config.paths)?;
        Self::new(profile, config)
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    /// Handle to the run state; clone it to follow progress from another task.
    pub fn state(&self) -> &InstallStateManager {
        &self.state
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Run every stage once. On failure the state moves to
    /// [`InstallStage::Failed`] and the error is returned.
    pub async fn run(&self) -> Result<InstallReport, InstallError> {
        match self.run_stages().await {
            Ok(report) => {
                self.state.complete();
                tracing::info!("Guilded installation modified successfully!");
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Installation failed: {}", e);
                self.state.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_stages(&self) -> Result<InstallReport, InstallError> {
        let termination = self.terminate().await;
        let tag = self.locate_release().await?;
        let (artifact, bytes_written) = self.download(&tag).await?;
        let relocation = self.patch(&artifact).await?;

        Ok(InstallReport {
            tag,
            artifact,
            bytes_written,
            termination,
            relocation,
        })
    }

    async fn terminate(&self) -> TerminationOutcome {
        self.state.enter_stage(InstallStage::Terminating);
        let start = Instant::now();

        let outcome = terminate_application(
            &self.profile,
            self.config.process.termination_timeout(),
        )
        .await;

        if let TerminationOutcome::NotTerminated { reason } = &outcome {
            self.state
                .add_warning(format!("Could not close Guilded: {}", reason));
        }

        self.metrics
            .record_stage_time(InstallStage::Terminating, start.elapsed());
        outcome
    }

    async fn locate_release(&self) -> Result<String, InstallError> {
        self.state.enter_stage(InstallStage::LocatingRelease);
        let start = Instant::now();

        let tag = fetch_latest_release_tag(&self.api_client, &self.config.release.api_url).await;

        self.metrics
            .record_stage_time(InstallStage::LocatingRelease, start.elapsed());

        let tag = tag?;
        self.state.record_release(&tag);
        Ok(tag)
    }

    async fn download(&self, tag: &str) -> Result<(Utf8PathBuf, u64), InstallError> {
        self.state.enter_stage(InstallStage::Downloading);
        let start = Instant::now();

        let modification_dir = self.profile.modification_dir();
        tokio::fs::create_dir_all(modification_dir)
            .await
            .map_err(|source| InstallError::PrepareDirectory {
                path: modification_dir.to_path_buf(),
                source,
            })?;

        let url = self.config.release.artifact_url(tag);
        let destination = self
            .profile
            .artifact_path(&self.config.release.artifact_name);

        tracing::info!(
            "Downloading {} from {}...",
            self.config.release.artifact_name,
            url
        );

        let outcome = download_file(
            &self.download_client,
            &url,
            &destination,
            self.config.network.max_redirects,
        )
        .await;

        self.metrics
            .record_stage_time(InstallStage::Downloading, start.elapsed());

        let outcome = outcome?;
        self.metrics
            .record_download(outcome.bytes_written, outcome.redirects_followed);
        self.state
            .record_download(outcome.path.clone(), outcome.bytes_written);

        tracing::info!("Download completed, proceeding to modify Guilded...");
        Ok((outcome.path, outcome.bytes_written))
    }

    async fn patch(&self, artifact: &Utf8Path) -> Result<RelocationOutcome, InstallError> {
        self.state.enter_stage(InstallStage::Patching);
        let start = Instant::now();

        let outcome = patch_installation(&self.profile, artifact).await;

        self.metrics
            .record_stage_time(InstallStage::Patching, start.elapsed());

        let outcome = outcome?;
        if outcome.relocation == RelocationOutcome::Relocated {
            self.metrics.record_relocated(2);
        }
        Ok(outcome.relocation)
    }
}
