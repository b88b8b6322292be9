use camino::Utf8PathBuf;
use std::fmt;

/// Stage of an installer run. Stages only ever advance in declaration order,
/// except that any stage may move to [`InstallStage::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum InstallStage {
    #[default]
    Pending,
    Terminating,
    LocatingRelease,
    Downloading,
    Patching,
    Completed,
    Failed,
}

impl InstallStage {
    pub fn is_finished(&self) -> bool {
        matches!(self, InstallStage::Completed | InstallStage::Failed)
    }

    /// Human readable description used for progress logging
    pub fn description(&self) -> &'static str {
        match self {
            InstallStage::Pending => "Waiting to start",
            InstallStage::Terminating => "Closing Guilded",
            InstallStage::LocatingRelease => "Looking up the latest Guildium release",
            InstallStage::Downloading => "Downloading Guildium",
            InstallStage::Patching => "Patching Guilded",
            InstallStage::Completed => "Installation complete",
            InstallStage::Failed => "Installation failed",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Snapshot of everything known about the current installer run.
///
/// Owned by [`crate::state::InstallStateManager`]; never mutate it directly.
#[derive(Clone, Debug, Default)]
pub struct InstallState {
    pub stage: InstallStage,

    /// Stages entered so far, in order (including the current one)
    pub visited: Vec<InstallStage>,

    pub release_tag: Option<String>,
    pub artifact_path: Option<Utf8PathBuf>,
    pub bytes_downloaded: u64,

    /// Non-fatal problems, e.g. Guilded could not be closed
    pub warnings: Vec<String>,

    pub error: Option<String>,
}

impl InstallState {
    pub fn has_reached(&self, stage: InstallStage) -> bool {
        self.visited.contains(&stage)
    }

    pub fn is_success(&self) -> bool {
        self.stage == InstallStage::Completed
    }
}
