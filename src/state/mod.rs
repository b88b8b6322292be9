// State management module
//
// Wraps InstallState with thread-safe access using Arc<RwLock<T>> and emits
// change events as the installer moves through its stages.

use crate::models::{InstallStage, InstallState};
use camino::Utf8PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the run state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The run entered a new stage
    StageChanged {
        from: InstallStage,
        to: InstallStage,
    },

    /// The latest release tag has been resolved
    ReleaseResolved { tag: String },

    /// The artifact was written to disk
    ArtifactDownloaded { path: Utf8PathBuf, bytes: u64 },

    /// A non-fatal problem was recorded
    WarningRaised { message: String },

    /// The run failed with the given message
    RunFailed { message: String },
}

/// Thread-safe owner of the [`InstallState`] for one installer run.
///
/// - [`read()`](Self::read) / [`snapshot()`](Self::snapshot) for inspection
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) to follow progress from another task
pub struct InstallStateManager {
    state: Arc<RwLock<InstallState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl InstallStateManager {
    /// Create a manager in the [`InstallStage::Pending`] stage with a 64 event buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(64);
        Self {
            state: Arc::new(RwLock::new(InstallState::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> InstallState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// ```ignore
    /// let tag = manager.read(|state| state.release_tag.clone());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&InstallState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Apply `update_fn`, then emit an event for every detected change.
    ///
    /// Returns the emitted events.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut InstallState),
    {
        let changes = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let old_state = state.clone();

            update_fn(&mut state);

            if state.stage != old_state.stage {
                let stage = state.stage;
                state.visited.push(stage);
            }

            Self::detect_changes(&old_state, &state)
        };

        for change in &changes {
            // Nobody listening is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &InstallState, new: &InstallState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.stage != new.stage {
            changes.push(StateChange::StageChanged {
                from: old.stage,
                to: new.stage,
            });
        }

        if old.release_tag != new.release_tag {
            if let Some(tag) = &new.release_tag {
                changes.push(StateChange::ReleaseResolved { tag: tag.clone() });
            }
        }

        if old.artifact_path != new.artifact_path || old.bytes_downloaded != new.bytes_downloaded {
            if let Some(path) = &new.artifact_path {
                changes.push(StateChange::ArtifactDownloaded {
                    path: path.clone(),
                    bytes: new.bytes_downloaded,
                });
            }
        }

        for message in new.warnings.iter().skip(old.warnings.len()) {
            changes.push(StateChange::WarningRaised {
                message: message.clone(),
            });
        }

        if old.error != new.error {
            if let Some(message) = &new.error {
                changes.push(StateChange::RunFailed {
                    message: message.clone(),
                });
            }
        }

        changes
    }

    // Convenience methods used by the installer

    /// Move to `stage`. Finished runs and backwards moves are ignored.
    pub fn enter_stage(&self, stage: InstallStage) -> Vec<StateChange> {
        self.update(|state| {
            if state.stage.is_finished() || stage < state.stage {
                tracing::debug!("Ignoring stage transition {:?} -> {:?}", state.stage, stage);
                return;
            }
            state.stage = stage;
        })
    }

    pub fn record_release(&self, tag: &str) -> Vec<StateChange> {
        self.update(|state| state.release_tag = Some(tag.to_string()))
    }

    pub fn record_download(&self, path: Utf8PathBuf, bytes: u64) -> Vec<StateChange> {
        self.update(|state| {
            state.artifact_path = Some(path);
            state.bytes_downloaded = bytes;
        })
    }

    pub fn add_warning(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| state.warnings.push(message))
    }

    pub fn complete(&self) -> Vec<StateChange> {
        self.enter_stage(InstallStage::Completed)
    }

    pub fn fail(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| {
            if state.stage.is_finished() {
                return;
            }
            state.stage = InstallStage::Failed;
            state.error = Some(message);
        })
    }
}

impl Default for InstallStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InstallStateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
