// Run metrics module
//
// Lightweight counters and stage timings for a single installer run

use crate::models::InstallStage;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Metrics collected while the installer runs.
///
/// Uses atomics so the patcher's concurrent tasks and the orchestrator can
/// record without locking.
#[derive(Debug)]
pub struct Metrics {
    /// Bytes of artifact written to disk
    pub bytes_downloaded: AtomicU64,

    /// HTTP redirects followed while downloading
    pub redirects_followed: AtomicUsize,

    /// Filesystem entries moved into the backup directory
    pub entries_relocated: AtomicUsize,

    pub terminate_time_ms: AtomicU64,
    pub release_lookup_time_ms: AtomicU64,
    pub download_time_ms: AtomicU64,
    pub patch_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            bytes_downloaded: AtomicU64::new(0),
            redirects_followed: AtomicUsize::new(0),
            entries_relocated: AtomicUsize::new(0),
            terminate_time_ms: AtomicU64::new(0),
            release_lookup_time_ms: AtomicU64::new(0),
            download_time_ms: AtomicU64::new(0),
            patch_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_download(&self, bytes: u64, redirects: usize) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
        self.redirects_followed.fetch_add(redirects, Ordering::Relaxed);
    }

    pub fn record_relocated(&self, count: usize) {
        self.entries_relocated.fetch_add(count, Ordering::Relaxed);
    }

    /// Add `duration` to the timer for `stage`. Stages without a timer are ignored.
    pub fn record_stage_time(&self, stage: InstallStage, duration: Duration) {
        let counter = match stage {
            InstallStage::Terminating => &self.terminate_time_ms,
            InstallStage::LocatingRelease => &self.release_lookup_time_ms,
            InstallStage::Downloading => &self.download_time_ms,
            InstallStage::Patching => &self.patch_time_ms,
            _ => return,
        };
        counter.fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn stage_time_ms(&self, stage: InstallStage) -> u64 {
        match stage {
            InstallStage::Terminating => self.terminate_time_ms.load(Ordering::Relaxed),
            InstallStage::LocatingRelease => self.release_lookup_time_ms.load(Ordering::Relaxed),
            InstallStage::Downloading => self.download_time_ms.load(Ordering::Relaxed),
            InstallStage::Patching => self.patch_time_ms.load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Download throughput in KiB/s, 0 when nothing was downloaded
    pub fn download_rate_kib(&self) -> f64 {
        let bytes = self.bytes_downloaded.load(Ordering::Relaxed);
        let ms = self.download_time_ms.load(Ordering::Relaxed);
        if bytes == 0 || ms == 0 {
            0.0
        } else {
            (bytes as f64 / 1024.0) / (ms as f64 / 1000.0)
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Installer Run Summary ===");
        tracing::info!("Total time: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Stage times: terminate {}ms, release lookup {}ms, download {}ms, patch {}ms",
            self.terminate_time_ms.load(Ordering::Relaxed),
            self.release_lookup_time_ms.load(Ordering::Relaxed),
            self.download_time_ms.load(Ordering::Relaxed),
            self.patch_time_ms.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Downloaded {} bytes ({:.1} KiB/s) after {} redirect(s); relocated {} entries",
            self.bytes_downloaded.load(Ordering::Relaxed),
            self.download_rate_kib(),
            self.redirects_followed.load(Ordering::Relaxed),
            self.entries_relocated.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
