//! Download decision, verification and atomic publish.

use crate::download::download_object;
use crate::error::SyncError;
use crate::types::{LocalTarget, ObjectReference, SyncOutcome};
use crate::verify::{http_client, ChecksumVerifier};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

const SCRATCH_PREFIX: &str = ".objsync-";
const SCRATCH_SUFFIX: &str = ".part";

/// Keeps a local file identical to a remote object.
///
/// Holds no comparison state between calls: every [`synchronize`](Self::synchronize)
/// decides again from the filesystem and the store.
#[derive(Clone)]
pub struct ObjectSyncer {
    verifier: ChecksumVerifier,
    scratch_dir: Option<PathBuf>,
    progress: indicatif::ProgressBar,
}

impl ObjectSyncer {
    /// Creates a syncer staging downloads next to their target.
    pub fn new() -> Result<Self, SyncError> {
        Ok(Self {
            verifier: ChecksumVerifier::with_client(http_client()?),
            scratch_dir: None,
            progress: indicatif::ProgressBar::hidden(),
        })
    }

    /// Stages downloads in `dir` instead of the target's parent directory.
    ///
    /// `dir` must be on the same filesystem as every target, otherwise the
    /// final rename fails.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Reports download progress on `pb` (hidden by default).
    pub fn with_progress(mut self, pb: indicatif::ProgressBar) -> Self {
        self.progress = pb;
        self
    }

    pub fn verifier(&self) -> &ChecksumVerifier {
        &self.verifier
    }

    /// Whether the local file matches the remote object.
    ///
    /// Returns `None` when no local file exists (no request is made in that
    /// case), otherwise whether the local and remote MD5 are equal.
    pub async fn is_current(
        &self,
        object: &ObjectReference,
        target: &LocalTarget,
    ) -> Result<Option<bool>, SyncError> {
        let Some(local) = self.verifier.local_checksum(target.path()).await? else {
            debug!("No local file at {:?}", target.path());
            return Ok(None);
        };

        let remote = self.verifier.remote_checksum(object).await?;
        if local == remote {
            info!("✅ {:?} verified (MD5 match)", target.path());
            Ok(Some(true))
        } else {
            info!(
                "❌ MD5 mismatch for {:?}: local={}, remote={}",
                target.path(),
                local,
                remote
            );
            Ok(Some(false))
        }
    }

    /// Downloads `object` to `target` unless the local copy is already current.
    ///
    /// The body is staged in a uniquely named scratch file, checked against the
    /// MD5 reported on the same GET response, and renamed onto the target only
    /// when it matches. On any error the scratch file is removed and the target
    /// is left untouched.
    pub async fn synchronize(
        &self,
        object: &ObjectReference,
        target: &LocalTarget,
    ) -> Result<SyncOutcome, SyncError> {
        if self.is_current(object, target).await? == Some(true) {
            return Ok(SyncOutcome::AlreadyCurrent);
        }

        let scratch_dir = self.scratch_dir_for(target.path());
        tokio::fs::create_dir_all(&scratch_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(SCRATCH_SUFFIX)
            .tempfile_in(&scratch_dir)?;
        debug!("Staging {} in {:?}", object, scratch.path());

        let started = Instant::now();
        self.progress.reset();
        let downloaded = download_object(
            self.verifier.client(),
            object,
            scratch.as_file(),
            &self.progress,
        )
        .await;
        self.progress.finish_and_clear();
        let expected = downloaded?;
        info!(
            "Download of {} finished in {}",
            object,
            humantime::format_duration(round_to_millis(started.elapsed()))
        );

        let actual = self
            .verifier
            .local_checksum(scratch.path())
            .await?
            .ok_or_else(|| {
                SyncError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("scratch file {:?} vanished", scratch.path()),
                ))
            })?;

        if actual != expected {
            return Err(SyncError::ChecksumMismatch {
                uri: object.uri(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        if let Some(parent) = non_empty_parent(target.path()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Replacing a file keeps its mode; new files keep the scratch file's.
        if let Ok(existing) = tokio::fs::metadata(target.path()).await {
            scratch.as_file().set_permissions(existing.permissions())?;
        }
        scratch
            .persist(target.path())
            .map_err(|e| SyncError::Io(e.error))?;

        info!("✅ Installed {} at {:?} (MD5 {})", object, target.path(), actual);
        Ok(SyncOutcome::Downloaded)
    }

    /// Deletes the file at `target`.
    pub async fn remove(&self, target: &LocalTarget) -> Result<(), SyncError> {
        tokio::fs::remove_file(target.path()).await?;
        info!("Removed {:?}", target.path());
        Ok(())
    }

    fn scratch_dir_for(&self, target: &Path) -> PathBuf {
        match &self.scratch_dir {
            Some(dir) => dir.clone(),
            None => non_empty_parent(target)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn round_to_millis(d: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_millis(d.as_millis() as u64)
}
