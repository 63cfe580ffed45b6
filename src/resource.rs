//! Managed-resource wrapper around [`ObjectSyncer`].
//!
//! This is where the "always check MD5" policy lives: the syncer itself only
//! answers what it is asked, while the resource decides how often to ask.

use crate::error::SyncError;
use crate::syncer::ObjectSyncer;
use crate::types::{
    Ensure, LocalTarget, ObjectReference, ResourceConfig, ResourceState, SyncOutcome,
};
use tracing::{debug, info};

/// What [`Resource::apply`] changed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyReport {
    Unchanged,
    Downloaded,
    Removed,
}

/// A local file that should mirror one remote object.
///
/// # Example
///
/// ```no_run
/// use objsync::{Resource, ResourceConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ResourceConfig::new(
///     "selenium-release",
///     "2.41.0/selenium-server-standalone-2.41.0.jar",
///     "/usr/local/selenium/selenium.jar",
/// );
/// let resource = Resource::new(config)?;
/// let downloaded = resource.ensure_present().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Resource {
    object: Option<ObjectReference>,
    target: LocalTarget,
    always_check_md5: bool,
    ensure: Ensure,
    syncer: ObjectSyncer,
}

impl Resource {
    /// Validates `config` and builds a resource with a default syncer.
    pub fn new(config: ResourceConfig) -> Result<Self, SyncError> {
        let mut syncer = ObjectSyncer::new()?;
        if let Some(dir) = &config.scratch_dir {
            syncer = syncer.with_scratch_dir(dir);
        }
        Self::with_syncer(config, syncer)
    }

    /// Validates `config` and builds a resource around an existing syncer.
    ///
    /// Container and key may only be omitted when the file is ensured absent.
    pub fn with_syncer(config: ResourceConfig, syncer: ObjectSyncer) -> Result<Self, SyncError> {
        let object = match (config.container, config.key) {
            (Some(container), Some(key)) => {
                Some(ObjectReference::new(config.host, container, key))
            }
            _ if config.ensure == Ensure::Absent => None,
            _ => {
                return Err(SyncError::InvalidConfig(
                    "container and key are required when ensure is present".to_string(),
                ))
            }
        };

        Ok(Self {
            object,
            target: LocalTarget::new(config.local_path),
            always_check_md5: config.always_check_md5,
            ensure: config.ensure,
            syncer,
        })
    }

    pub fn target(&self) -> &LocalTarget {
        &self.target
    }

    pub fn object(&self) -> Option<&ObjectReference> {
        self.object.as_ref()
    }

    fn require_object(&self) -> Result<&ObjectReference, SyncError> {
        self.object.as_ref().ok_or_else(|| {
            SyncError::InvalidConfig("container and key are required to reach the store".into())
        })
    }

    /// Full state of the file, always consulting the store when it exists.
    pub async fn query_state(&self) -> Result<ResourceState, SyncError> {
        let object = self.require_object()?;
        let current = self.syncer.is_current(object, &self.target).await?;
        Ok(ResourceState::from(current))
    }

    /// Whether the resource is considered in place.
    ///
    /// With `always_check_md5` this is [`ObjectSyncer::is_current`] (and so
    /// `None` for a missing file). Without it, only local presence is checked
    /// and the store is never contacted.
    pub async fn exists(&self) -> Result<Option<bool>, SyncError> {
        if self.always_check_md5 {
            self.syncer
                .is_current(self.require_object()?, &self.target)
                .await
        } else {
            let present = tokio::fs::try_exists(self.target.path()).await?;
            debug!("{:?} present: {}", self.target.path(), present);
            Ok(Some(present))
        }
    }

    /// Makes sure the file is in place, downloading if [`exists`](Self::exists)
    /// says otherwise. Returns `true` iff a download occurred.
    pub async fn ensure_present(&self) -> Result<bool, SyncError> {
        if self.exists().await? == Some(true) {
            return Ok(false);
        }
        self.force_refresh().await
    }

    /// Re-checks the file against the store and downloads on mismatch,
    /// regardless of `always_check_md5`. Returns `true` iff a download occurred.
    pub async fn force_refresh(&self) -> Result<bool, SyncError> {
        let outcome = self
            .syncer
            .synchronize(self.require_object()?, &self.target)
            .await?;
        Ok(outcome == SyncOutcome::Downloaded)
    }

    /// Removes the file if it is present.
    pub async fn ensure_absent(&self) -> Result<bool, SyncError> {
        if !tokio::fs::try_exists(self.target.path()).await? {
            return Ok(false);
        }
        self.syncer.remove(&self.target).await?;
        Ok(true)
    }

    /// Converges the file to the configured `ensure` state.
    pub async fn apply(&self) -> Result<ApplyReport, SyncError> {
        let report = match self.ensure {
            Ensure::Present => {
                if self.ensure_present().await? {
                    ApplyReport::Downloaded
                } else {
                    ApplyReport::Unchanged
                }
            }
            Ensure::Absent => {
                if self.ensure_absent().await? {
                    ApplyReport::Removed
                } else {
                    ApplyReport::Unchanged
                }
            }
        };
        info!("{:?}: {:?}", self.target.path(), report);
        Ok(report)
    }
}
