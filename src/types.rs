//! Data structures for object sync operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Store host used when the configuration does not name one.
pub const DEFAULT_HOST: &str = "storage.googleapis.com";

/// A single object in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    host: String,
    container: String,
    key: String,
}

impl ObjectReference {
    /// Creates a reference to `key` inside `container` on `host`.
    pub fn new(
        host: impl Into<String>,
        container: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            key: key.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Canonical request URI, `http://<host>/<container>/<key>`.
    ///
    /// Segments are joined literally; the key is not URL-encoded. Slashes at the
    /// joins are collapsed so `"bucket/"` + `"/a/b"` still yields one separator.
    pub fn uri(&self) -> String {
        format!(
            "http://{}/{}/{}",
            self.host.trim_end_matches('/'),
            self.container.trim_matches('/'),
            self.key.trim_start_matches('/')
        )
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// Local destination for an object. The file is only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    path: PathBuf,
}

impl LocalTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// An MD5 digest rendered as lowercase hex.
///
/// Equality is exact string equality; construction always lowercases, so two
/// digests of the same bytes compare equal regardless of where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Builds a checksum from raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful synchronization. Failures are the `Err` arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local content already matched; no body was transferred.
    AlreadyCurrent,
    /// The object was downloaded, verified and published.
    Downloaded,
}

/// Observed state of a managed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Absent,
    PresentStale,
    PresentCurrent,
}

impl From<Option<bool>> for ResourceState {
    fn from(current: Option<bool>) -> Self {
        match current {
            None => ResourceState::Absent,
            Some(false) => ResourceState::PresentStale,
            Some(true) => ResourceState::PresentCurrent,
        }
    }
}

/// Desired state of a managed file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

/// Configuration for a managed file.
///
/// # Example
///
/// ```
/// use objsync::ResourceConfig;
///
/// let config: ResourceConfig = serde_json::from_str(r#"{
///     "container": "selenium-release",
///     "key": "2.41.0/selenium-server-standalone-2.41.0.jar",
///     "local_path": "/usr/local/selenium/selenium.jar"
/// }"#).unwrap();
/// assert!(!config.always_check_md5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Bucket/container holding the object. Required when `ensure` is present.
    #[serde(default)]
    pub container: Option<String>,
    /// Path of the object within the container. Required when `ensure` is present.
    #[serde(default)]
    pub key: Option<String>,
    /// Where the object should be stored locally.
    pub local_path: PathBuf,
    /// Compare against the remote MD5 on every check, not only on refresh.
    ///
    /// Costs one HEAD request to the store per check.
    #[serde(default)]
    pub always_check_md5: bool,
    #[serde(default)]
    pub ensure: Ensure,
    /// Store host (default: `storage.googleapis.com`).
    #[serde(default = "default_host")]
    pub host: String,
    /// Directory for scratch files. Must live on the same filesystem as
    /// `local_path`; defaults to the target's parent directory.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl ResourceConfig {
    /// A present-ensured config for `container`/`key` stored at `local_path`.
    pub fn new(
        container: impl Into<String>,
        key: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            container: Some(container.into()),
            key: Some(key.into()),
            local_path: local_path.into(),
            always_check_md5: false,
            ensure: Ensure::Present,
            host: default_host(),
            scratch_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_joins_literally() {
        let object = ObjectReference::new(DEFAULT_HOST, "selenium-release", "2.41.0/server.jar");
        assert_eq!(
            object.uri(),
            "http://storage.googleapis.com/selenium-release/2.41.0/server.jar"
        );

        let object = ObjectReference::new("127.0.0.1:8080", "bucket/", "/a b/c.tgz");
        assert_eq!(object.uri(), "http://127.0.0.1:8080/bucket/a b/c.tgz");
    }

    #[test]
    fn test_checksum_is_lowercase_hex() {
        let checksum = Checksum::from_bytes(&[0xAB, 0x01, 0xFF]);
        assert_eq!(checksum.as_str(), "ab01ff");
    }

    #[test]
    fn test_state_from_tristate() {
        assert_eq!(ResourceState::from(None), ResourceState::Absent);
        assert_eq!(ResourceState::from(Some(false)), ResourceState::PresentStale);
        assert_eq!(ResourceState::from(Some(true)), ResourceState::PresentCurrent);
    }

    #[test]
    fn test_config_defaults() {
        let config: ResourceConfig =
            serde_json::from_str(r#"{"container": "b", "key": "c", "local_path": "a"}"#)
                .unwrap();
        assert_eq!(config.ensure, Ensure::Present);
        assert!(!config.always_check_md5);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.scratch_dir.is_none());
    }

    #[test]
    fn test_config_rejects_bad_ensure() {
        let result = serde_json::from_str::<ResourceConfig>(
            r#"{"local_path": "a", "ensure": "nonsense"}"#,
        );
        assert!(result.is_err());
    }
}
