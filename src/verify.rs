//! Checksum computation for local files and remote objects.

use crate::error::SyncError;
use crate::response::checked_md5;
use crate::types::{Checksum, ObjectReference};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Builds the HTTP client used for all store requests.
///
/// Redirects are not followed: the store answers 200 or 404, and anything
/// else is reported as an unexpected response.
pub(crate) fn http_client() -> Result<reqwest::Client, SyncError> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Produces checksums for local files and remote objects.
#[derive(Debug, Clone)]
pub struct ChecksumVerifier {
    client: reqwest::Client,
}

impl ChecksumVerifier {
    /// Creates a verifier with its own HTTP client.
    pub fn new() -> Result<Self, SyncError> {
        Ok(Self::with_client(http_client()?))
    }

    /// Creates a verifier sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Computes the MD5 of a local file.
    ///
    /// Returns `Ok(None)` if nothing exists at `path`. The file is read in
    /// chunks on a blocking worker so large files don't stall the runtime.
    pub async fn local_checksum(&self, path: &Path) -> Result<Option<Checksum>, SyncError> {
        compute_file_md5(path.to_path_buf()).await
    }

    /// Fetches the store-reported MD5 of `object` with a HEAD request.
    pub async fn remote_checksum(&self, object: &ObjectReference) -> Result<Checksum, SyncError> {
        let uri = object.uri();
        debug!("HEAD {}", uri);

        let response = self.client.head(&uri).send().await?;
        let checksum = checked_md5(response.status(), response.headers(), object)?;

        debug!("Remote MD5 for {} is {}", object, checksum);
        Ok(checksum)
    }
}

async fn compute_file_md5(path: PathBuf) -> Result<Option<Checksum>, SyncError> {
    tokio::task::spawn_blocking(move || {
        use md5::{Digest, Md5};

        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::Io(e)),
        };
        let mut reader = io::BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Some(Checksum::from_bytes(&hasher.finalize())))
    })
    .await
    .map_err(|e| SyncError::Io(io::Error::other(format!("Task join error: {}", e))))?
}
