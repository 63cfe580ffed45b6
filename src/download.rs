//! Streaming object download.

use crate::error::SyncError;
use crate::response::checked_md5;
use crate::types::{Checksum, ObjectReference};
use futures_util::StreamExt;
use std::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// Streams the body of `object` into `file` with a single GET.
///
/// The response is classified before any byte is written, and the checksum the
/// store reported on this same response is returned, so the caller compares
/// against exactly the bytes that were streamed.
///
/// # Arguments
///
/// * `client` - HTTP client to issue the request with
/// * `object` - The object to fetch
/// * `file` - Scratch file to write into (starting at offset 0)
/// * `pb` - Progress bar updated with transferred bytes
///
/// # Returns
///
/// The store-reported MD5 of the body, or an error.
pub(crate) async fn download_object(
    client: &reqwest::Client,
    object: &ObjectReference,
    file: &File,
    pb: &indicatif::ProgressBar,
) -> Result<Checksum, SyncError> {
    let uri = object.uri();
    debug!("GET {}", uri);

    let response = client.get(&uri).send().await?;
    let reported = checked_md5(response.status(), response.headers(), object)?;

    info!("⬇️  Downloading {}", uri);
    if let Some(len) = response.content_length() {
        pb.set_length(len);
    }

    let mut writer = BufWriter::new(tokio::fs::File::from_std(file.try_clone()?));
    let mut byte_stream = response.bytes_stream();

    while let Some(piece) = byte_stream.next().await {
        let chunk = piece?;
        writer.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    Ok(reported)
}
