//! HTTP response classification shared by HEAD and GET.

use crate::error::SyncError;
use crate::hash_header::{extract_md5, hash_header_value, HASH_HEADER};
use crate::types::{Checksum, ObjectReference};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Checks a store response and returns the MD5 it reports for the object.
///
/// | Status | Outcome |
/// |---|---|
/// | 200 with hash header | `Ok(checksum)` |
/// | 200 without hash header | [`SyncError::Protocol`] |
/// | 404 | [`SyncError::NotFound`] |
/// | anything else | [`SyncError::UnexpectedResponse`] |
pub(crate) fn checked_md5(
    status: StatusCode,
    headers: &HeaderMap,
    object: &ObjectReference,
) -> Result<Checksum, SyncError> {
    let uri = object.uri();

    match status {
        StatusCode::OK => {
            let value = hash_header_value(headers).ok_or_else(|| SyncError::Protocol {
                uri: uri.clone(),
                reason: format!("got 200 response, but header {} was missing", HASH_HEADER),
            })?;
            extract_md5(&value).map_err(|reason| SyncError::Protocol { uri, reason })
        }
        StatusCode::NOT_FOUND => Err(SyncError::NotFound {
            uri,
            container: object.container().to_string(),
            key: object.key().to_string(),
        }),
        other => Err(SyncError::UnexpectedResponse {
            uri,
            status: other.as_u16(),
            message: other.canonical_reason().unwrap_or("").to_string(),
        }),
    }
}
