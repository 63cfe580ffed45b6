//! Error types for object sync operations.

use std::io;
use thiserror::Error;

/// Errors that can occur while checking or synchronizing an object.
///
/// None of these are retried internally; a failed attempt is reported to the
/// caller as-is.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The store answered 404. Almost always a configuration problem.
    #[error(
        "Got 404 response for {uri}, please check container '{container}' and key '{key}'"
    )]
    NotFound {
        uri: String,
        container: String,
        key: String,
    },

    /// The store answered but broke the expected response contract.
    #[error("Protocol error for {uri}: {reason}")]
    Protocol { uri: String, reason: String },

    /// Any status other than 200 or 404.
    #[error("Got unexpected response for {uri}: {status} {message}")]
    UnexpectedResponse {
        uri: String,
        status: u16,
        message: String,
    },

    /// The downloaded bytes do not hash to the checksum the store reported.
    #[error("MD5 check after download failed for {uri} (expected {expected}, got {actual})")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    /// Resource configuration is incomplete or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error during file operations.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// HTTP transport error.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}
