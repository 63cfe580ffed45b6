//! Parsing of the store's multi-algorithm hash header.
//!
//! The store reports content hashes as `algo=base64,algo=base64,...`, possibly
//! split across several header lines, e.g.
//! `x-goog-hash: crc32c=n03x6A==` and `x-goog-hash: md5=Ojk9c3dhfxgoKVVHYwFbHQ==`.

use crate::types::Checksum;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use tracing::debug;

/// Name of the response header carrying content hashes.
pub const HASH_HEADER: &str = "x-goog-hash";

const MD5_LEN: usize = 16;

/// Standard alphabet; tolerant of missing or present padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Splits a hash header value into algorithm name (lowercased) and decoded bytes.
///
/// Tokens are separated by commas and/or whitespace. Tokens without `=` or whose
/// value is not valid base64 are skipped.
pub fn parse_hash_header(value: &str) -> HashMap<String, Vec<u8>> {
    let mut hashes = HashMap::new();

    for token in value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let Some((algorithm, encoded)) = token.split_once('=') else {
            debug!("Ignoring hash token without '=': {:?}", token);
            continue;
        };

        match LENIENT_BASE64.decode(encoded) {
            Ok(bytes) => {
                hashes.insert(algorithm.to_ascii_lowercase(), bytes);
            }
            Err(e) => debug!("Ignoring undecodable {} hash {:?}: {}", algorithm, encoded, e),
        }
    }

    hashes
}

/// Joins every occurrence of the hash header into a single comma-separated value.
///
/// Returns `None` when the header is absent.
pub fn hash_header_value(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(HASH_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Extracts the MD5 entry of a hash header value as a [`Checksum`].
///
/// The error string quotes the raw value so operators can see what the store sent.
pub fn extract_md5(value: &str) -> Result<Checksum, String> {
    match parse_hash_header(value).get("md5") {
        Some(bytes) if bytes.len() == MD5_LEN => Ok(Checksum::from_bytes(bytes)),
        _ => Err(format!(
            "header {} had unexpected value: {:?}",
            HASH_HEADER, value
        )),
    }
}
