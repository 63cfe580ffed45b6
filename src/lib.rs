//! objsync - keep a local file identical to an object in a remote blob store
//!
//! This library downloads an object over plain HTTP only when the local copy's
//! MD5 differs from the checksum the store reports, verifies the downloaded
//! bytes against the checksum sent with the body, and atomically replaces the
//! local file.
//!
//! # Features
//!
//! - **Cheap checks**: Compare local MD5 against the store's `x-goog-hash` via HEAD
//! - **Verified downloads**: Stream to a scratch file, re-check, then rename into place
//! - **Managed resources**: `ensure present/absent` with an "always check MD5" policy
//!
//! # Example
//!
//! ```no_run
//! use objsync::{LocalTarget, ObjectReference, ObjectSyncer, SyncOutcome, DEFAULT_HOST};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let syncer = ObjectSyncer::new()?;
//! let object = ObjectReference::new(DEFAULT_HOST, "selenium-release", "2.41.0/server.jar");
//! let target = LocalTarget::new("/opt/selenium/server.jar");
//!
//! match syncer.synchronize(&object, &target).await? {
//!     SyncOutcome::AlreadyCurrent => println!("up to date"),
//!     SyncOutcome::Downloaded => println!("downloaded"),
//! }
//! # Ok(())
//! # }
//! ```

mod download;
mod error;
mod hash_header;
mod resource;
mod response;
mod syncer;
mod types;
mod verify;

pub use error::SyncError;
pub use hash_header::{extract_md5, parse_hash_header, HASH_HEADER};
pub use resource::{ApplyReport, Resource};
pub use syncer::ObjectSyncer;
pub use types::{
    Checksum, Ensure, LocalTarget, ObjectReference, ResourceConfig, ResourceState,
    SyncOutcome, DEFAULT_HOST,
};
pub use verify::ChecksumVerifier;
