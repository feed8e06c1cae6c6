//! HTTP cache control module
//!
//! Provides `ETag`/`Last-Modified` validators derived from file metadata and
//! conditional request handling.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::fs::Metadata;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

/// IMF-fixdate, the preferred HTTP date format (RFC 7231 §7.1.1.1)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators sent with a file response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub etag: String,
    pub last_modified: Option<String>,
    modified: Option<DateTime<Utc>>,
}

impl Validators {
    /// Derive validators from size and modification time
    ///
    /// An upload replaces the file by rename, so either value changing is
    /// enough to invalidate a cached copy without reading the contents.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata.modified().ok();
        Self::new(metadata.len(), modified)
    }

    pub fn new(len: u64, modified: Option<SystemTime>) -> Self {
        let modified = modified.map(DateTime::<Utc>::from);
        Self {
            etag: generate_etag(len, modified),
            last_modified: modified.map(|m| m.format(HTTP_DATE_FORMAT).to_string()),
            modified,
        }
    }

    /// Whether the client's cached copy is still current
    ///
    /// `If-None-Match` takes precedence over `If-Modified-Since` when both
    /// are present.
    pub fn is_not_modified(
        &self,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> bool {
        if if_none_match.is_some() {
            return check_etag_match(if_none_match, &self.etag);
        }
        match (if_modified_since.and_then(parse_http_date), self.modified) {
            // HTTP dates carry whole seconds only
            (Some(since), Some(modified)) => modified.timestamp() <= since.timestamp(),
            _ => false,
        }
    }
}

/// Generate `ETag` using fast hashing over size and mtime
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
fn generate_etag(len: u64, modified: Option<DateTime<Utc>>) -> String {
    let mut hasher = DefaultHasher::new();
    len.hash(&mut hasher);
    modified
        .map(|m| (m.timestamp(), m.timestamp_subsec_nanos()))
        .hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak `ETags`: `W/"abc123"` (weak comparison)
/// - Wildcard: `*`
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
        })
    })
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Cache control policy
#[derive(Debug, Clone, Copy)]
pub enum CachePolicy {
    /// Cacheable, but must be revalidated on every use
    NoCache,
    /// Never store (listings and error replies)
    NoStore,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::NoCache => "no-cache".to_string(),
            Self::NoStore => "no-store".to_string(),
        }
    }
}
