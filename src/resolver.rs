//! Request path resolution
//!
//! Maps an untrusted URL path onto the served root and proves the result
//! stays inside it. Containment is checked component-wise on canonical
//! paths, so a sibling such as `/files-secret` is never admitted for a root
//! of `/files`, and symlinks whose target leaves the root are rejected.

use crate::error::ServeError;
use std::io;
use std::path::{Path, PathBuf};

/// A path proven to be the root or one of its descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical absolute filesystem path
    pub path: PathBuf,
    /// Decoded, normalized segments of the request path relative to the root
    pub segments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Pin the canonical form of `root`, which must be an existing directory
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("served root '{}' is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw (still percent-encoded) request path
    pub fn resolve(&self, request_path: &str) -> Result<ResolvedPath, ServeError> {
        let decoded = urlencoding::decode(request_path)
            .map_err(|_| ServeError::BadRequest("400 Bad Request: invalid path encoding"))?;
        let segments = normalize_segments(&decoded)?;

        let mut joined = self.root.clone();
        joined.extend(&segments);

        let canonical = canonicalize_existing(&joined)?;
        if !canonical.starts_with(&self.root) {
            return Err(ServeError::PathEscape);
        }

        Ok(ResolvedPath {
            path: canonical,
            segments,
        })
    }
}

/// Lexically normalize a decoded path into plain segments
///
/// Both `/` and `\` separate segments. `..` may only consume segments the
/// path itself introduced; climbing above the root is an escape.
pub fn normalize_segments(decoded: &str) -> Result<Vec<String>, ServeError> {
    let mut segments: Vec<String> = Vec::new();

    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ServeError::PathEscape);
                }
            }
            s if s.contains('\0') => return Err(ServeError::PathEscape),
            s => segments.push(s.to_string()),
        }
    }

    Ok(segments)
}

/// Canonicalize the longest existing ancestor and re-append the rest
///
/// Symlinks are resolved wherever they exist on disk; the missing tail is
/// made only of normal segments, so it cannot climb back out.
fn canonicalize_existing(path: &Path) -> Result<PathBuf, ServeError> {
    let mut existing = path.to_path_buf();
    let mut tail = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                canonical.extend(tail.iter().rev());
                return Ok(canonical);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                match existing.file_name() {
                    Some(name) => tail.push(name.to_os_string()),
                    None => return Err(ServeError::Io(e)),
                }
                existing.pop();
            }
            Err(e) => return Err(ServeError::Io(e)),
        }
    }
}
