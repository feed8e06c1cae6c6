//! Upload handling module
//!
//! Accepts a `multipart/form-data` body with a single `file` field and
//! stores it directly under the served root. The client's filename is
//! reduced to its final segment, so the destination is always
//! `<root>/<basename>`.
//!
//! Data is written to a hidden staging file in the root and renamed over the
//! destination once complete. Readers see either the previous file or the
//! new one, and concurrent uploads to the same name never interleave. The
//! staging file is removed on every failure path, including the request
//! future being dropped when the client disconnects.

use crate::config::AppState;
use crate::error::ServeError;
use crate::logger;
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::Request;
use multer::{Constraints, Multipart, SizeLimit};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Form field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// Room for multipart framing on top of the decoded size limit
pub const FRAMING_ALLOWANCE: u64 = 64 * 1024;

const STAGING_PREFIX: &str = ".upload-";
const STAGING_SUFFIX: &str = ".part";

/// Whether a directory entry is an in-flight upload
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
}

/// Receive an upload and return the stored file name
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> Result<String, ServeError>
where
    B: Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let limit = state.max_upload_size();
    let stream_limit = limit.saturating_add(FRAMING_ALLOWANCE);
    check_declared_length(&req, stream_limit)?;

    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(ServeError::BadRequest(
            "400 Bad Request: expected multipart/form-data",
        ))?;

    // The raw stream bound only guards against runaway framing; the real
    // limit is on decoded field bytes below
    let constraints =
        Constraints::new().size_limit(SizeLimit::new().whole_stream(stream_limit));
    let stream = req.into_body().into_data_stream();
    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

    let root = state.resolver.root();
    let mut received: Option<(String, StagedUpload)> = None;
    let mut decoded = DecodedSize::new(limit);

    while let Some(mut field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            while let Some(chunk) = field.chunk().await.map_err(map_multipart_error)? {
                decoded.add(chunk.len())?;
            }
            continue;
        }
        if received.is_some() {
            return Err(ServeError::BadRequest(
                "400 Bad Request: more than one file field",
            ));
        }

        let name = sanitize_filename(field.file_name().unwrap_or_default())?;
        let mut staged = StagedUpload::create(root)?;
        while let Some(chunk) = field.chunk().await.map_err(map_multipart_error)? {
            decoded.add(chunk.len())?;
            staged.write(&chunk).await?;
        }
        received = Some((name, staged));
    }

    let (name, staged) = received.ok_or(ServeError::BadRequest(
        "400 Bad Request: missing file field",
    ))?;

    let destination = root.join(&name);
    let size = staged.commit(destination).await?;
    logger::log_info(&format!("Stored upload '{name}' ({size} bytes)"));
    Ok(name)
}

/// Reject early when the client announces an oversized body
fn check_declared_length<B>(req: &Request<B>, limit: u64) -> Result<(), ServeError> {
    let Some(value) = req.headers().get(CONTENT_LENGTH) else {
        return Ok(());
    };
    match value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(size) if size > limit => {
            logger::log_warning(&format!(
                "Upload body too large: {size} bytes (max: {limit})"
            ));
            Err(ServeError::BadRequest("400 Bad Request: upload too large"))
        }
        Some(_) => Ok(()),
        None => Err(ServeError::BadRequest(
            "400 Bad Request: invalid Content-Length",
        )),
    }
}

/// Running total of decoded field bytes across the whole form
struct DecodedSize {
    total: u64,
    limit: u64,
}

impl DecodedSize {
    const fn new(limit: u64) -> Self {
        Self { total: 0, limit }
    }

    fn add(&mut self, len: usize) -> Result<(), ServeError> {
        self.total = self.total.saturating_add(len as u64);
        if self.total > self.limit {
            logger::log_warning(&format!(
                "Upload too large: more than {} decoded bytes",
                self.limit
            ));
            return Err(ServeError::BadRequest("400 Bad Request: upload too large"));
        }
        Ok(())
    }
}

fn map_multipart_error(err: multer::Error) -> ServeError {
    match err {
        multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. } => {
            ServeError::BadRequest("400 Bad Request: upload too large")
        }
        multer::Error::StreamReadFailed(e) => {
            logger::log_warning(&format!("Upload body read failed: {e}"));
            ServeError::BadRequest("400 Bad Request: incomplete upload body")
        }
        e => {
            logger::log_debug(&format!("Malformed multipart body: {e}"));
            ServeError::BadRequest("400 Bad Request: malformed multipart body")
        }
    }
}

/// Reduce a client-supplied filename to a safe final segment
///
/// Both `/` and `\` count as separators whatever the platform. Names that
/// reduce to nothing, `.` or `..`, contain NUL, or collide with the staging
/// file prefix are refused.
pub fn sanitize_filename(raw: &str) -> Result<String, ServeError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty()
        || base == "."
        || base == ".."
        || base.contains('\0')
        || base.starts_with(STAGING_PREFIX)
    {
        return Err(ServeError::BadRequest("400 Bad Request: invalid filename"));
    }

    Ok(base.to_string())
}

/// Upload data parked in a hidden file next to its destination
///
/// Dropping it without [`StagedUpload::commit`] deletes the file.
struct StagedUpload {
    temp: NamedTempFile,
    file: tokio::fs::File,
    written: u64,
}

impl StagedUpload {
    fn create(root: &Path) -> Result<Self, ServeError> {
        let temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(root)?;

        // tempfile creates 0600; stored uploads get ordinary file permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }

        let file = tokio::fs::File::from_std(temp.reopen()?);
        Ok(Self {
            temp,
            file,
            written: 0,
        })
    }

    async fn write(&mut self, chunk: &[u8]) -> Result<(), ServeError> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush to disk and atomically move into place, replacing any
    /// existing file of the same name
    async fn commit(mut self, destination: PathBuf) -> Result<u64, ServeError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        drop(self.file);

        let temp = self.temp;
        tokio::task::spawn_blocking(move || temp.persist(destination))
            .await
            .map_err(|e| ServeError::Io(std::io::Error::other(e)))?
            .map_err(|e| ServeError::Io(e.error))?;

        Ok(self.written)
    }
}
