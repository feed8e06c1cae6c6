//! File serving module
//!
//! Answers GET requests under the served root: directories become HTML
//! listings, regular files are streamed, anything else is a 404.

use crate::error::ServeError;
use crate::handler::listing;
use crate::handler::upload::is_staging_name;
use crate::handler::router::RequestContext;
use crate::http::cache::{CachePolicy, Validators};
use crate::http::{self, mime, ResponseBody};
use crate::resolver::PathResolver;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::Response;
use std::path::Path;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;

/// Serve whatever the request path names inside the root
pub async fn serve_path(
    ctx: &RequestContext,
    resolver: &PathResolver,
) -> Result<Response<ResponseBody>, ServeError> {
    let resolved = resolver.resolve(&ctx.path)?;
    // In-flight uploads are never readable, only their committed result
    if resolved.segments.last().is_some_and(|name| is_staging_name(name)) {
        return Err(ServeError::NotFound);
    }
    let metadata = fs::metadata(&resolved.path)
        .await
        .map_err(ServeError::from_lookup)?;

    if metadata.is_dir() {
        let entries = listing::read_entries(&resolved.path).await?;
        let html = listing::render_listing(&resolved.segments, &entries);
        return Ok(http::build_html_response(html, CachePolicy::NoStore));
    }

    if metadata.is_file() {
        return serve_file(ctx, &resolved.path).await;
    }

    // Sockets, FIFOs and device nodes are never served
    Err(ServeError::NotFound)
}

/// Stream a regular file
///
/// Length and validators come from the opened handle, so they describe
/// exactly the bytes that will be sent even if the path is replaced by an
/// upload in the meantime.
async fn serve_file(
    ctx: &RequestContext,
    path: &Path,
) -> Result<Response<ResponseBody>, ServeError> {
    let file = File::open(path).await.map_err(ServeError::from_lookup)?;
    let metadata = file.metadata().await?;
    let validators = Validators::from_metadata(&metadata);

    if validators.is_not_modified(ctx.if_none_match.as_deref(), ctx.if_modified_since.as_deref())
    {
        return Ok(http::build_304_response(&validators));
    }

    let stream = ReaderStream::new(file).map_ok(Frame::data);
    let body: ResponseBody = StreamBody::new(stream).boxed_unsync();

    Ok(http::build_file_response(
        body,
        metadata.len(),
        mime::content_type_for(path),
        &validators,
    ))
}
