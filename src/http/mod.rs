//! HTTP protocol layer module
//!
//! Response bodies, status builders, content-type detection and
//! conditional-request helpers. Nothing in here touches the filesystem
//! directly; handlers pass in what they already know.

pub mod cache;
pub mod mime;
pub mod response;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use std::io;

/// Body type shared by every response: buffered for small payloads,
/// streamed for file contents
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Wrap an in-memory payload
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

// Re-export commonly used builders
pub use response::{
    build_304_response, build_error_response, build_file_response, build_html_response,
    build_text_response,
};
