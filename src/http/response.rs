//! HTTP response building module
//!
//! Provides builders for the responses the handlers emit, decoupled from
//! request processing.

use super::cache::{CachePolicy, Validators};
use super::{empty, full, ResponseBody};
use crate::error::ServeError;
use hyper::{Response, StatusCode};

/// Build a plain-text error response carrying only the public reason
pub fn build_error_response(err: &ServeError) -> Response<ResponseBody> {
    let message = err.public_message();
    let mut builder = Response::builder()
        .status(err.status())
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .header("Cache-Control", CachePolicy::NoStore.to_header_value());

    if let ServeError::MethodNotAllowed { allow } = err {
        builder = builder.header("Allow", *allow);
    }

    builder.body(full(message)).unwrap_or_else(|e| {
        log_build_error(err.status().as_str(), &e);
        fallback(err.status())
    })
}

/// Build a plain-text response
pub fn build_text_response(status: StatusCode, message: String) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .header("Cache-Control", CachePolicy::NoStore.to_header_value())
        .body(full(message))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, policy: CachePolicy) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content.len())
        .header("Cache-Control", policy.to_header_value())
        .body(full(content))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build a 200 response around an already-open file body
pub fn build_file_response(
    body: ResponseBody,
    content_length: u64,
    content_type: &str,
    validators: &Validators,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", &validators.etag)
        .header("Cache-Control", CachePolicy::NoCache.to_header_value());

    if let Some(last_modified) = &validators.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        fallback(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", &validators.etag)
        .header("Cache-Control", CachePolicy::NoCache.to_header_value());

    if let Some(last_modified) = &validators.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(empty()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        fallback(StatusCode::NOT_MODIFIED)
    })
}

fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
