//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: picks the upload endpoint or the
//! file tree by path, enforces the allowed method for each, and turns every
//! handler error into its status response.

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::{files, upload};
use crate::http::{self, ResponseBody};
use crate::logger;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext {
    /// Raw (percent-encoded) request path
    pub path: String,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            path: req.uri().path().to_string(),
            if_none_match: header(IF_NONE_MATCH),
            if_modified_since: header(IF_MODIFIED_SINCE),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let ctx = RequestContext::from_request(&req);

    let result = if ctx.path == state.config.storage.upload_path {
        route_upload(req, &state).await
    } else if req.method() == Method::GET {
        files::serve_path(&ctx, &state.resolver).await
    } else {
        Err(ServeError::MethodNotAllowed { allow: "GET" })
    };

    Ok(result.unwrap_or_else(|err| error_response(&ctx.path, &err)))
}

async fn route_upload<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError>
where
    B: Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    if req.method() != Method::POST {
        return Err(ServeError::MethodNotAllowed { allow: "POST" });
    }

    let name = upload::handle_upload(req, state).await?;
    Ok(http::build_text_response(
        StatusCode::OK,
        format!("File {name} uploaded successfully."),
    ))
}

/// Log the detail server-side and answer with the public reason only
fn error_response(path: &str, err: &ServeError) -> Response<ResponseBody> {
    match err {
        ServeError::PathEscape => {
            logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        }
        ServeError::NotFound => logger::log_debug(&format!("Not found: {path}")),
        ServeError::Io(e) => logger::log_error(&format!("I/O failure serving '{path}': {e}")),
        ServeError::BadRequest(_) | ServeError::MethodNotAllowed { .. } => {
            logger::log_warning(&format!("Rejected request for '{path}': {err}"));
        }
    }
    http::build_error_response(err)
}
