//! Request error taxonomy
//!
//! Every failure a handler can hit maps to exactly one HTTP status. The
//! `Display` output is for server-side logs only; clients get
//! [`ServeError::public_message`].

use hyper::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    /// Resolved path falls outside the served root
    #[error("path escapes the served root")]
    PathEscape,

    #[error("no such file or directory")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("method not allowed")]
    MethodNotAllowed { allow: &'static str },
}

impl ServeError {
    /// Classify a filesystem error on a resolved path
    ///
    /// A missing entry, or a path that walks through a regular file, is a
    /// plain 404; everything else is an I/O failure.
    pub fn from_lookup(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::NotFound,
            _ => Self::Io(err),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PathEscape => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Short plain-text reason safe to send to the client
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::PathEscape => "403 Forbidden",
            Self::NotFound => "404 Not Found",
            Self::BadRequest(reason) => reason,
            Self::Io(_) => "500 Internal Server Error",
            Self::MethodNotAllowed { .. } => "405 Method Not Allowed",
        }
    }
}
