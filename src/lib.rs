//! Directory file server
//!
//! Serves a single directory tree over HTTP/1.1: directory listings and
//! file downloads on `GET`, plus one multipart upload endpoint that stores
//! files at the top of the tree.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resolver;
pub mod server;
