//! Request handler module
//!
//! Routing dispatch plus the two request handlers: reading the file tree
//! (listings and downloads) and receiving uploads.

pub mod files;
pub mod listing;
pub mod router;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
