// Application state module
// Immutable per-process state shared by every request

use std::io;

use super::types::Config;
use crate::resolver::PathResolver;

/// Application state
///
/// Built once at startup and shared behind an `Arc`. Nothing in here is
/// mutated after construction, so handlers may run concurrently without
/// coordination.
pub struct AppState {
    pub config: Config,
    pub resolver: PathResolver,
}

impl AppState {
    /// Create the served root if it is missing and pin its canonical form
    pub fn new(config: &Config) -> io::Result<Self> {
        std::fs::create_dir_all(&config.storage.root)?;
        let resolver = PathResolver::new(&config.storage.root)?;

        Ok(Self {
            config: config.clone(),
            resolver,
        })
    }

    /// Upper bound on an upload body, in bytes
    pub const fn max_upload_size(&self) -> u64 {
        self.config.storage.max_upload_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.root = dir.path().join("nested").join("files");

        let state = AppState::new(&config).unwrap();
        assert!(config.storage.root.is_dir());
        assert_eq!(
            state.resolver.root(),
            config.storage.root.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_root_that_is_a_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        let mut config = Config::default();
        config.storage.root = file;
        assert!(AppState::new(&config).is_err());
    }
}
