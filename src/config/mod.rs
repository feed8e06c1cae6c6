// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig};

use types::{
    DEFAULT_ACCESS_LOG_FORMAT, DEFAULT_HOST, DEFAULT_IO_TIMEOUT, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT, DEFAULT_ROOT, DEFAULT_SHUTDOWN_TIMEOUT,
    DEFAULT_UPLOAD_PATH,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the config file
    /// (optional), then `DIRSERVE_` environment variables with `__` as the
    /// nesting separator (e.g. `DIRSERVE_STORAGE__ROOT=/srv/files`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("storage.root", DEFAULT_ROOT)?
            .set_default("storage.max_upload_size", DEFAULT_MAX_UPLOAD_SIZE)?
            .set_default("storage.upload_path", DEFAULT_UPLOAD_PATH)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", DEFAULT_ACCESS_LOG_FORMAT)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", DEFAULT_IO_TIMEOUT)?
            .set_default("performance.write_timeout", DEFAULT_IO_TIMEOUT)?
            .set_default("performance.shutdown_timeout", DEFAULT_SHUTDOWN_TIMEOUT)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DIRSERVE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(invalid("storage.root must not be empty"));
        }
        if self.storage.max_upload_size == 0 {
            return Err(invalid("storage.max_upload_size must be greater than zero"));
        }
        if !self.storage.upload_path.starts_with('/') || self.storage.upload_path == "/" {
            return Err(invalid(
                "storage.upload_path must be an absolute path other than '/'",
            ));
        }
        if self.server.workers == Some(0) {
            return Err(invalid("server.workers must be greater than zero"));
        }
        if self.performance.read_timeout == 0 || self.performance.write_timeout == 0 {
            return Err(invalid("performance timeouts must be greater than zero"));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn invalid(message: &str) -> config::ConfigError {
    config::ConfigError::Message(message.to_string())
}
