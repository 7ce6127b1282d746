use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub preview: PreviewConfig,
    /// Maximum request body size in bytes
    pub max_body_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

/// Upper bound for the preview retention windows (one year).
pub const MAX_RETENTION_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Eviction policy of the report preview cache.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Entries older than this are always deleted (seconds)
    pub retention_seconds: u64,
    /// Entries older than this are deleted while the cache is over its size ceiling (seconds)
    pub pressure_retention_seconds: u64,
    /// Ceiling for the summed size of cached pdf files in bytes
    pub max_cache_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            retention_seconds: 3 * 60,
            pressure_retention_seconds: 10,
            max_cache_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            preview: PreviewConfig::default(),
            max_body_size: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_address = lookup("BIND_ADDRESS").unwrap_or(defaults.server.bind_address);
        let data_dir = lookup("DATA_DIR").unwrap_or(defaults.server.data_dir);

        let max_body_size = parse_number(&lookup, "MAX_BODY_SIZE")?.unwrap_or(defaults.max_body_size);

        let retention_seconds = parse_number(&lookup, "PREVIEW_RETENTION_SECONDS")?
            .unwrap_or(defaults.preview.retention_seconds);
        let pressure_retention_seconds = parse_number(&lookup, "PREVIEW_PRESSURE_RETENTION_SECONDS")?
            .unwrap_or(defaults.preview.pressure_retention_seconds);
        let max_cache_size = parse_number(&lookup, "PREVIEW_MAX_CACHE_SIZE")?
            .unwrap_or(defaults.preview.max_cache_size);

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            preview: PreviewConfig {
                retention_seconds,
                pressure_retention_seconds,
                max_cache_size,
            },
            max_body_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.data_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.preview.retention_seconds == 0 || self.preview.pressure_retention_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "preview retention windows must be greater than 0".to_string(),
            ));
        }

        if self.preview.retention_seconds > MAX_RETENTION_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "PREVIEW_RETENTION_SECONDS must not exceed {MAX_RETENTION_SECONDS}"
            )));
        }

        if self.preview.pressure_retention_seconds > self.preview.retention_seconds {
            return Err(ConfigError::ValidationError(
                "PREVIEW_PRESSURE_RETENTION_SECONDS must not exceed PREVIEW_RETENTION_SECONDS"
                    .to_string(),
            ));
        }

        if self.max_body_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<F>(lookup: &F, name: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::ValidationError(format!("{name} must be a non-negative integer"))
        }),
        None => Ok(None),
    }
}
