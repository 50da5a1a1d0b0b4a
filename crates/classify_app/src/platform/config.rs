use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use classify_engine::ClassifySettings;
use classify_logging::classify_info;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("endpoint {0:?} must use http or https")]
    UnsupportedScheme(String),
}

/// Optional settings file. Every field falls back to the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub form_field: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_bytes: Option<u64>,
    pub download_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        classify_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, String> {
        ron::from_str(content).map_err(|err| err.to_string())
    }

    /// Build engine settings; `endpoint_override` (from the command line) wins over the file.
    pub fn settings(&self, endpoint_override: Option<&str>) -> Result<ClassifySettings, ConfigError> {
        let defaults = ClassifySettings::default();
        let endpoint = endpoint_override
            .map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .unwrap_or(defaults.endpoint);
        validate_endpoint(&endpoint)?;

        Ok(ClassifySettings {
            endpoint,
            form_field: self.form_field.clone().unwrap_or(defaults.form_field),
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .or(defaults.request_timeout),
            max_bytes: self.max_bytes.unwrap_or(defaults.max_bytes),
        })
    }

    pub fn download_dir(&self, dir_override: Option<&Path>) -> PathBuf {
        dir_override
            .map(Path::to_path_buf)
            .or_else(|| self.download_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::UnsupportedScheme(endpoint.to_string())),
    }
}
