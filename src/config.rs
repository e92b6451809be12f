use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "SKINCHECK";
pub const DEFAULT_CONFIG_FILE: &str = "skincheck.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub backend: BackendConfig,
    pub upload: UploadConfig,
    pub capture: CaptureConfig,
    pub presentation: PresentationConfig,
    pub status_channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub endpoints: Endpoints,
}

/// Paths of the backend routes, relative to `base_url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub detect_location: String,
    pub upload: String,
    pub analyze: String,
    pub export_csv: String,
    pub export_db: String,
    pub count_analyses: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub jpeg_quality: u8,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Label that introduces the UV reading inside the result markup.
    pub uv_label: String,
    pub unavailable_text: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            upload: UploadConfig::default(),
            capture: CaptureConfig::default(),
            presentation: PresentationConfig::default(),
            status_channel_capacity: 32,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 30_000,
            endpoints: Endpoints::default(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            detect_location: "/detect_location".to_string(),
            upload: "/upload".to_string(),
            analyze: "/analyze".to_string(),
            export_csv: "/export".to_string(),
            export_db: "/export_db".to_string(),
            count_analyses: "/count_analyses".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 16 * 1024 * 1024,
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            file_name: "capture.jpg".to_string(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            uv_label: "Índice UV:".to_string(),
            unavailable_text: "unavailable".to_string(),
        }
    }
}

impl Configuration {
    /// Layers the optional config file, then `SKINCHECK__*` environment
    /// variables, over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let configuration: Configuration = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Message("backend.base_url must not be empty".to_string()));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::Message(
                "upload.allowed_extensions must list at least one extension".to_string(),
            ));
        }
        if self.presentation.uv_label.trim().is_empty() {
            return Err(ConfigError::Message(
                "presentation.uv_label must not be empty".to_string(),
            ));
        }
        if self.status_channel_capacity == 0 {
            return Err(ConfigError::Message(
                "status_channel_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_backend_routes() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(
            configuration.backend.url(&configuration.backend.endpoints.analyze),
            "http://localhost:5000/analyze"
        );
        assert_eq!(configuration.upload.max_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn url_joins_without_doubled_slashes() {
        let backend = BackendConfig {
            base_url: "https://skin.example/api/".to_string(),
            ..BackendConfig::default()
        };
        assert_eq!(backend.url("/upload"), "https://skin.example/api/upload");
        assert_eq!(backend.url("upload"), "https://skin.example/api/upload");
    }

    #[test]
    fn loads_overrides_from_file() {
        let path = std::env::temp_dir().join(format!("skincheck-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"http://10.0.0.2:8080\"\n\n[backend.endpoints]\nupload = \"/upload_photo\"\n",
        )
        .unwrap();

        let configuration = Configuration::load(Some(&path)).unwrap();
        assert_eq!(configuration.backend.base_url, "http://10.0.0.2:8080");
        assert_eq!(configuration.backend.endpoints.upload, "/upload_photo");
        assert_eq!(configuration.backend.endpoints.analyze, "/analyze");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rejects_empty_extension_list() {
        let mut configuration = Configuration::default();
        configuration.upload.allowed_extensions.clear();
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn rejects_blank_uv_label() {
        let mut configuration = Configuration::default();
        configuration.presentation.uv_label = "  ".to_string();
        assert!(configuration.validate().is_err());
    }
}
