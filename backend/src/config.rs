use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::inference::preprocess::InputShape;

const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// `[height, width]` the model was trained on.
    pub input_size: [u32; 2],
    pub inference_timeout_ms: u64,
    /// Serve simulated predictions when the model cannot be loaded.
    pub allow_stub: bool,
    pub stub_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            frontend_dir: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./model/brain_tumor_detection_model.pt"),
            input_size: [128, 128],
            inference_timeout_ms: 30_000,
            allow_stub: false,
            stub_seed: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl ModelConfig {
    pub fn input_shape(&self) -> InputShape {
        InputShape {
            height: self.input_size[0],
            width: self.input_size[1],
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

impl AppConfig {
    /// Loads `.env`, the YAML file named by `TUMORSCAN_CONFIG` (or `config/app.yaml`),
    /// then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let path = std::env::var("TUMORSCAN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config_str =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(config_str)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.server.frontend_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }
        if let Some(size) = lookup("MODEL_INPUT_SIZE") {
            let size: u32 = parse_value("MODEL_INPUT_SIZE", &size)?;
            self.model.input_size = [size, size];
        }
        if let Some(timeout) = lookup("INFERENCE_TIMEOUT_MS") {
            self.model.inference_timeout_ms = parse_value("INFERENCE_TIMEOUT_MS", &timeout)?;
        }
        if let Some(allow) = lookup("ALLOW_STUB") {
            self.model.allow_stub = parse_value("ALLOW_STUB", &allow)?;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("REPORT_DIR") {
            self.storage.report_dir = PathBuf::from(dir);
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let [height, width] = self.model.input_size;
        if height == 0 || width == 0 {
            return Err(ConfigError::InvalidValue {
                key: "model.input_size",
                value: format!("{height}x{width}"),
            });
        }
        if self.model.inference_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "model.inference_timeout_ms",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
