use crate::error::{NidsError, Result};
use crate::rules::LoadPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RulesConfig {
    /// What to do with a rule that fails to compile
    #[serde(default)]
    pub load_policy: LoadPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// 0 picks a count from the number of CPUs
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_packet_queue_size")]
    pub packet_queue_size: usize,
    #[serde(default = "default_alert_queue_size")]
    pub alert_queue_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub decode_logging: bool,
}

// Default value functions
fn default_packet_queue_size() -> usize {
    10_000
}

fn default_alert_queue_size() -> usize {
    1_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            packet_queue_size: default_packet_queue_size(),
            alert_queue_size: default_alert_queue_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            decode_logging: false,
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            NidsError::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate worker threads
        if self.detection.worker_threads > 1000 {
            return Err(NidsError::Config(
                "Worker threads cannot exceed 1000".to_string(),
            ));
        }

        // Validate queue sizes
        if self.detection.packet_queue_size == 0 {
            return Err(NidsError::Config(
                "Packet queue size must be greater than 0".to_string(),
            ));
        }

        if self.detection.alert_queue_size == 0 {
            return Err(NidsError::Config(
                "Alert queue size must be greater than 0".to_string(),
            ));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(NidsError::Config(format!(
                "Unknown log level: {}",
                self.logging.level
            )));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(NidsError::Config(format!(
                "Unknown log format: {} (expected text or json)",
                self.logging.format
            )));
        }

        Ok(())
    }

    pub fn default_config() -> Self {
        Settings {
            rules: RulesConfig {
                load_policy: LoadPolicy::Skip,
            },
            detection: DetectionConfig {
                worker_threads: 0,
                packet_queue_size: 10_000,
                alert_queue_size: 1_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                decode_logging: false,
            },
        }
    }
}
