pub mod settings;

pub use settings::{DetectionConfig, LoggingConfig, RulesConfig, Settings};
