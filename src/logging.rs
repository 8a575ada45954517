/// Tracing subscriber setup driven by `LoggingConfig`
use crate::config::LoggingConfig;
use crate::error::{NidsError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for the configured level.
///
/// Decoder tracing is noisy at debug level, so it is held at `warn` unless
/// decode logging was asked for.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let level = config.level.to_ascii_lowercase();
    let mut directives = format!("ks_nids={}", level);

    if !config.decode_logging {
        directives.push_str(",ks_nids::decoders=warn");
    }

    directives
}

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config))
            .map_err(|e| NidsError::Config(format!("Invalid log filter: {}", e)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init(),
        _ => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
    };

    installed.map_err(|e| NidsError::Config(format!("Failed to install logger: {}", e)))
}
