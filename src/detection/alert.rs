use crate::rules::{Action, CompiledRule};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// A rule that matched a packet, paired with the action it asks for
#[derive(Debug, Clone)]
pub struct Alert {
    /// Capture time of the packet that triggered the rule
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub message: Option<String>,
    pub rule: Arc<CompiledRule>,
}

impl Alert {
    pub fn new(timestamp: DateTime<Utc>, rule: Arc<CompiledRule>) -> Self {
        Self {
            timestamp,
            action: rule.action,
            message: rule.message().map(str::to_string),
            rule,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
            self.action,
            self.message.as_deref().unwrap_or("(no message)")
        )?;
        write!(f, " {{{}}}", self.rule.protocol)
    }
}
