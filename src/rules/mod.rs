// Rule engine - rule compilation and packet matching
pub mod address;
pub mod matcher;
pub mod parser;
pub mod ports;
pub mod rule;
pub mod ruleset;

pub use address::AddressRange;
pub use matcher::{check_options, matches, ContentPrefilter};
pub use parser::{compile, RuleError};
pub use ports::PortRange;
pub use rule::{Action, CompiledRule, Endpoint, Protocol, RuleOptions};
pub use ruleset::{LoadPolicy, LoadReport, RejectedRule, RuleSet, RuleSetStats, SharedRuleSet};
