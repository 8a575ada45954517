/// RuleSet: the immutable, ordered collection of compiled rules evaluated per packet
use super::matcher::{matches, ContentPrefilter};
use super::parser::{compile, RuleError};
use super::rule::{CompiledRule, Protocol};
use crate::config::RulesConfig;
use crate::error::{NidsError, Result};
use crate::packet::PacketView;
use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to do when one line of a rule text fails to compile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Report the bad rule and keep loading the others
    #[default]
    Skip,
    /// Fail the whole load on the first bad rule
    Abort,
}

/// A rule line that failed to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    /// 1-based line number
    pub line: usize,
    pub text: String,
    pub error: RuleError,
}

/// Outcome of compiling a rule text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: Vec<RejectedRule>,
}

/// Compiled rules in load order, with a content prefilter
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Arc<CompiledRule>>,
    prefilter: ContentPrefilter,
}

impl RuleSet {
    /// Create a new empty rule set
    pub fn new() -> Self {
        Self::from_rules(Vec::new())
    }

    /// Build a rule set from already compiled rules, keeping their order
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = CompiledRule>,
    {
        let rules: Vec<Arc<CompiledRule>> = rules.into_iter().map(Arc::new).collect();
        let prefilter = ContentPrefilter::build(&rules);
        Self { rules, prefilter }
    }

    /// Compile a rule text, one rule per line.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn compile_str(text: &str, policy: LoadPolicy) -> Result<(Self, LoadReport)> {
        let mut compiled = Vec::new();
        let mut report = LoadReport::default();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_num = idx + 1;
            let line = raw_line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match compile(raw_line) {
                Ok(rule) => compiled.push(rule),
                Err(error) => match policy {
                    LoadPolicy::Skip => {
                        warn!("Skipping rule on line {}: {} ({})", line_num, error, line);
                        report.rejected.push(RejectedRule {
                            line: line_num,
                            text: raw_line.to_string(),
                            error,
                        });
                    }
                    LoadPolicy::Abort => {
                        return Err(NidsError::Rule {
                            line: line_num,
                            rule: raw_line.to_string(),
                            source: error,
                        });
                    }
                },
            }
        }

        report.loaded = compiled.len();
        info!(
            "Loaded {} rules ({} rejected)",
            report.loaded,
            report.rejected.len()
        );

        Ok((Self::from_rules(compiled), report))
    }

    /// Load rules from a file, one rule per line
    pub fn load_file<P: AsRef<Path>>(path: P, policy: LoadPolicy) -> Result<(Self, LoadReport)> {
        info!("Loading rules from: {:?}", path.as_ref());
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::compile_str(&text, policy)
    }

    /// Load a rules file with the policy from the rules settings
    pub fn load_configured<P: AsRef<Path>>(
        path: P,
        config: &RulesConfig,
    ) -> Result<(Self, LoadReport)> {
        Self::load_file(path, config.load_policy)
    }

    /// Rules whose predicate holds for the packet, in load order
    pub fn matching<P: PacketView + ?Sized>(&self, packet: &P) -> Vec<Arc<CompiledRule>> {
        let candidates = self.prefilter.candidates(packet.transport_payload());

        self.rules
            .iter()
            .zip(candidates)
            .filter(|(rule, candidate)| *candidate && matches(rule, packet))
            .map(|(rule, _)| rule.clone())
            .collect()
    }

    /// Get a rule by its load position
    pub fn get(&self, index: usize) -> Option<Arc<CompiledRule>> {
        self.rules.get(index).cloned()
    }

    /// All rules in load order
    pub fn rules(&self) -> &[Arc<CompiledRule>] {
        &self.rules
    }

    /// Get number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if rule set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get statistics about the rule set
    pub fn stats(&self) -> RuleSetStats {
        let mut by_protocol = AHashMap::new();
        let mut without_options = 0;

        for rule in &self.rules {
            *by_protocol.entry(rule.protocol).or_insert(0) += 1;
            if rule.options.is_empty() {
                without_options += 1;
            }
        }

        RuleSetStats {
            total_rules: self.rules.len(),
            content_patterns: self.prefilter.pattern_count(),
            without_options,
            by_protocol,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a rule set
#[derive(Debug, Clone)]
pub struct RuleSetStats {
    pub total_rules: usize,
    pub content_patterns: usize,
    pub without_options: usize,
    pub by_protocol: AHashMap<Protocol, usize>,
}

impl std::fmt::Display for RuleSetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rule Set Statistics:")?;
        writeln!(f, "  Total rules: {}", self.total_rules)?;
        writeln!(f, "  Content patterns: {}", self.content_patterns)?;
        writeln!(f, "  Rules without options: {}", self.without_options)?;
        writeln!(f, "  By protocol:")?;
        for (proto, count) in &self.by_protocol {
            writeln!(f, "    {}: {}", proto, count)?;
        }
        Ok(())
    }
}

/// Process-wide handle to the current rule set.
///
/// `snapshot` takes the read lock only long enough to clone the `Arc`, and
/// evaluation then runs with no lock held. A reload compiles first and then
/// publishes the whole new `RuleSet` under one short write lock, so an
/// evaluation never sees a partially updated collection.
#[derive(Debug, Clone)]
pub struct SharedRuleSet {
    current: Arc<RwLock<Arc<RuleSet>>>,
}

impl SharedRuleSet {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(rules))),
        }
    }

    /// The rule set in effect right now
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.read().clone()
    }

    /// Publish a new rule set, returning the one it replaces
    pub fn replace(&self, rules: RuleSet) -> Arc<RuleSet> {
        let rules = Arc::new(rules);
        let previous = std::mem::replace(&mut *self.current.write(), rules);
        debug!("Replaced rule set ({} rules before)", previous.len());
        previous
    }

    /// Compile `text` and publish it; on error the current rule set stays in place
    pub fn reload_str(&self, text: &str, policy: LoadPolicy) -> Result<LoadReport> {
        let (rules, report) = RuleSet::compile_str(text, policy)?;
        info!("Reloading rule set with {} rules", rules.len());
        self.replace(rules);
        Ok(report)
    }

    /// Load `path` and publish it; on error the current rule set stays in place
    pub fn reload_file<P: AsRef<Path>>(&self, path: P, policy: LoadPolicy) -> Result<LoadReport> {
        let (rules, report) = RuleSet::load_file(path, policy)?;
        self.replace(rules);
        Ok(report)
    }
}

impl Default for SharedRuleSet {
    fn default() -> Self {
        Self::new(RuleSet::new())
    }
}
