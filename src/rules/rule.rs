/// Compiled detection rule structures
use super::address::AddressRange;
use super::ports::PortRange;
use std::fmt;

/// Rule action to take when a match occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Generate an alert
    Alert,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Alert => write!(f, "alert"),
        }
    }
}

/// Protocol to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    /// TCP carrying an HTTP request
    Http,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::Http => write!(f, "http"),
        }
    }
}

/// Which side of the arrow a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Destination => write!(f, "destination"),
        }
    }
}

/// Optional field constraints from the rule body.
///
/// `None` means the rule never mentioned the option and the matcher does
/// not look at it; it is never read as a zero-valued constraint.
///
/// Numeric options hold any integer the rule gave. A value outside the
/// width of the packet field compiles but can never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    /// Rule message, reported with alerts only
    pub msg: Option<String>,
    /// IP type-of-service
    pub tos: Option<i64>,
    /// IP header length (IHL)
    pub header_length: Option<i64>,
    /// IP fragment offset
    pub fragment_offset: Option<i64>,
    /// TCP sequence number
    pub seq: Option<i64>,
    /// TCP acknowledgment number
    pub ack: Option<i64>,
    /// TCP flag letters that must all be set
    pub flags: Option<String>,
    /// First token of the HTTP request line
    pub http_request: Option<String>,
    /// Payload substring
    pub content: Option<String>,
}

impl RuleOptions {
    /// True when no option at all was given
    pub fn is_empty(&self) -> bool {
        *self == RuleOptions::default()
    }
}

/// A rule compiled from one line of rule text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub action: Action,
    pub protocol: Protocol,
    pub src_addresses: AddressRange,
    pub src_ports: PortRange,
    pub dst_addresses: AddressRange,
    pub dst_ports: PortRange,
    pub options: RuleOptions,
    /// Rule text exactly as given
    pub source: String,
}

impl CompiledRule {
    /// Get the rule's message
    pub fn message(&self) -> Option<&str> {
        self.options.msg.as_deref()
    }

    /// Original rule text
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
