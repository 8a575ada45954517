/// Rule compiler: turns one line of rule text into a `CompiledRule`
///
/// Grammar:
/// `action protocol src_addr src_ports -> dst_addr dst_ports [(key:value; ...)]`
use super::address::AddressRange;
use super::ports::PortRange;
use super::rule::{Action, CompiledRule, Endpoint, Protocol, RuleOptions};
use thiserror::Error;
use tracing::{debug, trace};

/// Number of mandatory header tokens
const HEADER_TOKENS: usize = 7;

/// Rule compilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("a rule must include mandatory elements: action protocol src_ips src_ports -> dst_ips dst_ports")]
    MalformedRule,

    #[error("incorrect action: '{0}'")]
    InvalidAction(String),

    #[error("incorrect protocol: '{0}'")]
    InvalidProtocol(String),

    #[error("incorrect {field} ips: '{token}'")]
    InvalidAddress { field: Endpoint, token: String },

    #[error("incorrect {field} ports: '{token}'")]
    InvalidPorts { field: Endpoint, token: String },

    #[error("incorrect option: '{0}'")]
    InvalidOption(String),

    #[error("incorrect value for option '{key}': '{value}'")]
    InvalidOptionValue { key: String, value: String },
}

/// Compile a single rule
/// Example: alert tcp 10.0.0.0/8 any -> any 80 (msg: web; content:"GET")
pub fn compile(text: &str) -> Result<CompiledRule, RuleError> {
    let line = text.trim();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() < HEADER_TOKENS {
        return Err(RuleError::MalformedRule);
    }

    let action = parse_action(tokens[0])?;
    let protocol = parse_protocol(tokens[1])?;

    let src_addresses = parse_addresses(Endpoint::Source, tokens[2])?;
    let src_ports = parse_ports(Endpoint::Source, tokens[3])?;

    // tokens[4] is the direction arrow; only its position matters

    let dst_addresses = parse_addresses(Endpoint::Destination, tokens[5])?;
    let dst_ports = parse_ports(Endpoint::Destination, tokens[6])?;

    let options = match line.find('(') {
        Some(start) => parse_options(&line[start + 1..])?,
        None => RuleOptions::default(),
    };

    debug!("Compiled rule: {}", line);

    Ok(CompiledRule {
        action,
        protocol,
        src_addresses,
        src_ports,
        dst_addresses,
        dst_ports,
        options,
        source: text.to_string(),
    })
}

fn parse_action(token: &str) -> Result<Action, RuleError> {
    match token {
        "alert" => Ok(Action::Alert),
        _ => Err(RuleError::InvalidAction(token.to_string())),
    }
}

fn parse_protocol(token: &str) -> Result<Protocol, RuleError> {
    match token {
        "tcp" => Ok(Protocol::Tcp),
        "udp" => Ok(Protocol::Udp),
        "http" => Ok(Protocol::Http),
        _ => Err(RuleError::InvalidProtocol(token.to_string())),
    }
}

fn parse_addresses(field: Endpoint, token: &str) -> Result<AddressRange, RuleError> {
    AddressRange::parse(token).ok_or_else(|| RuleError::InvalidAddress {
        field,
        token: token.to_string(),
    })
}

fn parse_ports(field: Endpoint, token: &str) -> Result<PortRange, RuleError> {
    PortRange::parse(token).ok_or_else(|| RuleError::InvalidPorts {
        field,
        token: token.to_string(),
    })
}

/// Parse the options block (text after the first `(`)
fn parse_options(block: &str) -> Result<RuleOptions, RuleError> {
    let block = block.trim_end();
    let block = block.strip_suffix(')').unwrap_or(block);

    let mut options = RuleOptions::default();

    for fragment in block.split(';') {
        let Some((key, value)) = fragment.split_once(':') else {
            if !fragment.trim().is_empty() {
                trace!("Ignoring option fragment without ':': {:?}", fragment);
            }
            continue;
        };

        let key = key.trim();
        let value = value.trim();

        // Later occurrences overwrite earlier ones
        match key {
            "msg" => options.msg = Some(value.to_string()),
            "tos" => options.tos = Some(parse_number(key, value)?),
            "len" => options.header_length = Some(parse_number(key, value)?),
            "offset" => options.fragment_offset = Some(parse_number(key, value)?),
            "seq" => options.seq = Some(parse_number(key, value)?),
            "ack" => options.ack = Some(parse_number(key, value)?),
            "flags" => options.flags = Some(value.to_string()),
            "http_request" => options.http_request = Some(strip_quotes(value).to_string()),
            "content" => options.content = Some(strip_quotes(value).to_string()),
            _ => return Err(RuleError::InvalidOption(key.to_string())),
        }
    }

    Ok(options)
}

/// Parse an integer option value.
///
/// Any optionally signed run of decimal digits is accepted. Values beyond
/// the `i64` range saturate, which is still far outside every packet field.
fn parse_number(key: &str, value: &str) -> Result<i64, RuleError> {
    if let Ok(number) = value.parse::<i64>() {
        return Ok(number);
    }

    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(if negative { i64::MIN } else { i64::MAX });
    }

    Err(RuleError::InvalidOptionValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Remove one leading and one trailing `"`, each independently
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_suffix('"').unwrap_or(value);
    value.strip_prefix('"').unwrap_or(value)
}
