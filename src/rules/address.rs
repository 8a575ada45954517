/// Address ranges used on either side of a rule
use ipnetwork::IpNetwork;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, map_res, value},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};
use std::fmt;
use std::net::IpAddr;

/// IP address specification (any, single address, CIDR network, list, or negation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressRange {
    /// Any IP address
    Any,
    /// Single address or CIDR network (e.g., 10.0.0.0/8)
    Network(IpNetwork),
    /// Any of the listed ranges
    List(Vec<AddressRange>),
    /// Everything the inner range does not contain
    Not(Box<AddressRange>),
}

impl AddressRange {
    /// Parse a rule address token such as `any`, `10.0.0.0/8` or `[10.0.0.0/8,!10.1.0.0/16]`
    pub fn parse(token: &str) -> Option<Self> {
        all_consuming(address_spec)(token)
            .ok()
            .map(|(_, range)| range)
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match self {
            AddressRange::Any => true,
            AddressRange::Network(network) => network.contains(addr),
            AddressRange::List(list) => list.iter().any(|range| range.contains(addr)),
            AddressRange::Not(inner) => !inner.contains(addr),
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRange::Any => write!(f, "any"),
            AddressRange::Network(network) => write!(f, "{}", network),
            AddressRange::List(list) => {
                write!(f, "[")?;
                for (i, range) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", range)?;
                }
                write!(f, "]")
            }
            AddressRange::Not(inner) => write!(f, "!{}", inner),
        }
    }
}

fn address_spec(input: &str) -> IResult<&str, AddressRange> {
    alt((
        // Negated range
        map(preceded(char('!'), address_spec), |range| {
            AddressRange::Not(Box::new(range))
        }),
        // List of ranges
        map(
            delimited(char('['), separated_list1(char(','), address_spec), char(']')),
            AddressRange::List,
        ),
        value(AddressRange::Any, tag("any")),
        map(network, AddressRange::Network),
    ))(input)
}

/// IPv4 or IPv6 address with optional prefix length
fn network(input: &str) -> IResult<&str, IpNetwork> {
    map_res(take_while1(is_network_char), |s: &str| s.parse::<IpNetwork>())(input)
}

fn is_network_char(c: char) -> bool {
    c.is_ascii_hexdigit() || c == '.' || c == ':' || c == '/'
}
