/// Port ranges used on either side of a rule
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, value, verify},
    multi::separated_list1,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};
use std::fmt;

/// Port specification (any, single port, inclusive range, list, or negation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRange {
    /// Any port
    Any,
    /// Specific port
    Port(u16),
    /// Inclusive range
    Range(u16, u16),
    /// Any of the listed ranges
    List(Vec<PortRange>),
    /// Everything the inner range does not contain
    Not(Box<PortRange>),
}

impl PortRange {
    /// Parse a rule port token such as `any`, `80`, `1024:`, or `[80,443,8000:8100]`
    pub fn parse(token: &str) -> Option<Self> {
        all_consuming(port_spec)(token).ok().map(|(_, range)| range)
    }

    pub fn contains(&self, port: u16) -> bool {
        match self {
            PortRange::Any => true,
            PortRange::Port(p) => *p == port,
            PortRange::Range(start, end) => (*start..=*end).contains(&port),
            PortRange::List(list) => list.iter().any(|range| range.contains(port)),
            PortRange::Not(inner) => !inner.contains(port),
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRange::Any => write!(f, "any"),
            PortRange::Port(port) => write!(f, "{}", port),
            PortRange::Range(start, end) => write!(f, "{}:{}", start, end),
            PortRange::List(list) => {
                write!(f, "[")?;
                for (i, range) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", range)?;
                }
                write!(f, "]")
            }
            PortRange::Not(inner) => write!(f, "!{}", inner),
        }
    }
}

fn port_spec(input: &str) -> IResult<&str, PortRange> {
    alt((
        // Negated port
        map(preceded(char('!'), port_spec), |range| {
            PortRange::Not(Box::new(range))
        }),
        // List of ports
        map(
            delimited(char('['), separated_list1(char(','), port_spec), char(']')),
            PortRange::List,
        ),
        value(PortRange::Any, tag("any")),
        // Port range: 80:443
        map(
            verify(
                separated_pair(parse_u16, char(':'), parse_u16),
                |&(start, end): &(u16, u16)| start <= end,
            ),
            |(start, end)| PortRange::Range(start, end),
        ),
        // Open-ended ranges: 1024: and :1023
        map(terminated(parse_u16, char(':')), |start| {
            PortRange::Range(start, u16::MAX)
        }),
        map(preceded(char(':'), parse_u16), |end| PortRange::Range(0, end)),
        map(parse_u16, PortRange::Port),
    ))(input)
}

fn parse_u16(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |s: &str| s.parse::<u16>())(input)
}
