// Packet model shared by the decoders, the rule matcher and the detection engine
pub mod view;

#[cfg(test)]
pub(crate) mod testutil;

pub use view::PacketView;

use chrono::{DateTime, Utc};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Raw packet with capture metadata
#[derive(Clone, Debug)]
pub struct RawPacket {
    pub timestamp: DateTime<Utc>,
    pub data: Arc<[u8]>,
    pub length: usize,
    pub caplen: usize,
}

impl RawPacket {
    pub fn new(timestamp: DateTime<Utc>, data: Vec<u8>) -> Self {
        let length = data.len();
        Self {
            timestamp,
            caplen: length,
            length,
            data: data.into(),
        }
    }
}

/// Decoded packet with protocol layers
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    pub raw: RawPacket,
    pub ethernet: Option<EthernetHeader>,
    pub ip: Option<IpLayer>,
    pub transport: Option<TransportLayer>,
    pub http: Option<HttpRequest>,
}

impl DecodedPacket {
    /// A packet with no decoded layers yet
    pub fn new(raw: RawPacket) -> Self {
        Self {
            raw,
            ethernet: None,
            ip: None,
            transport: None,
            http: None,
        }
    }

    pub fn tcp(&self) -> Option<&TcpSegment> {
        match self.transport {
            Some(TransportLayer::Tcp(ref segment)) => Some(segment),
            _ => None,
        }
    }

    pub fn udp(&self) -> Option<&UdpDatagram> {
        match self.transport {
            Some(TransportLayer::Udp(ref datagram)) => Some(datagram),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EthernetHeader {
    pub src_mac: [u8; 6],
    pub dst_mac: [u8; 6],
    pub ethertype: u16,
}

#[derive(Debug, Clone)]
pub enum IpLayer {
    V4(Ipv4Header),
    V6(Ipv6Header),
}

#[derive(Debug, Clone)]
pub struct Ipv4Header {
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub protocol: u8,
    pub tos: u8,
    /// Internet header length in 32-bit words
    pub ihl: u8,
    /// Fragment offset in 8-byte units
    pub fragment_offset: u16,
    pub ttl: u8,
    pub total_length: u16,
}

#[derive(Debug, Clone)]
pub struct Ipv6Header {
    pub src_addr: Ipv6Addr,
    pub dst_addr: Ipv6Addr,
    pub next_header: u8,
    pub traffic_class: u8,
    pub hop_limit: u8,
    pub payload_length: u16,
}

#[derive(Debug, Clone)]
pub enum TransportLayer {
    Tcp(TcpSegment),
    Udp(UdpDatagram),
}

#[derive(Debug, Clone)]
pub struct TcpSegment {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    pub flags: TcpFlags,
    pub window: u16,
    pub payload: Vec<u8>,
}

/// TCP control bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub fin: bool,
    pub syn: bool,
    pub rst: bool,
    pub psh: bool,
    pub ack: bool,
    pub urg: bool,
    pub ece: bool,
    pub cwr: bool,
}

impl TcpFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            fin: (byte & 0x01) != 0,
            syn: (byte & 0x02) != 0,
            rst: (byte & 0x04) != 0,
            psh: (byte & 0x08) != 0,
            ack: (byte & 0x10) != 0,
            urg: (byte & 0x20) != 0,
            ece: (byte & 0x40) != 0,
            cwr: (byte & 0x80) != 0,
        }
    }

    pub fn to_byte(&self) -> u8 {
        self.chars()
            .iter()
            .enumerate()
            .filter(|(_, (_, set))| *set)
            .fold(0u8, |byte, (bit, _)| byte | (1 << bit))
    }

    /// Whether the flag named by its single-letter code is set
    pub fn contains_char(&self, c: char) -> bool {
        self.chars()
            .iter()
            .any(|&(code, set)| set && code == c)
    }

    fn chars(&self) -> [(char, bool); 8] {
        [
            ('F', self.fin),
            ('S', self.syn),
            ('R', self.rst),
            ('P', self.psh),
            ('A', self.ack),
            ('U', self.urg),
            ('E', self.ece),
            ('C', self.cwr),
        ]
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (code, set) in self.chars() {
            if set {
                write!(f, "{}", code)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UdpDatagram {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
    pub payload: Vec<u8>,
}

/// Request line of an HTTP request carried in a TCP payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub uri: Option<String>,
    pub version: Option<String>,
}
