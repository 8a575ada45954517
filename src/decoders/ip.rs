use crate::error::{NidsError, Result};
use crate::packet::{IpLayer, Ipv4Header, Ipv6Header};
use std::net::{Ipv4Addr, Ipv6Addr};

const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;

/// Transport protocols the rule engine looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        match value {
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Other(other),
        }
    }
}

/// Decode IPv4 header.
///
/// The returned payload is bounded by the total length field, so link-layer
/// padding never reaches the transport decoders.
pub fn decode_ipv4(data: &[u8]) -> Result<(Ipv4Header, &[u8])> {
    if data.len() < IPV4_MIN_HEADER_LEN {
        return Err(NidsError::Decode(
            "Packet too short for IPv4 header".to_string(),
        ));
    }

    let version = data[0] >> 4;
    if version != 4 {
        return Err(NidsError::Decode(format!(
            "Not an IPv4 packet (version {})",
            version
        )));
    }

    let ihl = data[0] & 0x0F;
    let header_len = ihl as usize * 4;
    if header_len < IPV4_MIN_HEADER_LEN {
        return Err(NidsError::Decode(format!("Invalid IPv4 IHL: {}", ihl)));
    }
    if data.len() < header_len {
        return Err(NidsError::Decode(
            "Packet too short for IPv4 header length".to_string(),
        ));
    }

    let tos = data[1];
    let total_length = u16::from_be_bytes([data[2], data[3]]);
    let fragment_offset = u16::from_be_bytes([data[6], data[7]]) & 0x1FFF;
    let ttl = data[8];
    let protocol = data[9];

    let src_addr = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
    let dst_addr = Ipv4Addr::new(data[16], data[17], data[18], data[19]);

    let header = Ipv4Header {
        src_addr,
        dst_addr,
        protocol,
        tos,
        ihl,
        fragment_offset,
        ttl,
        total_length,
    };

    // A bogus total length falls back to the captured bytes
    let end = match total_length as usize {
        len if len >= header_len && len <= data.len() => len,
        _ => data.len(),
    };

    Ok((header, &data[header_len..end]))
}

/// Decode IPv6 fixed header (extension headers are not walked)
pub fn decode_ipv6(data: &[u8]) -> Result<(Ipv6Header, &[u8])> {
    if data.len() < IPV6_HEADER_LEN {
        return Err(NidsError::Decode(
            "Packet too short for IPv6 header".to_string(),
        ));
    }

    let version_class_flow = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let version = (version_class_flow >> 28) as u8;

    if version != 6 {
        return Err(NidsError::Decode(format!(
            "Not an IPv6 packet (version {})",
            version
        )));
    }

    let traffic_class = ((version_class_flow >> 20) & 0xFF) as u8;
    let payload_length = u16::from_be_bytes([data[4], data[5]]);
    let next_header = data[6];
    let hop_limit = data[7];

    let mut src_bytes = [0u8; 16];
    let mut dst_bytes = [0u8; 16];
    src_bytes.copy_from_slice(&data[8..24]);
    dst_bytes.copy_from_slice(&data[24..40]);

    let header = Ipv6Header {
        src_addr: Ipv6Addr::from(src_bytes),
        dst_addr: Ipv6Addr::from(dst_bytes),
        next_header,
        traffic_class,
        hop_limit,
        payload_length,
    };

    let end = (IPV6_HEADER_LEN + payload_length as usize).min(data.len());

    Ok((header, &data[IPV6_HEADER_LEN..end]))
}

/// Decode IP layer (auto-detect IPv4 or IPv6)
pub fn decode_ip(data: &[u8]) -> Result<(IpLayer, &[u8])> {
    let Some(first) = data.first() else {
        return Err(NidsError::Decode("Empty IP packet".to_string()));
    };

    match first >> 4 {
        4 => {
            let (header, payload) = decode_ipv4(data)?;
            Ok((IpLayer::V4(header), payload))
        }
        6 => {
            let (header, payload) = decode_ipv6(data)?;
            Ok((IpLayer::V6(header), payload))
        }
        version => Err(NidsError::Decode(format!(
            "Unknown IP version: {}",
            version
        ))),
    }
}
