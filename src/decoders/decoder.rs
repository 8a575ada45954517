use crate::decoders::ethernet::{self, EtherType};
use crate::decoders::ip::{self, IpProtocol};
use crate::decoders::{http, tcp, udp};
use crate::error::{NidsError, Result};
use crate::packet::{DecodedPacket, IpLayer, RawPacket, TransportLayer};
use std::sync::Arc;
use tracing::{debug, trace};

/// Main packet decoder - decodes all protocol layers.
///
/// Decoding stops at the first layer that fails; whatever was decoded up to
/// that point is still returned so rules that only need outer layers can run.
#[derive(Debug, Clone, Copy)]
pub struct PacketDecoder {
    decode_ethernet: bool,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self {
            decode_ethernet: true,
        }
    }

    /// Decoder for captures without a link layer (frames start at the IP header)
    pub fn raw_ip() -> Self {
        Self {
            decode_ethernet: false,
        }
    }

    /// Decode a raw packet into structured layers
    pub fn decode(&self, raw: RawPacket) -> Result<DecodedPacket> {
        if raw.data.is_empty() {
            return Err(NidsError::Decode("Empty packet".to_string()));
        }

        let data = Arc::clone(&raw.data);
        let mut decoded = DecodedPacket::new(raw);
        let mut payload: &[u8] = &data;

        // Layer 2: Ethernet
        if self.decode_ethernet {
            match ethernet::decode_ethernet(payload) {
                Ok((eth_header, rest)) => {
                    trace!(
                        "Ethernet: {} -> {}, EtherType: 0x{:04x}",
                        ethernet::format_mac(&eth_header.src_mac),
                        ethernet::format_mac(&eth_header.dst_mac),
                        eth_header.ethertype
                    );
                    let ethertype = EtherType::from(eth_header.ethertype);
                    decoded.ethernet = Some(eth_header);
                    payload = rest;

                    if !matches!(ethertype, EtherType::Ipv4 | EtherType::Ipv6) {
                        trace!("Unsupported EtherType: {:?}", ethertype);
                        return Ok(decoded);
                    }
                }
                Err(e) => {
                    debug!("Failed to decode Ethernet: {}", e);
                    return Ok(decoded);
                }
            }
        }

        // Layer 3: IP
        let (ip_layer, rest) = match ip::decode_ip(payload) {
            Ok(decoded_ip) => decoded_ip,
            Err(e) => {
                debug!("Failed to decode IP: {}", e);
                return Ok(decoded);
            }
        };

        let protocol = match &ip_layer {
            IpLayer::V4(header) => {
                trace!(
                    "IPv4: {} -> {}, Protocol: {}, TOS: {}",
                    header.src_addr,
                    header.dst_addr,
                    header.protocol,
                    header.tos
                );
                header.protocol
            }
            IpLayer::V6(header) => {
                trace!(
                    "IPv6: {} -> {}, Next Header: {}",
                    header.src_addr,
                    header.dst_addr,
                    header.next_header
                );
                header.next_header
            }
        };
        decoded.ip = Some(ip_layer);

        // Layer 4: Transport
        decoded.transport = match IpProtocol::from(protocol) {
            IpProtocol::Tcp => match tcp::decode_tcp(rest) {
                Ok(segment) => {
                    trace!(
                        "TCP: {} -> {}, Flags: {}, Seq: {}",
                        segment.src_port,
                        segment.dst_port,
                        segment.flags,
                        segment.seq
                    );
                    Some(TransportLayer::Tcp(segment))
                }
                Err(e) => {
                    debug!("Failed to decode TCP: {}", e);
                    None
                }
            },
            IpProtocol::Udp => match udp::decode_udp(rest) {
                Ok(datagram) => {
                    trace!(
                        "UDP: {} -> {}, Length: {}",
                        datagram.src_port,
                        datagram.dst_port,
                        datagram.length
                    );
                    Some(TransportLayer::Udp(datagram))
                }
                Err(e) => {
                    debug!("Failed to decode UDP: {}", e);
                    None
                }
            },
            IpProtocol::Other(other) => {
                trace!("Unsupported IP protocol: {}", other);
                None
            }
        };

        // Application layer: only HTTP requests over TCP are recognised
        decoded.http = decoded
            .tcp()
            .and_then(|segment| http::parse_request_line(&segment.payload));

        if let Some(request) = &decoded.http {
            trace!("HTTP: {} {:?}", request.method, request.uri);
        }

        Ok(decoded)
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}
