//! Capability view of a decoded packet.
//!
//! The rule matcher only ever asks a packet what it has. Every accessor
//! returns `None` (or an empty slice) when the packet lacks the layer that
//! would carry the field.

use super::{DecodedPacket, IpLayer, TcpFlags};
use std::net::IpAddr;

pub trait PacketView {
    /// Source and destination addresses of the IP layer
    fn ip_addresses(&self) -> Option<(IpAddr, IpAddr)>;

    /// IPv4 type-of-service (IPv6 traffic class)
    fn tos(&self) -> Option<u8>;

    /// IPv4 internet header length, in 32-bit words
    fn header_length(&self) -> Option<u8>;

    /// IPv4 fragment offset
    fn fragment_offset(&self) -> Option<u16>;

    /// TCP source and destination ports
    fn tcp_ports(&self) -> Option<(u16, u16)>;

    /// UDP source and destination ports
    fn udp_ports(&self) -> Option<(u16, u16)>;

    fn tcp_seq(&self) -> Option<u32>;

    fn tcp_ack(&self) -> Option<u32>;

    fn tcp_flags(&self) -> Option<TcpFlags>;

    /// TCP payload, else UDP payload, else empty
    fn transport_payload(&self) -> &[u8];

    /// TCP segment whose payload looks like an HTTP request
    fn is_http_request(&self) -> bool;

    fn has_ip_layer(&self) -> bool {
        self.ip_addresses().is_some()
    }

    fn has_tcp_layer(&self) -> bool {
        self.tcp_ports().is_some()
    }

    fn has_udp_layer(&self) -> bool {
        self.udp_ports().is_some()
    }

    /// First whitespace-delimited token of an HTTP request payload
    fn http_request_first_token(&self) -> Option<&[u8]> {
        if !self.is_http_request() {
            return None;
        }
        let payload = self.transport_payload();
        if payload.is_empty() {
            return None;
        }
        payload.split(|b| b.is_ascii_whitespace()).next()
    }
}

impl PacketView for DecodedPacket {
    fn ip_addresses(&self) -> Option<(IpAddr, IpAddr)> {
        match self.ip.as_ref()? {
            IpLayer::V4(h) => Some((IpAddr::V4(h.src_addr), IpAddr::V4(h.dst_addr))),
            IpLayer::V6(h) => Some((IpAddr::V6(h.src_addr), IpAddr::V6(h.dst_addr))),
        }
    }

    fn tos(&self) -> Option<u8> {
        match self.ip.as_ref()? {
            IpLayer::V4(h) => Some(h.tos),
            IpLayer::V6(h) => Some(h.traffic_class),
        }
    }

    fn header_length(&self) -> Option<u8> {
        match self.ip.as_ref()? {
            IpLayer::V4(h) => Some(h.ihl),
            IpLayer::V6(_) => None,
        }
    }

    fn fragment_offset(&self) -> Option<u16> {
        match self.ip.as_ref()? {
            IpLayer::V4(h) => Some(h.fragment_offset),
            IpLayer::V6(_) => None,
        }
    }

    fn tcp_ports(&self) -> Option<(u16, u16)> {
        self.tcp().map(|t| (t.src_port, t.dst_port))
    }

    fn udp_ports(&self) -> Option<(u16, u16)> {
        self.udp().map(|u| (u.src_port, u.dst_port))
    }

    fn tcp_seq(&self) -> Option<u32> {
        self.tcp().map(|t| t.seq)
    }

    fn tcp_ack(&self) -> Option<u32> {
        self.tcp().map(|t| t.ack)
    }

    fn tcp_flags(&self) -> Option<TcpFlags> {
        self.tcp().map(|t| t.flags)
    }

    fn transport_payload(&self) -> &[u8] {
        if let Some(tcp) = self.tcp() {
            &tcp.payload
        } else if let Some(udp) = self.udp() {
            &udp.payload
        } else {
            &[]
        }
    }

    fn is_http_request(&self) -> bool {
        self.tcp().is_some() && self.http.is_some()
    }
}
