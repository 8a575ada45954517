// Packet builders for unit tests
use super::*;
use chrono::Utc;

pub(crate) fn bare_packet() -> DecodedPacket {
    DecodedPacket::new(RawPacket::new(Utc::now(), Vec::new()))
}

pub(crate) fn ipv4(src: &str, dst: &str, protocol: u8) -> IpLayer {
    IpLayer::V4(Ipv4Header {
        src_addr: src.parse().unwrap(),
        dst_addr: dst.parse().unwrap(),
        protocol,
        tos: 0,
        ihl: 5,
        fragment_offset: 0,
        ttl: 64,
        total_length: 0,
    })
}

pub(crate) fn tcp_segment(src_port: u16, dst_port: u16, payload: &[u8]) -> TcpSegment {
    TcpSegment {
        src_port,
        dst_port,
        seq: 1,
        ack: 0,
        flags: TcpFlags::from_byte(0x18), // PSH + ACK
        window: 8192,
        payload: payload.to_vec(),
    }
}

pub(crate) fn tcp_packet(
    src: &str,
    dst: &str,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> DecodedPacket {
    let mut packet = bare_packet();
    packet.ip = Some(ipv4(src, dst, 6));
    packet.transport = Some(TransportLayer::Tcp(tcp_segment(src_port, dst_port, payload)));
    packet
}

pub(crate) fn udp_packet(
    src: &str,
    dst: &str,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> DecodedPacket {
    let mut packet = bare_packet();
    packet.ip = Some(ipv4(src, dst, 17));
    packet.transport = Some(TransportLayer::Udp(UdpDatagram {
        src_port,
        dst_port,
        length: (8 + payload.len()) as u16,
        payload: payload.to_vec(),
    }));
    packet
}

/// TCP packet to port 80 flagged as an HTTP request, method taken from the payload
pub(crate) fn http_packet(src: &str, dst: &str, payload: &[u8]) -> DecodedPacket {
    let mut packet = tcp_packet(src, dst, 40000, 80, payload);
    let method = payload
        .split(|b| *b == b' ')
        .next()
        .map(|m| String::from_utf8_lossy(m).into_owned())
        .unwrap_or_default();
    packet.http = Some(HttpRequest {
        method,
        uri: None,
        version: None,
    });
    packet
}

pub(crate) fn ipv6_tcp_packet(src: &str, dst: &str, src_port: u16, dst_port: u16) -> DecodedPacket {
    let mut packet = bare_packet();
    packet.ip = Some(IpLayer::V6(Ipv6Header {
        src_addr: src.parse().unwrap(),
        dst_addr: dst.parse().unwrap(),
        next_header: 6,
        traffic_class: 0,
        hop_limit: 64,
        payload_length: 20,
    }));
    packet.transport = Some(TransportLayer::Tcp(tcp_segment(src_port, dst_port, b"")));
    packet
}

/// Ethernet II + IPv4 + TCP frame as it would come off the wire
pub(crate) fn ethernet_ipv4_tcp_frame(
    src: [u8; 4],
    dst: [u8; 4],
    src_port: u16,
    dst_port: u16,
    flags: u8,
    payload: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::new();

    frame.extend_from_slice(&[
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // Dst MAC
        0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // Src MAC
        0x08, 0x00, // EtherType IPv4
    ]);

    let total_length = (20 + 20 + payload.len()) as u16;
    frame.extend_from_slice(&[0x45, 0x00]); // Version=4, IHL=5, TOS=0
    frame.extend_from_slice(&total_length.to_be_bytes());
    frame.extend_from_slice(&[0x1c, 0x46, 0x40, 0x00]); // ID, DF, offset 0
    frame.extend_from_slice(&[0x40, 0x06, 0x00, 0x00]); // TTL=64, TCP, checksum
    frame.extend_from_slice(&src);
    frame.extend_from_slice(&dst);

    frame.extend_from_slice(&src_port.to_be_bytes());
    frame.extend_from_slice(&dst_port.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x00, 0x03, 0xe8]); // Seq = 1000
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // Ack = 0
    frame.extend_from_slice(&[0x50, flags]); // Data offset=5
    frame.extend_from_slice(&[0x20, 0x00, 0x00, 0x00, 0x00, 0x00]); // Window, checksum, urgent

    frame.extend_from_slice(payload);
    frame
}
