use crate::error::{NidsError, Result};
use crate::packet::UdpDatagram;

const UDP_HEADER_LEN: usize = 8;

/// Decode UDP datagram
pub fn decode_udp(data: &[u8]) -> Result<UdpDatagram> {
    if data.len() < UDP_HEADER_LEN {
        return Err(NidsError::Decode(
            "Packet too short for UDP header".to_string(),
        ));
    }

    let src_port = u16::from_be_bytes([data[0], data[1]]);
    let dst_port = u16::from_be_bytes([data[2], data[3]]);
    let length = u16::from_be_bytes([data[4], data[5]]);
    // Checksum is at bytes 6-7 but we don't validate it

    // Trust the length field only when it fits what was captured
    let end = match length as usize {
        len if len >= UDP_HEADER_LEN && len <= data.len() => len,
        _ => data.len(),
    };

    Ok(UdpDatagram {
        src_port,
        dst_port,
        length,
        payload: data[UDP_HEADER_LEN..end].to_vec(),
    })
}
