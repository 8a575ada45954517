use crate::error::{NidsError, Result};
use crate::packet::{TcpFlags, TcpSegment};

const TCP_MIN_HEADER_LEN: usize = 20;

/// Decode TCP segment
pub fn decode_tcp(data: &[u8]) -> Result<TcpSegment> {
    if data.len() < TCP_MIN_HEADER_LEN {
        return Err(NidsError::Decode(
            "Packet too short for TCP header".to_string(),
        ));
    }

    let src_port = u16::from_be_bytes([data[0], data[1]]);
    let dst_port = u16::from_be_bytes([data[2], data[3]]);
    let seq = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    let ack = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

    // Data offset is in the high 4 bits of byte 12, in 32-bit words
    let data_offset = ((data[12] >> 4) as usize) * 4;

    if data_offset < TCP_MIN_HEADER_LEN {
        return Err(NidsError::Decode(format!(
            "Invalid TCP data offset: {}",
            data_offset
        )));
    }
    if data.len() < data_offset {
        return Err(NidsError::Decode(
            "Packet too short for TCP data offset".to_string(),
        ));
    }

    let flags = TcpFlags::from_byte(data[13]);
    let window = u16::from_be_bytes([data[14], data[15]]);

    Ok(TcpSegment {
        src_port,
        dst_port,
        seq,
        ack,
        flags,
        window,
        payload: data[data_offset..].to_vec(),
    })
}
