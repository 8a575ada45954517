use crate::error::{NidsError, Result};
use crate::packet::EthernetHeader;

const ETHERNET_HEADER_LEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;

/// Ethernet frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    Arp,
    Vlan,
    QinQ,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x86DD => EtherType::Ipv6,
            0x0806 => EtherType::Arp,
            0x8100 => EtherType::Vlan,
            0x88A8 => EtherType::QinQ,
            other => EtherType::Unknown(other),
        }
    }
}

/// Decode an Ethernet II header, stepping over any 802.1Q / 802.1ad tags.
///
/// The returned header carries the EtherType of the encapsulated payload.
pub fn decode_ethernet(data: &[u8]) -> Result<(EthernetHeader, &[u8])> {
    if data.len() < ETHERNET_HEADER_LEN {
        return Err(NidsError::Decode(
            "Packet too short for Ethernet header".to_string(),
        ));
    }

    let mut dst_mac = [0u8; 6];
    let mut src_mac = [0u8; 6];
    dst_mac.copy_from_slice(&data[0..6]);
    src_mac.copy_from_slice(&data[6..12]);

    let mut ethertype = u16::from_be_bytes([data[12], data[13]]);
    let mut offset = ETHERNET_HEADER_LEN;

    while matches!(EtherType::from(ethertype), EtherType::Vlan | EtherType::QinQ) {
        if data.len() < offset + VLAN_TAG_LEN {
            return Err(NidsError::Decode("Truncated VLAN tag".to_string()));
        }
        ethertype = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
        offset += VLAN_TAG_LEN;
    }

    let header = EthernetHeader {
        dst_mac,
        src_mac,
        ethertype,
    };

    Ok((header, &data[offset..]))
}

/// Format MAC address as string
pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
