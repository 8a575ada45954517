// Protocol decoders: raw frame -> DecodedPacket
pub mod decoder;
pub mod ethernet;
pub mod http;
pub mod ip;
pub mod tcp;
pub mod udp;

pub use decoder::PacketDecoder;
